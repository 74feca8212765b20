//! 状态报告解析
//!
//! 控制器对 `?` 的回复格式：
//!
//! ```text
//! <Idle,Angle(ABCDXYZ):0.0,-0.1,0.2,0.0,0.0,60.0,0.0,Cartesian coordinate(XYZ RxRyRz):198.670,0.000,230.720,0.000,0.000,0.000,Pump PWM:0,Valve PWM:0,Motion_MODE:0>
//! ```
//!
//! 按空白、逗号、冒号切分后按位置取值：
//! `[0]` 状态，`[2..=8]` 关节角 A B C D X Y Z，`[12..=17]` 笛卡尔 X Y Z Rx Ry Rz。

use crate::ProtocolError;
use std::str::FromStr;

/// 控制器运行状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArmState {
    Home,
    Idle,
    Hold,
    Run,
    Alarm,
    /// 未识别的状态字符串
    Other(String),
}

impl ArmState {
    fn parse(s: &str) -> Self {
        match s {
            "Home" => ArmState::Home,
            "Idle" => ArmState::Idle,
            "Hold" => ArmState::Hold,
            "Run" => ArmState::Run,
            "Alarm" => ArmState::Alarm,
            other => ArmState::Other(other.to_string()),
        }
    }
}

/// 关节角（度），含滑轨 D 轴
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointAngles {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// 末端笛卡尔位姿
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CartesianPose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

/// 解析后的状态报告
#[derive(Debug, Clone, PartialEq)]
pub struct ArmStatus {
    pub state: ArmState,
    pub angle: JointAngles,
    pub cartesian: CartesianPose,
}

impl ArmStatus {
    /// 控制器是否空闲（可以接收下一条运动命令）
    pub fn is_idle(&self) -> bool {
        self.state == ArmState::Idle
    }

    /// 从任意输入文本中提取第一份完整的 `<...>` 报告
    ///
    /// 报告尚不完整时返回 `None`。
    pub fn extract(text: &str) -> Option<Result<Self, ProtocolError>> {
        let start = text.find('<')?;
        let len = text[start..].find('>')?;
        Some(text[start..=start + len].parse())
    }

    /// 提取最后一份完整的 `<...>` 报告（连续轮询时只关心最新状态）
    pub fn extract_latest(text: &str) -> Option<Result<Self, ProtocolError>> {
        let end = text.rfind('>')?;
        let start = text[..end].rfind('<')?;
        Some(text[start..=end].parse())
    }
}

impl FromStr for ArmStatus {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .trim()
            .strip_prefix('<')
            .and_then(|rest| rest.strip_suffix('>'))
            .ok_or_else(|| invalid("report must be enclosed in '<' and '>'"))?;

        let fields: Vec<&str> = body
            .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
            .filter(|field| !field.is_empty())
            .collect();

        if fields.len() < 18 {
            return Err(invalid(format!("expected at least 18 fields, got {}", fields.len())));
        }

        let num = |index: usize| -> Result<f64, ProtocolError> {
            fields[index]
                .parse::<f64>()
                .map_err(|_| invalid(format!("field {} is not a number: {:?}", index, fields[index])))
        };

        Ok(ArmStatus {
            state: ArmState::parse(fields[0]),
            angle: JointAngles {
                a: num(2)?,
                b: num(3)?,
                c: num(4)?,
                d: num(5)?,
                x: num(6)?,
                y: num(7)?,
                z: num(8)?,
            },
            cartesian: CartesianPose {
                x: num(12)?,
                y: num(13)?,
                z: num(14)?,
                rx: num(15)?,
                ry: num(16)?,
                rz: num(17)?,
            },
        })
    }
}

fn invalid(reason: impl Into<String>) -> ProtocolError {
    ProtocolError::InvalidStatus {
        reason: reason.into(),
    }
}
