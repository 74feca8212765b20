//! 轴与位姿类型
//!
//! 所有坐标都以控制器单位原样传递（mm / 度），不做任何单位换算。

use crate::ProtocolError;
use std::fmt;
use std::str::FromStr;

/// 轴标识
///
/// - `X/Y/Z`：笛卡尔平移轴
/// - `A/B/C`：末端姿态旋转轴
/// - `D`：滑轨 / 传送带扩展轴
///
/// 只接受已定义的轴符号；自由文本在边界处（`FromStr` / 反序列化）被拒绝，
/// 不会进入协议层。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    X,
    Y,
    Z,
    A,
    B,
    C,
    D,
}

impl Axis {
    /// 全部轴（协议顺序）
    pub const ALL: [Axis; 7] = [Axis::X, Axis::Y, Axis::Z, Axis::A, Axis::B, Axis::C, Axis::D];

    /// 协议中的轴字母
    pub fn symbol(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
            Axis::A => 'A',
            Axis::B => 'B',
            Axis::C => 'C',
            Axis::D => 'D',
        }
    }

    /// 是否为旋转轴
    pub fn is_rotational(self) -> bool {
        matches!(self, Axis::A | Axis::B | Axis::C)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl TryFrom<char> for Axis {
    type Error = ProtocolError;

    fn try_from(symbol: char) -> Result<Self, Self::Error> {
        Axis::ALL.into_iter().find(|axis| axis.symbol() == symbol).ok_or_else(|| {
            ProtocolError::InvalidAxis {
                symbol: symbol.to_string(),
            }
        })
    }
}

impl FromStr for Axis {
    type Err = ProtocolError;

    /// 只接受单个大写轴字母（"X"、"Z" 等）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Axis::try_from(c),
            _ => Err(ProtocolError::InvalidAxis {
                symbol: s.to_string(),
            }),
        }
    }
}

/// 六维位姿（位置 + 姿态）
///
/// 坐标按 `x, y, z, a, b, c` 顺序渲染到命令中，数值原样输出。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, z: f64, a: f64, b: f64, c: f64) -> Self {
        Self { x, y, z, a, b, c }
    }

    /// 只给出位置，姿态使用吸盘朝下的默认值（A0 B-95 C0）
    pub fn from_position(x: f64, y: f64, z: f64) -> Self {
        Self::new(x, y, z, 0.0, -95.0, 0.0)
    }
}

impl From<[f64; 6]> for Pose {
    fn from(v: [f64; 6]) -> Self {
        Self::new(v[0], v[1], v[2], v[3], v[4], v[5])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_from_str() {
        assert_eq!("X".parse::<Axis>().unwrap(), Axis::X);
        assert_eq!("C".parse::<Axis>().unwrap(), Axis::C);
        assert_eq!("D".parse::<Axis>().unwrap(), Axis::D);
    }

    #[test]
    fn test_axis_rejects_free_text() {
        for bad in ["", "x", "XY", "Q", "17", " X"] {
            let err = bad.parse::<Axis>().unwrap_err();
            assert_eq!(
                err,
                ProtocolError::InvalidAxis {
                    symbol: bad.to_string()
                }
            );
        }
    }

    #[test]
    fn test_axis_try_from_char() {
        assert_eq!(Axis::try_from('Y').unwrap(), Axis::Y);
        assert!(Axis::try_from('W').is_err());
    }

    #[test]
    fn test_axis_display_and_rotational() {
        assert_eq!(Axis::Z.to_string(), "Z");
        assert!(Axis::B.is_rotational());
        assert!(!Axis::D.is_rotational());
    }

    #[test]
    fn test_pose_from_position() {
        let pose = Pose::from_position(260.0, 0.0, 55.0);
        assert_eq!(pose, Pose::new(260.0, 0.0, 55.0, 0.0, -95.0, 0.0));
        assert_eq!(Pose::from([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).c, 6.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_axis_serde_rejects_unknown() {
        let axis: Axis = serde_json::from_str("\"Z\"").unwrap();
        assert_eq!(axis, Axis::Z);
        assert!(serde_json::from_str::<Axis>("\"Q\"").is_err());
    }
}
