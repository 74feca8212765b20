//! 颜色标签与 LAB 阈值

use crate::error::VisionError;
use crate::frame::Rgb;
use palette::white_point::D65;
use palette::{FromColor, Srgb};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 识别结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorLabel {
    Red,
    Green,
    Blue,
}

impl ColorLabel {
    /// 阈值匹配顺序；像素数相同时靠前者胜出
    pub const ALL: [ColorLabel; 3] = [ColorLabel::Red, ColorLabel::Green, ColorLabel::Blue];

    /// 报告行文本
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorLabel::Red => "Red",
            ColorLabel::Green => "Green",
            ColorLabel::Blue => "Blue",
        }
    }

    /// 解析接收到的报告：去掉所有空白后精确匹配，其他内容视为无识别结果
    pub fn parse_report(text: &str) -> Option<ColorLabel> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        compact.parse().ok()
    }
}

impl fmt::Display for ColorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorLabel {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| VisionError::InvalidLabel(s.to_string()))
    }
}

/// CIE L*a*b* 颜色（D65 白点）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f32,
    pub a: f32,
    pub b: f32,
}

impl Lab {
    pub fn from_rgb(rgb: Rgb) -> Self {
        let srgb: Srgb<f32> = Srgb::new(rgb.r, rgb.g, rgb.b).into_format();
        let lab = palette::Lab::<D65, f32>::from_color(srgb);
        Self {
            l: lab.l,
            a: lab.a,
            b: lab.b,
        }
    }
}

/// LAB 阈值 `(l_min, l_max, a_min, a_max, b_min, b_max)`，闭区间
///
/// 配置文件中写成六元数组：`red = [0, 100, 25, 127, -128, 127]`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i16; 6]", into = "[i16; 6]")]
pub struct LabThreshold {
    pub l_min: i16,
    pub l_max: i16,
    pub a_min: i16,
    pub a_max: i16,
    pub b_min: i16,
    pub b_max: i16,
}

impl LabThreshold {
    pub const fn new(l_min: i16, l_max: i16, a_min: i16, a_max: i16, b_min: i16, b_max: i16) -> Self {
        Self {
            l_min,
            l_max,
            a_min,
            a_max,
            b_min,
            b_max,
        }
    }

    /// 分量取整后比较
    pub fn contains(&self, lab: Lab) -> bool {
        let l = lab.l.round() as i16;
        let a = lab.a.round() as i16;
        let b = lab.b.round() as i16;
        (self.l_min..=self.l_max).contains(&l)
            && (self.a_min..=self.a_max).contains(&a)
            && (self.b_min..=self.b_max).contains(&b)
    }
}

impl From<[i16; 6]> for LabThreshold {
    fn from(v: [i16; 6]) -> Self {
        Self::new(v[0], v[1], v[2], v[3], v[4], v[5])
    }
}

impl From<LabThreshold> for [i16; 6] {
    fn from(t: LabThreshold) -> Self {
        [t.l_min, t.l_max, t.a_min, t.a_max, t.b_min, t.b_max]
    }
}

/// 三种颜色的阈值（默认值在补光灯最大亮度下标定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorThresholds {
    pub red: LabThreshold,
    pub green: LabThreshold,
    pub blue: LabThreshold,
}

impl Default for ColorThresholds {
    fn default() -> Self {
        Self {
            red: LabThreshold::new(0, 100, 25, 127, -128, 127),
            green: LabThreshold::new(0, 100, -128, -26, -3, 127),
            blue: LabThreshold::new(1, 100, -128, 127, -128, -20),
        }
    }
}

impl ColorThresholds {
    pub fn get(&self, label: ColorLabel) -> LabThreshold {
        match label {
            ColorLabel::Red => self.red,
            ColorLabel::Green => self.green,
            ColorLabel::Blue => self.blue,
        }
    }
}
