//! 序列定义
//!
//! 序列是有序的步骤列表，可以从 TOML 或 JSON 文件加载：
//!
//! ```toml
//! name = "pick_and_place"
//! description = "Move one block between slider stations"
//!
//! [[steps]]
//! type = "home"
//!
//! [[steps]]
//! type = "slider_move_to"
//! position = 180.0
//!
//! [[steps]]
//! type = "move_relative"
//! axis = "X"
//! delta = 17.0
//! ```

use crate::error::ConfigError;
use mirobot_protocol::{Axis, DEFAULT_FEED_RATE, Pose};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// 单个步骤
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// 两阶段回零
    Home,

    /// 绝对位姿移动
    MoveTo { pose: Pose },

    /// 单轴相对移动
    MoveRelative { axis: Axis, delta: f64 },

    /// 滑轨绝对移动
    SliderMoveTo { position: f64 },

    /// 传送带相对移动
    BeltMove {
        distance: f64,
        #[serde(default = "default_feed_rate")]
        feed_rate: u32,
    },

    SuctionOn,
    SuctionBlow,
    SuctionOff,

    /// 等待（不与控制器通信）
    Wait { duration_ms: u64 },
}

fn default_feed_rate() -> u32 {
    DEFAULT_FEED_RATE
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Home => write!(f, "home"),
            Step::MoveTo { pose } => write!(
                f,
                "move_to X{} Y{} Z{} A{} B{} C{}",
                pose.x, pose.y, pose.z, pose.a, pose.b, pose.c
            ),
            Step::MoveRelative { axis, delta } => write!(f, "move_relative {}{}", axis, delta),
            Step::SliderMoveTo { position } => write!(f, "slider_move_to {}", position),
            Step::BeltMove {
                distance,
                feed_rate,
            } => write!(f, "belt_move {} F{}", distance, feed_rate),
            Step::SuctionOn => write!(f, "suction_on"),
            Step::SuctionBlow => write!(f, "suction_blow"),
            Step::SuctionOff => write!(f, "suction_off"),
            Step::Wait { duration_ms } => write!(f, "wait {}ms", duration_ms),
        }
    }
}

/// 步骤序列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub steps: Vec<Step>,
}

impl Sequence {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            steps,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 内置取放演示：从滑轨 180 处取块，放到滑轨 218 处
    pub fn pick_and_place_demo() -> Self {
        use Step::*;

        let mut sequence = Self::new(
            "pick_and_place",
            vec![
                Home,
                // 取料前的待命位姿
                MoveTo {
                    pose: Pose::new(260.0, 0.0, 55.0, 0.0, -95.0, 0.0),
                },
                // 取料
                SliderMoveTo { position: 180.0 },
                MoveRelative {
                    axis: Axis::X,
                    delta: 17.0,
                },
                SuctionOn,
                MoveRelative {
                    axis: Axis::Z,
                    delta: 10.0,
                },
                MoveRelative {
                    axis: Axis::X,
                    delta: -50.0,
                },
                // 放料
                SliderMoveTo { position: 218.0 },
                MoveRelative {
                    axis: Axis::X,
                    delta: 50.0,
                },
                MoveRelative {
                    axis: Axis::Z,
                    delta: -10.0,
                },
                SuctionBlow,
                SuctionOff,
                MoveRelative {
                    axis: Axis::Z,
                    delta: 10.0,
                },
                MoveRelative {
                    axis: Axis::X,
                    delta: -50.0,
                },
            ],
        );
        sequence.description = "Pick a block at slider station 180 and place it at 218".to_string();
        sequence
    }

    /// 从文件加载（按扩展名选择 `.toml` / `.json`）
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        match extension(path).as_str() {
            "toml" => Self::from_toml_str(&content),
            "json" => Ok(serde_json::from_str(&content)?),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// 保存到文件（按扩展名选择格式）
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = match extension(path).as_str() {
            "toml" => toml::to_string_pretty(self)?,
            "json" => serde_json::to_string_pretty(self)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_sequence_shape() {
        let demo = Sequence::pick_and_place_demo();
        assert_eq!(demo.len(), 14);
        assert_eq!(demo.steps[0], Step::Home);
        assert_eq!(demo.steps[2], Step::SliderMoveTo { position: 180.0 });
        assert_eq!(demo.steps[4], Step::SuctionOn);
        assert_eq!(demo.steps[10], Step::SuctionBlow);
        assert_eq!(demo.steps[11], Step::SuctionOff);
    }

    #[test]
    fn test_step_display() {
        let step = Step::MoveRelative {
            axis: Axis::X,
            delta: -50.0,
        };
        assert_eq!(step.to_string(), "move_relative X-50");
        assert_eq!(Step::Wait { duration_ms: 250 }.to_string(), "wait 250ms");
    }

    #[test]
    fn test_sequence_from_toml() {
        let toml = r#"
            name = "short"

            [[steps]]
            type = "home"

            [[steps]]
            type = "move_to"
            pose = { x = 229.69, y = 60.53, z = 97.96, a = 0.0, b = 0.0, c = 0.0 }

            [[steps]]
            type = "move_relative"
            axis = "Z"
            delta = -15.135

            [[steps]]
            type = "belt_move"
            distance = 40.0
        "#;

        let sequence = Sequence::from_toml_str(toml).unwrap();
        assert_eq!(sequence.name, "short");
        assert!(sequence.description.is_empty());
        assert_eq!(sequence.len(), 4);
        assert_eq!(
            sequence.steps[2],
            Step::MoveRelative {
                axis: Axis::Z,
                delta: -15.135
            }
        );
        assert_eq!(
            sequence.steps[3],
            Step::BeltMove {
                distance: 40.0,
                feed_rate: 2000
            }
        );
    }

    #[test]
    fn test_sequence_rejects_unknown_axis() {
        let toml = r#"
            name = "bad"
            [[steps]]
            type = "move_relative"
            axis = "Q"
            delta = 1.0
        "#;
        assert!(matches!(
            Sequence::from_toml_str(toml),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_save_and_load_json_and_toml() {
        let dir = tempfile::tempdir().unwrap();
        let demo = Sequence::pick_and_place_demo();

        for name in ["demo.toml", "demo.json"] {
            let path = dir.path().join(name);
            demo.save(&path).unwrap();
            assert_eq!(Sequence::load(&path).unwrap(), demo);
        }
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.toml");
        assert!(matches!(Sequence::load(&missing), Err(ConfigError::Read { .. })));

        let yaml = dir.path().join("demo.yaml");
        std::fs::write(&yaml, "name: demo").unwrap();
        assert!(matches!(
            Sequence::load(&yaml),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == "yaml"
        ));
    }
}
