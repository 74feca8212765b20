//! 命令定义和实现

pub mod config;
pub mod motion;
pub mod run;
pub mod sequence;
pub mod vision;

pub use config::ConfigCommand;
pub use motion::{JogCommand, LinearCommand, MoveToCommand, SuctionAction};
pub use run::RunCommand;
pub use sequence::SequenceCommand;
pub use vision::{ClassifyCommand, ReceiveCommand};
