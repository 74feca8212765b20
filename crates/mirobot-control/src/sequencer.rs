//! 顺序执行器
//!
//! 逐步执行序列；任一步失败立即中止剩余步骤。不重试运动命令：完成状态未知的
//! 运动被重试可能导致重复动作。

use crate::error::SequenceError;
use crate::sequence::{Sequence, Step};
use mirobot_driver::{ArmController, CancelToken, DriverError, Transport};
use mirobot_protocol::{Axis, Pose};
use std::time::{Duration, Instant};
use tracing::{error, info};

/// 执行器所需的机械臂操作
///
/// 由 `ArmController` 实现；测试中可以替换为记录调用的假实现。
pub trait ArmOps {
    fn home(&mut self) -> Result<(), DriverError>;
    fn move_to(&mut self, pose: &Pose) -> Result<(), DriverError>;
    fn move_axis_relative(&mut self, axis: Axis, delta: f64) -> Result<(), DriverError>;
    fn slider_move_to(&mut self, position: f64) -> Result<(), DriverError>;
    fn belt_move(&mut self, distance: f64, feed_rate: u32) -> Result<(), DriverError>;
    fn suction_on(&mut self) -> Result<(), DriverError>;
    fn suction_blow(&mut self) -> Result<(), DriverError>;
    fn suction_off(&mut self) -> Result<(), DriverError>;

    /// 最近一条被确认的命令文本
    fn last_acknowledged(&self) -> Option<String>;
}

impl<T: Transport> ArmOps for ArmController<T> {
    fn home(&mut self) -> Result<(), DriverError> {
        ArmController::home(self)
    }

    fn move_to(&mut self, pose: &Pose) -> Result<(), DriverError> {
        ArmController::move_to(self, pose)
    }

    fn move_axis_relative(&mut self, axis: Axis, delta: f64) -> Result<(), DriverError> {
        ArmController::move_axis_relative(self, axis, delta)
    }

    fn slider_move_to(&mut self, position: f64) -> Result<(), DriverError> {
        ArmController::slider_move_to(self, position)
    }

    fn belt_move(&mut self, distance: f64, feed_rate: u32) -> Result<(), DriverError> {
        ArmController::belt_move(self, distance, feed_rate)
    }

    fn suction_on(&mut self) -> Result<(), DriverError> {
        ArmController::suction_on(self)
    }

    fn suction_blow(&mut self) -> Result<(), DriverError> {
        ArmController::suction_blow(self)
    }

    fn suction_off(&mut self) -> Result<(), DriverError> {
        ArmController::suction_off(self)
    }

    fn last_acknowledged(&self) -> Option<String> {
        ArmController::last_acknowledged(self).map(|command| command.to_string())
    }
}

/// 序列执行结果
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceReport {
    pub sequence: String,
    pub steps_completed: usize,
    pub duration: Duration,
}

/// 顺序执行器
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    cancel: Option<CancelToken>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每一步开始前检查取消令牌（通常与控制器共享同一个令牌）
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// 执行整个序列
    ///
    /// # Errors
    /// 返回第一个失败步骤的 `SequenceError`，其余步骤不会执行。
    pub fn run<A: ArmOps + ?Sized>(
        &self,
        arm: &mut A,
        sequence: &Sequence,
    ) -> Result<SequenceReport, SequenceError> {
        let started = Instant::now();
        let total = sequence.len();
        info!("Running sequence {:?} ({} steps)", sequence.name, total);

        for (index, step) in sequence.steps.iter().enumerate() {
            info!("Step {}/{}: {}", index + 1, total, step);

            let result = match &self.cancel {
                Some(cancel) if cancel.is_cancelled() => Err(DriverError::Cancelled {
                    command: step.to_string(),
                }),
                _ => self.execute_step(arm, step),
            };

            if let Err(source) = result {
                let err = SequenceError {
                    sequence: sequence.name.clone(),
                    step_index: index,
                    step: step.clone(),
                    last_acknowledged: arm.last_acknowledged(),
                    source,
                };
                error!("{}", err);
                return Err(err);
            }
        }

        let report = SequenceReport {
            sequence: sequence.name.clone(),
            steps_completed: total,
            duration: started.elapsed(),
        };
        info!(
            "Sequence {:?} finished in {:.2}s",
            report.sequence,
            report.duration.as_secs_f64()
        );
        Ok(report)
    }

    fn execute_step<A: ArmOps + ?Sized>(&self, arm: &mut A, step: &Step) -> Result<(), DriverError> {
        match step {
            Step::Home => arm.home(),
            Step::MoveTo { pose } => arm.move_to(pose),
            Step::MoveRelative { axis, delta } => arm.move_axis_relative(*axis, *delta),
            Step::SliderMoveTo { position } => arm.slider_move_to(*position),
            Step::BeltMove {
                distance,
                feed_rate,
            } => arm.belt_move(*distance, *feed_rate),
            Step::SuctionOn => arm.suction_on(),
            Step::SuctionBlow => arm.suction_blow(),
            Step::SuctionOff => arm.suction_off(),
            Step::Wait { duration_ms } => {
                spin_sleep::sleep(Duration::from_millis(*duration_ms));
                Ok(())
            },
        }
    }
}
