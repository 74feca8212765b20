//! Arm Controller 模块
//!
//! 提供对外的 `ArmController`：一次只执行一条命令，发送后阻塞等待确认，
//! 确认到达（或失败）之后才返回。这就是命令顺序保证：请求 → 确认 → 请求。
//!
//! # 注意
//!
//! 每条命令都会让机械臂产生真实的物理动作。`Transport` / `Timeout` 失败后
//! 机械臂可能停在运动中途，调用方在确认物理状态之前不要盲目重试。

use crate::config::{AckConfig, Completion};
use crate::error::DriverError;
use crate::state::{CancelToken, ControllerState};
use mirobot_protocol::{AckAccumulator, ArmState, ArmStatus, Axis, CodecConfig, Command, LineCodec, Pose};
use mirobot_serial::{SerialError, Transport};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

/// 发送前排空输入时单次读取的超时
const DRAIN_READ_TIMEOUT: Duration = Duration::from_millis(1);
/// 排空输入的最大读取次数（对端持续输出时不无限等待）
const MAX_DRAIN_READS: usize = 64;

/// 一次读取之后的判定
enum Wait<R> {
    /// 继续等待
    Pending,
    /// 收到状态报告但尚未完成，不计入轮询次数
    Progress,
    Done(Result<R, DriverError>),
}

/// 机械臂控制器
///
/// 独占持有传输层连接；构造时打开，drop 时关闭。
pub struct ArmController<T: Transport> {
    transport: T,
    codec: LineCodec,
    ack: AckConfig,
    state: ControllerState,
    last_acknowledged: Option<Command>,
    reported_state: Option<ArmState>,
    cancel: CancelToken,
}

impl<T: Transport> ArmController<T> {
    /// 使用任意传输层创建控制器
    pub fn new(transport: T, codec: CodecConfig, ack: AckConfig) -> Self {
        Self {
            transport,
            codec: LineCodec::new(codec),
            ack,
            state: ControllerState::Idle,
            last_acknowledged: None,
            reported_state: None,
            cancel: CancelToken::new(),
        }
    }

    /// 使用外部取消令牌（例如与 Ctrl-C 处理函数共享）
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// 最近一条被确认的命令（用于失败后的人工恢复）
    pub fn last_acknowledged(&self) -> Option<&Command> {
        self.last_acknowledged.as_ref()
    }

    /// 最近一次状态报告中的机械臂状态（从未收到报告时为 `None`）
    pub fn reported_state(&self) -> Option<&ArmState> {
        self.reported_state.as_ref()
    }

    pub fn ack_config(&self) -> &AckConfig {
        &self.ack
    }

    /// 发送命令并阻塞等待完成
    ///
    /// 完成的判定由 `AckConfig::completion` 决定：确认 token，或轮询状态直到 `Idle`。
    ///
    /// # Errors
    /// - `DriverError::NotIdle`: 最近的状态报告不是 `Idle`，命令未发送
    /// - `DriverError::Transport`: 写入或读取失败
    /// - `DriverError::Timeout`: 在等待上限内没有完成
    /// - `DriverError::Cancelled`: 发送前或等待期间取消令牌被触发
    pub fn send_and_await(&mut self, command: &Command) -> Result<(), DriverError> {
        if let Some(state) = self.reported_state.as_ref().filter(|s| **s != ArmState::Idle) {
            warn!("Arm reported {:?}, refusing to send {:?}", state, command.as_str());
            return Err(DriverError::NotIdle {
                command: command.to_string(),
                state: state.clone(),
            });
        }

        match self.ack.completion {
            Completion::Ack => {
                self.execute(command, false, |acc| {
                    if acc.is_acknowledged() {
                        Wait::Done(Ok(()))
                    } else {
                        Wait::Pending
                    }
                })?;
            },
            Completion::IdleStatus => {
                self.await_idle(command)?;
            },
        }
        self.last_acknowledged = Some(command.clone());
        debug!("Finished {:?}, continuing", command.as_str());
        Ok(())
    }

    /// 两阶段回零：先滑轨（`$H7`），再其余各轴（`$H`）
    pub fn home(&mut self) -> Result<(), DriverError> {
        for command in Command::home() {
            self.send_and_await(&command)?;
        }
        Ok(())
    }

    pub fn move_to(&mut self, pose: &Pose) -> Result<(), DriverError> {
        self.send_and_await(&Command::move_to(pose))
    }

    pub fn move_axis_relative(&mut self, axis: Axis, delta: f64) -> Result<(), DriverError> {
        self.send_and_await(&Command::move_axis_relative(axis, delta))
    }

    pub fn slider_move_to(&mut self, position: f64) -> Result<(), DriverError> {
        self.send_and_await(&Command::slider_move_to(position))
    }

    pub fn slider_move_to_with_feed(&mut self, position: f64, feed_rate: u32) -> Result<(), DriverError> {
        self.send_and_await(&Command::slider_move_to_with_feed(position, feed_rate))
    }

    pub fn belt_move(&mut self, distance: f64, feed_rate: u32) -> Result<(), DriverError> {
        self.send_and_await(&Command::belt_move(distance, feed_rate))
    }

    pub fn suction_on(&mut self) -> Result<(), DriverError> {
        self.send_and_await(&Command::suction_on())
    }

    pub fn suction_blow(&mut self) -> Result<(), DriverError> {
        self.send_and_await(&Command::suction_blow())
    }

    pub fn suction_off(&mut self) -> Result<(), DriverError> {
        self.send_and_await(&Command::suction_off())
    }

    /// 立即停止（feed hold）
    ///
    /// 只写入，不等待确认：停止命令必须在其他命令阻塞时也能发出。
    pub fn stop(&mut self) -> Result<(), DriverError> {
        let command = Command::stop();
        warn!("Sending stop command");
        self.transport
            .write(&self.codec.encode(&command))
            .map_err(|source| self.transport_failure(&command, source))
    }

    /// 查询控制器状态报告
    pub fn query_status(&mut self) -> Result<ArmStatus, DriverError> {
        let status = self.execute(&Command::status_query(), false, |acc| {
            match ArmStatus::extract_latest(&acc.text()) {
                Some(parsed) => Wait::Done(parsed.map_err(DriverError::from)),
                None => Wait::Pending,
            }
        })?;
        debug!("Arm status: {:?}", status.state);
        self.reported_state = Some(status.state.clone());
        Ok(status)
    }

    /// 轮询状态直到机械臂报告 `Idle`
    ///
    /// 不受 `NotIdle` 限制，用于在上一条命令超时后重新同步。
    pub fn wait_for_idle(&mut self) -> Result<ArmStatus, DriverError> {
        self.await_idle(&Command::status_query())
    }

    /// 关闭连接（幂等）
    pub fn close(&mut self) {
        if self.transport.is_open() {
            info!("Closing arm connection");
        }
        self.transport.close();
    }

    /// 写入命令后每隔 `status_poll_interval` 发送 `?`，直到状态报告为 `Idle`
    fn await_idle(&mut self, command: &Command) -> Result<ArmStatus, DriverError> {
        let mut seen: Option<ArmState> = None;
        let result = self.execute(command, true, |acc| match ArmStatus::extract_latest(&acc.text()) {
            None => Wait::Pending,
            Some(Err(e)) => Wait::Done(Err(e.into())),
            Some(Ok(status)) => {
                seen = Some(status.state.clone());
                if status.is_idle() {
                    Wait::Done(Ok(status))
                } else {
                    trace!("Arm still {:?}", status.state);
                    acc.clear();
                    Wait::Progress
                }
            },
        });
        if seen.is_some() {
            self.reported_state = seen;
        }
        result
    }

    /// 丢弃上一条命令之后残留的输入（迟到的确认、未读完的状态报告）
    fn drain_stale_input(&mut self, command: &Command) -> Result<(), DriverError> {
        let mut stale = Vec::new();
        for _ in 0..MAX_DRAIN_READS {
            let chunk = match self.transport.read_available(DRAIN_READ_TIMEOUT) {
                Ok(chunk) => chunk,
                Err(source) => {
                    self.state = ControllerState::Faulted;
                    return Err(self.transport_failure(command, source));
                },
            };
            if chunk.is_empty() {
                break;
            }
            stale.extend_from_slice(&chunk);
        }
        if !stale.is_empty() {
            debug!(
                "Discarded stale input before {:?}: {:?}",
                command.as_str(),
                String::from_utf8_lossy(&stale)
            );
        }
        Ok(())
    }

    /// 写入命令，然后有界地轮询输入，直到 `done` 给出结果
    ///
    /// `poll_status` 为真时按 `status_poll_interval` 周期写入 `?`；此时
    /// `max_polls` 计的是没有得到状态报告的连续查询次数，否则计读取次数。
    fn execute<R>(
        &mut self,
        command: &Command,
        poll_status: bool,
        mut done: impl FnMut(&mut AckAccumulator) -> Wait<R>,
    ) -> Result<R, DriverError> {
        // 已取消时不开始新命令，也不写入任何字节
        if self.cancel.is_cancelled() {
            return Err(DriverError::Cancelled {
                command: command.to_string(),
            });
        }

        self.drain_stale_input(command)?;

        self.state = ControllerState::Sending;
        debug!("Command send: {}", command);
        if let Err(source) = self.transport.write(&self.codec.encode(command)) {
            self.state = ControllerState::Faulted;
            return Err(self.transport_failure(command, source));
        }

        self.state = ControllerState::AwaitingAck;
        let mut acc = self.codec.accumulator();
        let started = Instant::now();
        let command_timeout = self.ack.command_timeout();
        let status_query = poll_status.then(|| self.codec.encode(&Command::status_query()));
        let mut next_query = started + self.ack.status_poll_interval();
        let mut polls = 0u32;

        loop {
            if self.cancel.is_cancelled() {
                self.state = ControllerState::Faulted;
                warn!("Cancelled while awaiting acknowledgment of {:?}", command.as_str());
                return Err(DriverError::Cancelled {
                    command: command.to_string(),
                });
            }

            let elapsed = started.elapsed();
            let polls_exhausted = polls >= self.ack.max_polls;
            if (status_query.is_none() && polls_exhausted) || elapsed >= command_timeout {
                return Err(self.timed_out(command, polls, elapsed));
            }

            let mut read_timeout = self.ack.read_timeout().min(command_timeout - elapsed);
            if let Some(query) = &status_query {
                let now = Instant::now();
                if now >= next_query {
                    if polls_exhausted {
                        return Err(self.timed_out(command, polls, elapsed));
                    }
                    if let Err(source) = self.transport.write(query) {
                        self.state = ControllerState::Faulted;
                        return Err(self.transport_failure(command, source));
                    }
                    polls += 1;
                    next_query = now + self.ack.status_poll_interval();
                }
                read_timeout = read_timeout.min(next_query.saturating_duration_since(Instant::now()));
            }

            let chunk = match self.transport.read_available(read_timeout) {
                Ok(chunk) => chunk,
                Err(source) => {
                    self.state = ControllerState::Faulted;
                    return Err(self.transport_failure(command, source));
                },
            };

            if chunk.is_empty() {
                if status_query.is_none() {
                    polls += 1;
                }
                spin_sleep::sleep(self.ack.poll_interval());
                continue;
            }

            trace!("Received {:?}", String::from_utf8_lossy(&chunk));
            acc.push(&chunk);
            match done(&mut acc) {
                Wait::Pending => {
                    if status_query.is_none() {
                        polls += 1;
                    }
                },
                Wait::Progress => polls = 0,
                Wait::Done(result) => {
                    self.state = if result.is_ok() {
                        ControllerState::Idle
                    } else {
                        ControllerState::Faulted
                    };
                    return result;
                },
            }
        }
    }

    fn timed_out(&mut self, command: &Command, polls: u32, waited: Duration) -> DriverError {
        self.state = ControllerState::Faulted;
        warn!(
            "No completion for {:?} after {} polls ({:?})",
            command.as_str(),
            polls,
            waited
        );
        DriverError::Timeout {
            command: command.to_string(),
            waited,
        }
    }

    fn transport_failure(&self, command: &Command, source: SerialError) -> DriverError {
        if source.is_fatal() {
            error!("Fatal transport error during {:?}: {}", command.as_str(), source);
        } else {
            warn!("Transport error during {:?}: {}", command.as_str(), source);
        }
        DriverError::Transport {
            command: command.to_string(),
            source,
        }
    }
}

impl<T: Transport> Drop for ArmController<T> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirobot_serial::mock::{MockEvent, MockTransport};

    fn fast_ack() -> AckConfig {
        AckConfig {
            read_timeout_ms: 5,
            max_polls: 5,
            command_timeout_ms: 500,
            poll_interval_ms: 1,
            ..Default::default()
        }
    }

    fn controller(mock: MockTransport) -> ArmController<MockTransport> {
        ArmController::new(mock, CodecConfig::default(), fast_ack())
    }

    #[test]
    fn test_immediate_ack_returns_to_idle() {
        let mock = MockTransport::acking();
        let handle = mock.handle();
        let mut arm = controller(mock);
        assert_eq!(arm.state(), ControllerState::Idle);

        arm.suction_on().unwrap();

        assert_eq!(arm.state(), ControllerState::Idle);
        assert_eq!(arm.last_acknowledged(), Some(&Command::suction_on()));
        assert_eq!(handle.written_text(), vec!["M3S1000M4E65".to_string()]);
    }

    #[test]
    fn test_silent_transport_times_out() {
        let mut arm = controller(MockTransport::new());
        let started = Instant::now();

        let err = arm.move_axis_relative(Axis::X, 17.0).unwrap_err();

        assert!(matches!(err, DriverError::Timeout { ref command, .. } if command == "M20 G91 X17"));
        assert_eq!(arm.state(), ControllerState::Faulted);
        assert!(arm.last_acknowledged().is_none());
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }

    #[test]
    fn test_command_timeout_bounds_wait() {
        let mock = MockTransport::new().with_empty_read_delay(std::time::Duration::from_millis(20));
        let mut arm = ArmController::new(
            mock,
            CodecConfig::default(),
            AckConfig {
                read_timeout_ms: 20,
                max_polls: u32::MAX,
                command_timeout_ms: 100,
                poll_interval_ms: 1,
                ..Default::default()
            },
        );

        let started = Instant::now();
        let err = arm.suction_off().unwrap_err();
        assert!(matches!(err, DriverError::Timeout { .. }));
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }

    #[test]
    fn test_split_ack_is_accepted() {
        let mock = MockTransport::new().always_reply(vec![b"o".to_vec(), b"k done".to_vec()]);
        let mut arm = controller(mock);
        arm.slider_move_to(180.0).unwrap();
        assert_eq!(arm.state(), ControllerState::Idle);
    }

    #[test]
    fn test_write_failure_is_transport_error() {
        let mut arm = controller(MockTransport::new().fail_writes());
        let err = arm.suction_blow().unwrap_err();
        assert!(matches!(err, DriverError::Transport { .. }));
        assert!(!err.is_fatal());
        assert_eq!(arm.state(), ControllerState::Faulted);
    }

    #[test]
    fn test_read_failure_is_transport_error() {
        let mut arm = controller(MockTransport::new().fail_reads());
        let err = arm.home().unwrap_err();
        assert!(matches!(err, DriverError::Transport { ref command, .. } if command == "$H7"));
    }

    #[test]
    fn test_next_command_allowed_after_fault() {
        let mock = MockTransport::new().scripted(vec![vec![], vec![b"ok".to_vec()]]);
        let handle = mock.handle();
        let mut arm = controller(mock);

        assert!(arm.suction_on().is_err());
        assert_eq!(arm.state(), ControllerState::Faulted);

        arm.suction_off().unwrap();
        assert_eq!(arm.state(), ControllerState::Idle);
        assert_eq!(handle.written().len(), 2);
    }

    #[test]
    fn test_home_sends_two_stages_in_order() {
        let mock = MockTransport::acking();
        let handle = mock.handle();
        let mut arm = controller(mock);

        arm.home().unwrap();

        assert_eq!(
            handle.events(),
            vec![
                MockEvent::Write(b"$H7".to_vec()),
                MockEvent::Read(b"ok".to_vec()),
                MockEvent::Write(b"$H".to_vec()),
                MockEvent::Read(b"ok".to_vec()),
            ]
        );
        assert_eq!(arm.last_acknowledged(), Some(&Command::home_arm()));
    }

    #[test]
    fn test_cancel_before_send_writes_nothing() {
        let mock = MockTransport::acking();
        let handle = mock.handle();
        let mut arm = controller(mock);
        arm.cancel_token().cancel();

        let err = arm.suction_on().unwrap_err();
        assert!(matches!(err, DriverError::Cancelled { .. }));
        assert!(handle.written().is_empty());
        assert_eq!(arm.state(), ControllerState::Idle);
    }

    #[test]
    fn test_cancel_while_awaiting_faults() {
        let mock = MockTransport::new().with_empty_read_delay(std::time::Duration::from_millis(5));
        let handle = mock.handle();
        let token = CancelToken::new();
        let mut arm = ArmController::new(
            mock,
            CodecConfig::default(),
            AckConfig {
                read_timeout_ms: 5,
                max_polls: u32::MAX,
                command_timeout_ms: 10_000,
                poll_interval_ms: 1,
                ..Default::default()
            },
        )
        .with_cancel_token(token.clone());

        let canceller = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(30));
            token.cancel();
        });

        let err = arm.move_to(&Pose::from_position(260.0, 0.0, 55.0)).unwrap_err();
        canceller.join().unwrap();

        assert!(matches!(err, DriverError::Cancelled { .. }));
        assert_eq!(arm.state(), ControllerState::Faulted);
        assert_eq!(handle.written().len(), 1);
    }

    #[test]
    fn test_custom_ack_token_and_terminator() {
        let mock = MockTransport::new().always_reply(vec![b"ok? no. DONE".to_vec()]);
        let handle = mock.handle();
        let codec = CodecConfig {
            terminator: mirobot_protocol::Terminator::Newline,
            ack_token: mirobot_protocol::AckToken::new("DONE").unwrap(),
        };
        let mut arm = ArmController::new(mock, codec, fast_ack());

        arm.suction_blow().unwrap();
        assert_eq!(handle.written(), vec![b"M3S500\n".to_vec()]);
    }

    #[test]
    fn test_query_status() {
        let report = "<Idle,Angle(ABCDXYZ):0.0,0.0,0.0,12.0,0.0,0.0,0.0,Cartesian coordinate(XYZ RxRyRz):198.670,0.000,230.720,0.000,0.000,0.000,Pump PWM:0,Valve PWM:0,Motion_MODE:0>";
        let (first, second) = report.split_at(40);
        let mock = MockTransport::new().scripted(vec![vec![
            first.as_bytes().to_vec(),
            second.as_bytes().to_vec(),
        ]]);
        let mut arm = controller(mock);

        let status = arm.query_status().unwrap();
        assert!(status.is_idle());
        assert_eq!(status.angle.d, 12.0);
        assert_eq!(arm.state(), ControllerState::Idle);
        // 状态查询不是运动命令
        assert!(arm.last_acknowledged().is_none());
    }

    #[test]
    fn test_stop_does_not_wait() {
        let mock = MockTransport::new();
        let handle = mock.handle();
        let mut arm = controller(mock);

        arm.stop().unwrap();
        assert_eq!(handle.written_text(), vec!["!".to_string()]);
        assert_eq!(arm.state(), ControllerState::Idle);
    }

    fn report(state: &str) -> Vec<u8> {
        format!(
            "<{},Angle(ABCDXYZ):0.0,0.0,0.0,0.0,0.0,0.0,0.0,Cartesian coordinate(XYZ RxRyRz):198.670,0.000,230.720,0.000,0.000,0.000,Pump PWM:0,Valve PWM:0,Motion_MODE:0>\r\n",
            state
        )
        .into_bytes()
    }

    fn idle_status_ack() -> AckConfig {
        AckConfig {
            read_timeout_ms: 5,
            max_polls: 3,
            command_timeout_ms: 2_000,
            poll_interval_ms: 1,
            completion: Completion::IdleStatus,
            status_poll_interval_ms: 5,
        }
    }

    #[test]
    fn test_late_ack_after_timeout_does_not_acknowledge_next_command() {
        let mock = MockTransport::new();
        let feeder = mock.clone();
        let handle = mock.handle();
        let mut arm = controller(mock);

        let err = arm.slider_move_to(180.0).unwrap_err();
        assert!(matches!(err, DriverError::Timeout { .. }));

        // 超时命令的确认迟到了
        feeder.push_incoming("ok");

        let err = arm.suction_on().unwrap_err();
        assert!(matches!(err, DriverError::Timeout { ref command, .. } if command == "M3S1000M4E65"));
        assert_eq!(arm.state(), ControllerState::Faulted);
        assert!(arm.last_acknowledged().is_none());

        // 迟到的确认在写入下一条命令之前被读走丢弃
        assert_eq!(
            handle.events(),
            vec![
                MockEvent::Write(b"G90 G01 D180 F2000".to_vec()),
                MockEvent::Read(b"ok".to_vec()),
                MockEvent::Write(b"M3S1000M4E65".to_vec()),
            ]
        );
        assert_eq!(handle.pending_incoming(), 0);
    }

    #[test]
    fn test_idle_status_completion_polls_until_idle() {
        let mock = MockTransport::new().scripted(vec![
            vec![b"ok\r\n".to_vec()],
            vec![report("Run")],
            vec![report("Run")],
            vec![report("Run")],
            vec![report("Idle")],
        ]);
        let handle = mock.handle();
        let mut arm = ArmController::new(mock, CodecConfig::default(), idle_status_ack());

        arm.move_axis_relative(Axis::Z, 10.0).unwrap();

        // 三次 Run 报告不消耗无响应轮询次数（max_polls = 3）
        assert_eq!(handle.written_text(), vec!["M20 G91 Z10", "?", "?", "?", "?"]);
        assert_eq!(arm.state(), ControllerState::Idle);
        assert_eq!(arm.reported_state(), Some(&ArmState::Idle));
        assert_eq!(arm.last_acknowledged(), Some(&Command::move_axis_relative(Axis::Z, 10.0)));
    }

    #[test]
    fn test_idle_status_silent_controller_times_out() {
        let mock = MockTransport::new();
        let handle = mock.handle();
        let mut arm = ArmController::new(mock, CodecConfig::default(), idle_status_ack());

        let err = arm.suction_on().unwrap_err();

        assert!(matches!(err, DriverError::Timeout { .. }));
        assert_eq!(handle.written_text(), vec!["M3S1000M4E65", "?", "?", "?"]);
        assert_eq!(arm.state(), ControllerState::Faulted);
    }

    #[test]
    fn test_running_report_blocks_next_command_until_idle() {
        let mock = MockTransport::new().scripted(vec![
            vec![report("Run")],
            vec![report("Idle")],
            vec![b"ok".to_vec()],
        ]);
        let handle = mock.handle();
        let mut arm = controller(mock);

        let status = arm.query_status().unwrap();
        assert_eq!(status.state, ArmState::Run);

        let err = arm.suction_off().unwrap_err();
        assert!(matches!(err, DriverError::NotIdle { state: ArmState::Run, .. }));
        assert_eq!(handle.written_text(), vec!["?"]);

        assert!(arm.wait_for_idle().unwrap().is_idle());
        arm.suction_off().unwrap();
        assert_eq!(handle.written_text(), vec!["?", "?", "M3S0M4E45"]);
    }

    #[test]
    fn test_drop_closes_transport() {
        let mock = MockTransport::acking();
        let handle = mock.handle();
        let mut arm = controller(mock);
        arm.close();
        drop(arm);
        assert!(!handle.is_open());
        assert_eq!(handle.close_calls(), 2);
    }
}
