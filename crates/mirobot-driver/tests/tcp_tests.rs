//! 经 TCP 转发器控制机械臂的集成测试
//!
//! 本地 `TcpListener` 扮演 ser2net：每收到一条命令回复一次 `ok`。

use mirobot_driver::{AckConfig, ArmControllerBuilder, Axis, ControllerState, DriverError, TcpConfig};
use mirobot_protocol::{CodecConfig, Terminator};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

fn fast_ack() -> AckConfig {
    AckConfig {
        read_timeout_ms: 10,
        max_polls: 200,
        command_timeout_ms: 2_000,
        poll_interval_ms: 1,
        ..Default::default()
    }
}

/// 启动一个逐条确认的转发器，连接关闭后返回收到的全部字节
fn spawn_bridge() -> (TcpConfig, thread::JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut received = Vec::new();
        let mut buf = [0u8; 256];
        loop {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    received.extend_from_slice(&buf[..n]);
                    if stream.write_all(b"ok\r\n").is_err() {
                        break;
                    }
                },
            }
        }
        received
    });
    (TcpConfig::new("127.0.0.1", port), handle)
}

#[test]
fn test_commands_over_tcp_bridge() {
    let (tcp, bridge) = spawn_bridge();
    let mut arm = ArmControllerBuilder::new()
        .ack_config(fast_ack())
        .codec_config(CodecConfig {
            terminator: Terminator::SpaceNewline,
            ..Default::default()
        })
        .build_tcp(&tcp)
        .unwrap();

    arm.suction_on().unwrap();
    arm.move_axis_relative(Axis::X, 17.0).unwrap();
    assert_eq!(arm.state(), ControllerState::Idle);
    drop(arm);

    let received = String::from_utf8(bridge.join().unwrap()).unwrap();
    assert_eq!(received, "M3S1000M4E65 \nM20 G91 X17 \n");
}

#[test]
fn test_unreachable_bridge_is_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    match ArmControllerBuilder::new().build_tcp(&TcpConfig::new("127.0.0.1", port)) {
        Err(err) => {
            assert!(matches!(err, DriverError::Connection(_)));
            assert!(err.is_fatal());
        },
        Ok(_) => panic!("Connecting to a closed port must fail"),
    }
}
