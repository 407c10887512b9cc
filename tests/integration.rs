use std::io::{Read, Write};
use std::net::TcpStream;
use std::thread;
use std::time::Duration;

use motion_core::command::Command;
use motion_core::engine::Engine;
use motion_core::safety::{ControlMode, FaultKind};
use motion_core::telemetry::{run_csv_sink, TelemetryRing};
use motion_core::transport::{run_server, REQUEST_WIRE_SIZE, RESPONSE_WIRE_SIZE};

fn encode_request(cmd: i32, axis: i32, param: [f64; 5]) -> Vec<u8> {
    let mut buf = vec![0u8; REQUEST_WIRE_SIZE];
    buf[0..4].copy_from_slice(&cmd.to_le_bytes());
    buf[4..8].copy_from_slice(&axis.to_le_bytes());
    for (i, v) in param.iter().enumerate() {
        let offset = 16 + i * 8;
        buf[offset..offset + 8].copy_from_slice(&v.to_le_bytes());
    }
    buf
}

/// Scenario: an accel-phase position error beyond the threshold trips the
/// axis from closed to open loop and zeroes its force, independent of the
/// other axes' phase. The default move's gain is high enough that the trip
/// fires within the first handful of steps while still in the accel window.
#[test]
fn safety_trip_during_accel_phase_opens_the_axis() {
    let mut engine = Engine::new(2);

    let mut tripped = false;
    for _ in 0..5 {
        let record = engine.execute_control_step(0b01).unwrap().unwrap();
        let (axis, snapshot) = record.axes[0];
        assert_eq!(axis, 0);
        if snapshot.mode_is_open {
            assert_eq!(snapshot.force, 0.0);
            tripped = true;
            break;
        }
    }

    assert!(tripped, "expected the accel-phase error threshold to trip within a few steps");
    assert_eq!(engine.safety[0].mode, ControlMode::Open);
    assert!(engine.faults[0].raw_fault[FaultKind::NonCriticalPosErr as usize]);
    assert!(engine.faults[0].axis_fault);
}

/// Scenario: an emergency stop opens every axis, zeroes force, raises the
/// hardware e-stop fault on every axis, and clears the run flag.
#[test]
fn emergency_stop_opens_all_axes_and_halts_the_engine() {
    let mut engine = Engine::new(2);
    engine.execute_control_step(0b11).unwrap();
    engine.emergency_stop();

    assert!(!engine.running);
    for axis in 0..2 {
        assert_eq!(engine.safety[axis].mode, ControlMode::Open);
        assert_eq!(engine.axes[axis].snapshot.force, 0.0);
        assert!(engine.faults[axis].raw_fault[FaultKind::HardwareEmergencyStop as usize]);
    }
    assert!(engine.execute_control_step(0b11).unwrap().is_none());
}

#[test]
fn csv_sink_flushes_pushed_records_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let ring = TelemetryRing::new();

    let mut engine = Engine::new(1);
    for _ in 0..3 {
        if let Some(record) = engine.execute_control_step(0b1).unwrap() {
            ring.push(record);
        }
    }
    ring.shutdown();

    run_csv_sink(ring, path.to_str().unwrap()).unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 4); // header + 3 rows
}

#[test]
fn transport_round_trip_executes_commands_over_loopback() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let (tx, rx) = crossbeam_channel::unbounded();
    thread::spawn(move || {
        let _ = run_server(port, tx);
    });
    thread::sleep(Duration::from_millis(50));

    let control = thread::spawn(move || {
        let mut engine = Engine::new(2);
        let axis_count = engine.axis_count();
        for _ in 0..2 {
            if let Ok((req, reply_tx)) = rx.recv_timeout(Duration::from_secs(2)) {
                let close = req.cmd == 999;
                if let Some(cmd) = Command::decode(req, axis_count) {
                    let _ = motion_core::command::dispatch(&mut engine, cmd, |_| {});
                }
                let _ = reply_tx.send((close, None));
                if close {
                    break;
                }
            }
        }
    });

    let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();

    stream.write_all(&encode_request(1, 1, [0.0; 5])).unwrap();
    let mut receipt = [0u8; RESPONSE_WIRE_SIZE];
    stream.read_exact(&mut receipt).unwrap();
    let mut completion = [0u8; RESPONSE_WIRE_SIZE];
    stream.read_exact(&mut completion).unwrap();
    assert_eq!(i32::from_le_bytes(completion[0..4].try_into().unwrap()), 1);

    stream.write_all(&encode_request(999, 0, [0.0; 5])).unwrap();
    stream.read_exact(&mut receipt).unwrap();
    stream.read_exact(&mut completion).unwrap();

    control.join().unwrap();
}
