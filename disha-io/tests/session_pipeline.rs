//! End-to-end session tests over the in-memory transport
//!
//! Drives open → self test → calibrate → run with synthetic DSP-1750 frame
//! streams to verify:
//! - Corrupt frames never reach calibration or integration
//! - Outputs arrive on exactly every 50th integrated cycle
//! - Link failures close the session and release the port
//!
//! Run with: `cargo test --test session_pipeline`

use approx::assert_relative_eq;
use disha_io::config::Config;
use disha_io::devices::dsp1750::constants::{OFFSET_STATUS, STATUS_ACCEL_Y, STATUS_RESERVED_3};
use disha_io::devices::dsp1750::{MeasurementPayload, encode_built_in_test};
use disha_io::transport::MockTransport;
use disha_io::{ChannelSink, Error, Session, SessionState};
use std::sync::atomic::AtomicBool;

// ============================================================================
// Stream Builders
// ============================================================================

fn test_config(samples: usize) -> Config {
    let mut config = Config::default();
    config.calibration.samples = samples;
    config
}

fn valid_frame(gyro: [f32; 3], accel: [f32; 3], sequence: u8) -> Vec<u8> {
    MeasurementPayload {
        gyro,
        accel,
        sequence,
        temperature: 28,
        ..Default::default()
    }
    .encode()
    .as_bytes()
    .to_vec()
}

/// Frames that sync cleanly but fail validation, one per failure kind
fn corrupt_frame(kind: usize) -> Vec<u8> {
    // Values far from the valid stream so inclusion would skew the bias
    let outlier = [100.0f32, -100.0, 100.0];
    match kind % 3 {
        0 => {
            let mut bytes = valid_frame(outlier, outlier, 0);
            bytes[20] ^= 0x10; // CRC mismatch
            bytes
        }
        1 => {
            let mut bytes = valid_frame(outlier, outlier, 0);
            bytes[OFFSET_STATUS] |= STATUS_RESERVED_3;
            bytes
        }
        _ => MeasurementPayload {
            gyro: outlier,
            accel: outlier,
            status: 0x77 & !STATUS_ACCEL_Y,
            ..Default::default()
        }
        .encode()
        .as_bytes()
        .to_vec(),
    }
}

// ============================================================================
// Calibration
// ============================================================================

#[test]
fn test_calibration_ignores_interleaved_corrupt_frames() {
    env_logger::try_init().ok();
    let link = MockTransport::new();
    let mut session = Session::with_transport(link.clone(), &test_config(20)).unwrap();

    let mut corrupt = 0;
    for i in 0..20u8 {
        // Gyro X alternates 0.01/0.03, accel X alternates -1.01/-0.99
        let sign = if i % 2 == 0 { -1.0 } else { 1.0 };
        link.inject_read(&valid_frame(
            [0.02 + sign * 0.01, -0.005, 0.0],
            [-1.0 + sign * 0.01, 0.002, 0.004],
            i,
        ));
        if i % 3 == 0 {
            link.inject_read(&corrupt_frame(corrupt));
            corrupt += 1;
        }
        if i % 7 == 0 {
            link.inject_read(&[0x00, 0xFE, 0x81, 0x13]); // line noise
        }
    }

    let bias = session.calibrate().unwrap();
    assert_eq!(session.state(), SessionState::Running);
    assert_eq!(session.calibration().sample_count(), 20);
    assert_eq!(session.calibration().rejected_count(), corrupt as u64);
    assert_eq!(session.stats().unwrap().corrupt, corrupt as u64);

    assert_relative_eq!(bias.gyro[0], 0.02, epsilon = 1e-6);
    assert_relative_eq!(bias.gyro[1], -0.005, epsilon = 1e-6);
    // Gravity axis: mean -1.0 plus one g
    assert_relative_eq!(bias.accel[0], 0.0, epsilon = 1e-6);
    assert_relative_eq!(bias.accel[1], 0.002, epsilon = 1e-6);
    assert_relative_eq!(bias.accel[2], 0.004, epsilon = 1e-6);
    assert_relative_eq!(bias.gyro_std_dev[0], 0.01, epsilon = 1e-5);
}

#[test]
fn test_self_test_then_calibrate() {
    let link = MockTransport::new();
    let mut session = Session::with_transport(link.clone(), &test_config(2)).unwrap();

    link.inject_read(&valid_frame([0.0; 3], [-1.0, 0.0, 0.0], 0));
    link.inject_read(encode_built_in_test([0x7F; 6]).as_bytes());
    link.inject_read(&valid_frame([0.0; 3], [-1.0, 0.0, 0.0], 1));
    link.inject_read(&valid_frame([0.0; 3], [-1.0, 0.0, 0.0], 2));

    assert!(session.self_test().unwrap().all_passed());
    session.calibrate().unwrap();
    assert_eq!(link.get_written(), b"=config,0\n?bit\n");
}

// ============================================================================
// Driver Loop
// ============================================================================

#[test]
fn test_run_publishes_every_fiftieth_cycle_until_link_drops() {
    env_logger::try_init().ok();
    let link = MockTransport::new();
    let mut session = Session::with_transport(link.clone(), &test_config(1)).unwrap();

    link.inject_read(&valid_frame([0.0; 3], [-1.0, 0.0, 0.0], 0));
    session.calibrate().unwrap();

    // Baseline plus 120 integrated cycles, with corrupt frames mixed in
    for i in 0..=120u32 {
        link.inject_read(&valid_frame([0.0; 3], [-1.0, 0.0, 0.0], i as u8));
        if i % 10 == 5 {
            link.inject_read(&corrupt_frame(i as usize));
        }
    }

    let (mut sink, rx) = ChannelSink::bounded(8);
    let running = AtomicBool::new(true);
    let err = session.run(&running, &mut sink).unwrap_err();

    // Stream exhausted: the mock reports it as a byte timeout
    assert!(matches!(err, Error::Timeout { read: 0, .. }));
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(link.handle_count(), 1);

    let sequences: Vec<u64> = rx.try_iter().map(|out| out.sequence).collect();
    assert_eq!(sequences, vec![1, 2]);
}

#[test]
fn test_stopped_flag_ends_loop_cleanly() {
    let link = MockTransport::new();
    let mut session = Session::with_transport(link.clone(), &test_config(1)).unwrap();
    link.inject_read(&valid_frame([0.0; 3], [-1.0, 0.0, 0.0], 0));
    session.calibrate().unwrap();

    let (mut sink, _rx) = ChannelSink::bounded(1);
    let running = AtomicBool::new(false);
    assert_eq!(session.run(&running, &mut sink).unwrap(), 0);
    assert_eq!(session.state(), SessionState::Running);
}

#[test]
fn test_disconnect_mid_stream_closes_session() {
    let link = MockTransport::new();
    let mut session = Session::with_transport(link.clone(), &test_config(1)).unwrap();
    link.inject_read(&valid_frame([0.0; 3], [-1.0, 0.0, 0.0], 0));
    session.calibrate().unwrap();

    link.inject_read(&valid_frame([0.0; 3], [-1.0, 0.0, 0.0], 1));
    assert!(session.step_at(0).unwrap().is_none());

    link.disconnect();
    let err = session.step_at(1_000).unwrap_err();
    assert!(err.is_transport());
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(link.handle_count(), 1);
}

// ============================================================================
// Determinism
// ============================================================================

/// Calibrate on a still stream, then rotate about X at 0.5 rad/s for 1 s
fn replay() -> Vec<disha_io::OutputSample> {
    let link = MockTransport::new();
    let mut session = Session::with_transport(link.clone(), &test_config(10)).unwrap();
    for i in 0..10u8 {
        link.inject_read(&valid_frame([0.001, 0.0, -0.002], [-1.0, 0.0, 0.0], i));
    }
    session.calibrate().unwrap();

    let mut outputs = Vec::new();
    for k in 0..=200u64 {
        link.inject_read(&valid_frame([0.501, 0.0, -0.002], [-1.0, 0.0, 0.0], k as u8));
        if let Some(out) = session.step_at(k * 5_000).unwrap() {
            outputs.push(out);
        }
    }
    outputs
}

#[test]
fn test_replay_is_deterministic() {
    let first = replay();
    let second = replay();
    assert_eq!(first.len(), 4);
    assert_eq!(first, second);

    // 200 cycles × 5 ms = 1 s at 0.5 rad/s about the vertical axis
    let last = first.last().unwrap();
    let (_, _, yaw) = last.inertial.orientation.to_euler();
    assert_relative_eq!(yaw, 0.5, epsilon = 1e-6);
    assert_eq!(last.timestamp_us, 1_000_000);
}
