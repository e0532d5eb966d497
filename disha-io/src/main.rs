//! DishaIO - IMU dead-reckoning daemon
//!
//! Opens the DSP-1750, calibrates while the sensor is still, then hands a pose
//! summary every 50 integrated samples to a logging thread until Ctrl-C or a
//! link failure.

use disha_io::config::Config;
use disha_io::error::{Error, Result};
use disha_io::transport::SerialTransport;
use disha_io::{ChannelSink, LogSink, OutputSink, Session};
use std::env;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

const DEFAULT_CONFIG_PATH: &str = "/etc/disha-io.toml";

/// Parse config path from command line arguments.
///
/// Supports:
/// - `disha-io <path>` (positional)
/// - `disha-io --config <path>` (flag-based)
/// - `disha-io -c <path>` (short flag)
///
/// Returns `None` when no path was given.
fn parse_config_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return Some(args[1].clone());
    }

    None
}

/// Load the given file, or the default file when present
fn load_config(path: Option<&str>) -> Result<(Config, String)> {
    match path {
        Some(path) => Ok((Config::load(path)?, path.to_string())),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Ok((
            Config::load(DEFAULT_CONFIG_PATH)?,
            DEFAULT_CONFIG_PATH.to_string(),
        )),
        None => Ok((Config::default(), "built-in defaults".to_string())),
    }
}

fn drive(
    session: &mut Session<SerialTransport>,
    config: &Config,
    running: &AtomicBool,
    mut sink: ChannelSink,
) -> Result<()> {
    if config.device.self_test {
        match session.self_test() {
            Ok(report) => log::info!("Built-in test results: {:02x?}", report.results),
            Err(e) if e.is_corrupt() => log::warn!("Built-in test response discarded: {}", e),
            Err(e) => return Err(e),
        }
    }

    let bias = session.calibrate()?;
    log::info!("Gyro bias {:?}, accel bias {:?}", bias.gyro, bias.accel);

    session.run(running, &mut sink)?;
    if sink.dropped() > 0 {
        log::warn!("{} outputs dropped by a slow consumer", sink.dropped());
    }
    Ok(())
}

fn main() -> Result<()> {
    let config_path = parse_config_path();
    let (config, source) = load_config(config_path.as_deref())?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("DishaIO v{} starting...", env!("CARGO_PKG_VERSION"));
    log::info!("Using config: {}", source);
    log::info!(
        "Device: {} @ {} baud, gravity axis {:?}",
        config.device.port,
        config.device.baud_rate,
        config.calibration.gravity_axis
    );

    // Set up shutdown signal handler
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);

    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let mut session = match Session::open(&config) {
        Ok(session) => session,
        Err(e) => {
            log::error!("Failed to open {}: {}", config.device.port, e);
            return Err(e);
        }
    };

    // Output consumer; exits once the sink is dropped at the end of `drive`
    let (sink, rx) = ChannelSink::from_config(&config.output);
    let consumer = thread::Builder::new()
        .name("output-log".to_string())
        .spawn(move || {
            let mut log_sink = LogSink;
            for sample in rx {
                if let Err(e) = log_sink.publish(&sample) {
                    log::warn!("Output log failed: {}", e);
                }
            }
        })?;

    let result = drive(&mut session, &config, &running, sink);
    session.close();
    if consumer.join().is_err() {
        log::error!("Output thread panicked");
    }

    match result {
        Ok(()) => {
            log::info!("DishaIO stopped");
            Ok(())
        }
        Err(e) => {
            log::error!("Driver loop failed: {}", e);
            Err(e)
        }
    }
}
