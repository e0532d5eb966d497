//! Print every decoded DSP-1750 measurement frame.
//!
//! Usage: `stream-viewer [port]` (default `/dev/ttyUSB0`)

use disha_io::config::DeviceConfig;
use disha_io::devices::dsp1750::Dsp1750;
use disha_io::error::{Error, Result};
use std::env;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = DeviceConfig::default();
    if let Some(port) = env::args().nth(1) {
        config.port = port;
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || r.store(false, Ordering::Relaxed))
        .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let mut imu = Dsp1750::open(&config)?;
    imu.set_config_mode(false)?;

    while running.load(Ordering::Relaxed) {
        match imu.read_measurement() {
            Ok(s) => {
                println!(
                    "gyro: {:12.6} {:12.6} {:12.6}  accel: {:10.6} {:10.6} {:10.6}",
                    s.gyro[0], s.gyro[1], s.gyro[2], s.accel[0], s.accel[1], s.accel[2]
                );
                println!(
                    "    status: gyro {:?} accel {:?}  seq: {:3}  temp: {:3} C  crc: {:08x}",
                    s.status.gyro, s.status.accel, s.sequence, s.temperature, s.crc
                );
            }
            Err(e) if e.is_corrupt() => println!("corrupt frame: {}", e),
            Err(e) => return Err(e),
        }
    }

    let stats = imu.stats();
    println!("{} frames decoded, {} corrupt", stats.decoded, stats.corrupt);
    Ok(())
}
