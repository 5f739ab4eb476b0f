//! HX 711 Polling Example
//!
//! Reads a load cell wired to a Raspberry Pi. Pins default to DOUT = 5 and
//! PD_SCK = 6 and can be overridden: `polling <dout> <pd_sck> [gain]`.
//!
//! Set `RUST_LOG=trace` to see every raw sample.

use std::time::Duration;

use hx711_gpio::gpio::linux::RppalChip;
use hx711_gpio::gpio::Hx711Lines;
use hx711_gpio::scale::WeighScale;
use hx711_gpio::wait::Until;
use hx711_gpio::{Config, Error, GainMode, LoadCell};
use rppal::hal::Delay;

const READ_TIMEOUT: Duration = Duration::from_secs(1);
const TARE_SAMPLES: usize = 16;
const REFERENCE_UNIT: f32 = 114.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match parse_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("usage: polling [dout] [pd_sck] [128|64|32]");
            std::process::exit(2);
        }
    };

    let mut load_sensor = match Hx711Lines::initialize(RppalChip::open, &config, Delay::new()) {
        Ok(lines) => lines,
        Err(err) => {
            log::error!("failed to start hx711: {err}");
            std::process::exit(1);
        }
    };

    // zero the readings
    let mut scale = WeighScale::new(&mut load_sensor);
    match scale.tare(TARE_SAMPLES) {
        Ok(offset) => log::info!("tare offset = {offset}"),
        Err(err) => log::warn!("tare failed: {err}"),
    }
    scale.set_scale(REFERENCE_UNIT);
    let offset = scale.get_offset();

    loop {
        match load_sensor.read_until(Until::after(READ_TIMEOUT)) {
            Ok(raw) => {
                let weight = raw.saturating_sub(offset) as f32 / REFERENCE_UNIT;
                println!("raw = {raw} weight = {weight:.1}");
            }
            Err(Error::Timeout) => log::warn!("waiting for HX711..."),
            Err(err) => log::error!("read failed: {err}"),
        }
        std::thread::sleep(Duration::from_millis(500));
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Config, String> {
    let mut config = Config::default();
    if let Some(dout) = args.next() {
        config.data_pin = dout.parse().map_err(|_| format!("bad dout pin {dout}"))?;
    }
    if let Some(sck) = args.next() {
        config.clock_pin = sck.parse().map_err(|_| format!("bad pd_sck pin {sck}"))?;
    }
    if let Some(gain) = args.next() {
        let value: u8 = gain.parse().map_err(|_| format!("bad gain {gain}"))?;
        config.gain =
            GainMode::try_from(value).map_err(|value| format!("unsupported gain {value}"))?;
    }
    Ok(config)
}
