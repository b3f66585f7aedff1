//! xbeep - plays X keyboard bells as sine tones through ALSA.

mod alsa_sink;
mod bell;
mod config;
mod logging;
mod player;
mod sink;
mod tone;
mod xkb;

use alsa_sink::AlsaOutput;
use config::BeepConfig;
use std::process::ExitCode;
use xkb::XkbBellSource;

const USAGE: &str = "xbeep\n\nListens for XkbBellNotify events and plays beeps via ALSA device";

fn main() -> ExitCode {
    let arg = std::env::args().nth(1);
    if matches!(arg.as_deref(), Some("-h") | Some("--help")) {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    logging::init();

    let mut source = match XkbBellSource::connect(None) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{}", e);
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(arg) = arg {
        log::warn!("Ignoring argument {}", arg);
    }

    let config = BeepConfig::default();
    log::info!("xbeep running on ALSA device {}", config.device);

    let mut output = AlsaOutput;
    match bell::run(&mut source, &mut output, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("X connection lost: {}", e);
            log::error!("X connection lost: {}", e);
            ExitCode::FAILURE
        }
    }
}
