//! Logging setup.
//!
//! Messages go to the system log under the `xbeep` name. When no syslog
//! socket is reachable they go to stderr through env_logger instead.

use log::LevelFilter;
use syslog::{BasicLogger, Facility, Formatter3164};

const PROCESS_NAME: &str = "xbeep";

/// Install the global logger. Safe to call once at startup.
pub fn init() {
    let formatter = Formatter3164 {
        facility: Facility::LOG_USER,
        hostname: None,
        process: PROCESS_NAME.into(),
        pid: std::process::id(),
    };

    match syslog::unix(formatter) {
        Ok(logger) => {
            if log::set_boxed_logger(Box::new(BasicLogger::new(logger))).is_ok() {
                log::set_max_level(LevelFilter::Debug);
            }
        }
        Err(e) => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .init();
            log::warn!("Cannot connect to syslog: {}", e);
        }
    }
}
