//! Logger setup and per-module log gating.
//!
//! Modules that log on hot paths (every click, every label) define
//! `const ENABLE_LOGS: bool` and use the macros below, so the noise can be
//! switched off per module without touching `RUST_LOG`:
//! ```ignore
//! const ENABLE_LOGS: bool = false;
//! use crate::log_info;
//!
//! log_info!("only printed when ENABLE_LOGS is true");
//! ```

/// Initialise `env_logger`. `RUST_LOG` wins when set; otherwise Info, or
/// Debug when `LABELIZER_DEBUG` is `1`/`true`.
pub fn init() {
    let debug_mode = std::env::var("LABELIZER_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let default_level = if debug_mode {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(default_level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    // A second init (tests, embedding) is harmless.
    let _ = builder.try_init();
}

/// Info log gated by the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Warn log gated by the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Error log gated by the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
