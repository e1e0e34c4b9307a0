//! Process-wide logging setup.
//!
//! `RUST_LOG` works as usual. Without it the default level is Info, or
//! Debug when `FLABBA_DEBUG` is set to `1`/`true`.

use log::{error, LevelFilter};

pub const DEBUG_ENV: &str = "FLABBA_DEBUG";

pub fn default_level(debug_flag: Option<&str>) -> LevelFilter {
    match debug_flag.map(str::trim) {
        Some("1") => LevelFilter::Debug,
        Some(flag) if flag.eq_ignore_ascii_case("true") => LevelFilter::Debug,
        _ => LevelFilter::Info,
    }
}

pub fn init_logging() {
    let flag = std::env::var(DEBUG_ENV).ok();
    let mut builder = env_logger::Builder::new();
    builder.filter_level(default_level(flag.as_deref()));
    // RUST_LOG directives override the default level.
    builder.parse_default_env();
    if builder.try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}

/// Routes panics through the logger before the default hook runs.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let thread = std::thread::current();
        error!(
            "panic in thread '{}': {info}",
            thread.name().unwrap_or("<unnamed>")
        );
        previous(info);
    }));
}
