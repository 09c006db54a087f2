//! Thin logging facade re-exporting the `log` crate macros.
//!
//! `pack` and `tower` log through this crate rather than `log` directly so
//! that a future richer backend (file rotation, structured fields, a color
//! filter on level) can be swapped in behind this one import, the way
//! `ckb-logger` wraps `log` for the rest of CKB. Severity mapping follows
//! the original implementation's `FD_LOG_*` call sites: `FD_LOG_NOTICE` maps
//! to [`info`], `FD_LOG_WARNING` to [`warn`], and a process-fatal
//! `FD_LOG_ERR` is represented by callers constructing a
//! `vld_error::FatalError` instead of logging directly.
pub use log::{debug, error, info, trace, warn};

#[cfg(feature = "init")]
/// Initializes a process-wide env-filtered logger with no explicit
/// configuration, deferring entirely to `RUST_LOG`. Intended for binaries and
/// integration tests; library code must never call this.
pub fn init() {
    let _ = env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .try_init();
}

#[cfg(feature = "init")]
/// Initializes a process-wide logger from a loaded [`vld_logger_config::LoggerConfig`],
/// the way `ckb-logger-service` builds its `env_logger::Builder` from
/// `ckb-logger-config`'s parsed TOML. `cfg.filter` overrides `RUST_LOG` when
/// present; `cfg.color` toggles ANSI level coloring in the formatted output.
pub fn init_from_config(cfg: &vld_logger_config::LoggerConfig) {
    let mut builder = env_logger::Builder::new();
    match &cfg.filter {
        Some(filter) => builder.parse_filters(filter),
        None => builder.parse_default_env(),
    };
    let color = cfg.color;
    builder
        .format_timestamp_millis()
        .format(move |buf, record| {
            use std::io::Write;
            let level = if color {
                colored_level(record.level()).to_string()
            } else {
                record.level().to_string()
            };
            writeln!(buf, "{level} {}: {}", record.target(), record.args())
        });
    let _ = builder.try_init();
}

#[cfg(feature = "init")]
fn colored_level(level: log::Level) -> ansi_term::ANSIString<'static> {
    use ansi_term::Colour::{Blue, Green, Purple, Red, Yellow};
    match level {
        log::Level::Error => Red.paint("ERROR"),
        log::Level::Warn => Yellow.paint("WARN"),
        log::Level::Info => Green.paint("INFO"),
        log::Level::Debug => Blue.paint("DEBUG"),
        log::Level::Trace => Purple.paint("TRACE"),
    }
}
