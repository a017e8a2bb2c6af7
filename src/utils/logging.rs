use std::io::Write;
use std::str::FromStr;

use env_logger::Builder;
use log::LevelFilter;

/// Installs the global logger; `RUST_LOG` still overrides `level` per module.
///
/// Unknown levels fall back to `info`. Calling it twice is harmless.
pub fn init_logger(level: &str) {
    let level = LevelFilter::from_str(level).unwrap_or(LevelFilter::Info);
    let mut builder = Builder::new();
    builder
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                buf.timestamp_millis(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .parse_default_env();
    let _ = builder.try_init();
}
