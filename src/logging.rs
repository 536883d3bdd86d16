use env_logger::WriteStyle;
use log::LevelFilter;
use std::io::Write;

/// Installs an `env_logger` backend with the crate's line format.
///
/// Hosts that already own a `log` backend should skip this and route the
/// crate's records through their own logger instead.
pub fn try_init() -> Result<(), log::SetLoggerError> {
    env_logger::builder()
        .format(|buf, record| writeln!(buf, "[PEBBLE | {}] {}", record.level(), record.args()))
        .write_style(WriteStyle::Always)
        .filter(None, LevelFilter::Info)
        .try_init()
}
