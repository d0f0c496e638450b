use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::{env, str::FromStr};

/// Environment variable holding the level forwarded to the simulator.
pub const LOG_ENV: &str = "ROI_VPI_LOG";

/// Level from `ROI_VPI_LOG`, `warn` when unset or unparsable.
pub fn level_from_env() -> LevelFilter {
    env::var(LOG_ENV)
        .ok()
        .and_then(|text| LevelFilter::from_str(&text).ok())
        .unwrap_or(LevelFilter::Warn)
}

/// A `log` backend that writes records to the simulator's output, so
/// diagnostics land between the simulation's own messages.
pub struct HostLogger<F> {
    level: LevelFilter,
    sink: F,
}

impl<F> HostLogger<F>
where
    F: Fn(&str) + Send + Sync + 'static,
{
    pub fn new(level: LevelFilter, sink: F) -> Self {
        Self { level, sink }
    }

    /// Installs this logger as the global `log` backend.
    pub fn install(self) -> Result<(), SetLoggerError> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl<F> Log for HostLogger<F>
where
    F: Fn(&str) + Send + Sync,
{
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "[{} {}] {}\n",
            record.level(),
            record.target(),
            record.args()
        );
        (self.sink)(&line);
    }

    fn flush(&self) {}
}
