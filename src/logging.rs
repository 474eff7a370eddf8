//! Structured logging for the receiver pipeline.
//!
//! Kept in-process rather than routed through an external logging
//! framework, matching the pattern of a facade the caller can inspect or
//! discard without wiring up a global logger.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,

    /// DETECTOR, BASELINE
    pub enable_detector: bool,
    /// DOWNMIX, CFO, SYNC
    pub enable_downmix: bool,
    /// GARDNER, PLL
    pub enable_demod: bool,
    /// DECODE, FEC
    pub enable_decode: bool,

    pub max_entries: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            enable_detector: true,
            enable_downmix: true,
            enable_demod: true,
            enable_decode: true,
            max_entries: 1000,
        }
    }
}

impl LogConfig {
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            max_entries: 5000,
            ..Default::default()
        }
    }

    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Warn,
            enable_detector: false,
            enable_downmix: false,
            enable_demod: false,
            enable_decode: false,
            max_entries: 100,
        }
    }

    pub fn disabled() -> Self {
        Self {
            level: LogLevel::Error,
            enable_detector: false,
            enable_downmix: false,
            enable_demod: false,
            enable_decode: false,
            max_entries: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub subsystem: &'static str,
    pub message: String,
}

/// Collects structured log entries with subsystem filtering and a bounded
/// ring so long-running receivers don't grow the log unbounded.
#[derive(Debug, Clone)]
pub struct SignalLogger {
    config: LogConfig,
    entries: Vec<LogEntry>,
}

impl SignalLogger {
    pub fn new(config: LogConfig) -> Self {
        let capacity = config.max_entries.min(1000);
        Self {
            config,
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn log(&mut self, level: LogLevel, subsystem: &'static str, message: impl fmt::Display) {
        if level < self.config.level {
            return;
        }

        let enabled = match subsystem {
            "DETECTOR" | "BASELINE" => self.config.enable_detector,
            "DOWNMIX" | "CFO" | "SYNC" => self.config.enable_downmix,
            "GARDNER" | "PLL" => self.config.enable_demod,
            "DECODE" | "FEC" => self.config.enable_decode,
            _ => true,
        };

        if !enabled {
            return;
        }

        let entry = LogEntry {
            level,
            subsystem,
            message: message.to_string(),
        };

        if self.config.max_entries > 0 {
            if self.entries.len() >= self.config.max_entries {
                self.entries.remove(0);
            }
            self.entries.push(entry);
        }

        #[cfg(any(test, debug_assertions))]
        {
            eprintln!("[{}] {}: {}", level, subsystem, message);
        }
    }

    pub fn trace(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Trace, subsystem, message);
    }

    pub fn debug(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Debug, subsystem, message);
    }

    pub fn info(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Info, subsystem, message);
    }

    pub fn warn(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Warn, subsystem, message);
    }

    pub fn error(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Error, subsystem, message);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn entries_for_subsystem(&self, subsystem: &str) -> Vec<&LogEntry> {
        self.entries
            .iter()
            .filter(|e| e.subsystem == subsystem)
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for SignalLogger {
    fn default() -> Self {
        Self::new(LogConfig::default())
    }
}

impl fmt::Display for SignalLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "[{}] {}: {}", entry.level, entry.subsystem, entry.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_by_level() {
        let mut logger = SignalLogger::new(LogConfig {
            level: LogLevel::Info,
            ..Default::default()
        });

        logger.trace("DETECTOR", "trace message");
        logger.debug("DETECTOR", "debug message");
        logger.info("DETECTOR", "info message");
        logger.warn("DETECTOR", "warn message");

        assert_eq!(logger.entries().len(), 2);
    }

    #[test]
    fn filters_by_subsystem() {
        let mut logger = SignalLogger::new(LogConfig {
            level: LogLevel::Debug,
            enable_detector: false,
            ..Default::default()
        });

        logger.info("DETECTOR", "dropped");
        logger.info("DOWNMIX", "kept");

        assert_eq!(logger.entries().len(), 1);
        assert_eq!(logger.entries()[0].subsystem, "DOWNMIX");
    }

    #[test]
    fn respects_max_entries() {
        let mut logger = SignalLogger::new(LogConfig {
            level: LogLevel::Debug,
            max_entries: 2,
            ..Default::default()
        });

        logger.info("DECODE", "one");
        logger.info("DECODE", "two");
        logger.info("DECODE", "three");

        assert_eq!(logger.entries().len(), 2);
        assert!(logger.entries()[0].message.contains("two"));
    }
}
