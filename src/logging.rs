//! Log construction for the harness.
//!
//! The logger is built explicitly by the composing entry point and handed
//! back as a drain to flush, instead of mutating whatever ambient logger
//! the host runtime carries.

use ringlog::*;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_level(self) -> Level {
        match self {
            Self::Error => Level::Error,
            Self::Warn => Level::Warn,
            Self::Info => Level::Info,
            Self::Debug => Level::Debug,
            Self::Trace => Level::Trace,
        }
    }
}

#[derive(Clone, Default, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    log_level: LogLevel,
    log_file: Option<String>,
    log_backup: Option<String>,
    #[serde(default = "log_max_size")]
    log_max_size: u64,
    #[serde(default = "log_queue_depth")]
    log_queue_depth: usize,
    #[serde(default = "log_single_message_size")]
    log_single_message_size: usize,
}

fn log_max_size() -> u64 {
    1024 * 1024 * 1024
}

fn log_queue_depth() -> usize {
    4096
}

fn log_single_message_size() -> usize {
    1024
}

impl LogConfig {
    pub fn log_level(&self) -> Level {
        self.log_level.to_level()
    }

    pub fn log_file(&self) -> Option<String> {
        self.log_file.clone()
    }

    pub fn log_backup(&self) -> Option<String> {
        self.log_backup.clone()
    }
}

/// Builds and starts the log. The caller owns the returned drain and is
/// responsible for flushing it periodically and once after shutdown.
pub fn init(config: &LogConfig) -> Box<dyn Drain> {
    let output: Box<dyn Output> = if let Some(file) = config.log_file() {
        let backup = config.log_backup().unwrap_or(format!("{}.old", file));
        Box::new(
            File::new(&file, &backup, config.log_max_size).expect("failed to open debug log file"),
        )
    } else {
        // by default, log to stderr
        Box::new(Stderr::new())
    };

    let level = config.log_level();

    let log = if level <= Level::Info {
        LogBuilder::new().format(ringlog::default_format)
    } else {
        LogBuilder::new()
    }
    .output(output)
    .log_queue_depth(config.log_queue_depth)
    .single_message_size(config.log_single_message_size)
    .build()
    .expect("failed to initialize debug log");

    MultiLogBuilder::new()
        .level_filter(level.to_level_filter())
        .default(log)
        .build()
        .start()
}
