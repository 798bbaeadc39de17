//! Game logger with leveled and semantic channels
//!
//! Logging is a pure side channel: nothing in the engine reads the log to
//! decide game behavior. Entries go to stdout, to an in-memory capture
//! buffer, or both. Text lines are assembled in a bump arena that is reset
//! whenever the buffer is cleared.

use bumpalo::Bump;
use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::fmt::Write as FmtWrite;
use std::ops::Deref;

/// How much gets printed to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerbosityLevel {
    Silent = 0,
    /// Errors and warnings only
    Minimal = 1,
    /// Plus actions, effects and info
    #[default]
    Normal = 2,
    /// Plus debug detail
    Verbose = 3,
}

/// Severity / channel of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    /// A player action (play, quest, challenge, ...)
    Action,
    /// An effect resolution
    Effect,
}

impl LogLevel {
    /// Minimum verbosity at which this level is printed
    pub fn verbosity(&self) -> VerbosityLevel {
        match self {
            LogLevel::Error | LogLevel::Warn => VerbosityLevel::Minimal,
            LogLevel::Info | LogLevel::Action | LogLevel::Effect => VerbosityLevel::Normal,
            LogLevel::Debug => VerbosityLevel::Verbose,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Action => "ACTION",
            LogLevel::Effect => "EFFECT",
        }
    }
}

/// Output format for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Output destination for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Output only to stdout (default)
    #[default]
    Stdout,
    /// Capture only to in-memory buffer (no stdout)
    Memory,
    /// Both stdout and in-memory buffer
    Both,
}

/// A captured log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

/// Read-only view of captured entries
pub struct LogGuard<'a> {
    guard: Ref<'a, Vec<LogEntry>>,
}

impl<'a> LogGuard<'a> {
    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.guard.iter()
    }

    pub fn len(&self) -> usize {
        self.guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }

    /// Entries at `level` whose message contains `needle`
    pub fn count_matching(&self, level: LogLevel, needle: &str) -> usize {
        self.guard
            .iter()
            .filter(|e| e.level == level && e.message.contains(needle))
            .count()
    }
}

impl<'a> Deref for LogGuard<'a> {
    type Target = [LogEntry];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Centralized logger
pub struct GameLogger {
    verbosity: VerbosityLevel,
    output_format: OutputFormat,
    output_mode: OutputMode,

    /// Scratch arena for formatting stdout lines
    format_bump: RefCell<Bump>,

    log_buffer: RefCell<Vec<LogEntry>>,
}

impl GameLogger {
    /// Create a new logger with default verbosity (Normal)
    pub fn new() -> Self {
        Self::with_verbosity(VerbosityLevel::default())
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        GameLogger {
            verbosity,
            output_format: OutputFormat::default(),
            output_mode: OutputMode::default(),
            format_bump: RefCell::new(Bump::new()),
            log_buffer: RefCell::new(Vec::new()),
        }
    }

    /// No-op logger for headless execution
    pub fn silent() -> Self {
        Self::with_verbosity(VerbosityLevel::Silent)
    }

    /// Capturing logger that never prints
    pub fn capturing() -> Self {
        let mut logger = Self::with_verbosity(VerbosityLevel::Verbose);
        logger.set_output_mode(OutputMode::Memory);
        logger
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    pub fn enable_capture(&mut self) {
        self.output_mode = OutputMode::Memory;
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.output_mode, OutputMode::Memory | OutputMode::Both)
    }

    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.output_format = format;
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    /// Captured entries
    pub fn logs(&self) -> LogGuard<'_> {
        LogGuard {
            guard: self.log_buffer.borrow(),
        }
    }

    pub fn clear_logs(&mut self) {
        self.log_buffer.borrow_mut().clear();
        self.format_bump.borrow_mut().reset();
    }

    /// Print captured entries allowed by the verbosity, then clear
    pub fn flush_buffer(&mut self) {
        let buffer = self.log_buffer.borrow();
        for entry in buffer.iter() {
            if entry.level.verbosity() <= self.verbosity {
                self.write_stdout(entry.level, &entry.message);
            }
        }
        drop(buffer);
        self.clear_logs();
    }

    fn write_stdout(&self, level: LogLevel, message: &str) {
        match self.output_format {
            OutputFormat::Text => {
                let bump = self.format_bump.borrow();
                let mut line = bumpalo::collections::String::new_in(&bump);
                // Writing into an arena string cannot fail
                let _ = write!(line, "[{}] {}", level.tag(), message);
                println!("{}", line);
            }
            OutputFormat::Json => {
                println!("{}", serde_json::json!({ "level": level, "message": message }));
            }
        }
    }

    /// Route one entry to capture and/or stdout
    pub fn log(&self, level: LogLevel, message: &str) {
        let should_capture = self.is_capturing();
        let should_output = matches!(self.output_mode, OutputMode::Stdout | OutputMode::Both)
            && level.verbosity() <= self.verbosity
            && self.verbosity != VerbosityLevel::Silent;

        if should_capture {
            self.log_buffer.borrow_mut().push(LogEntry {
                level,
                message: message.to_string(),
            });
        }
        if should_output {
            self.write_stdout(level, message);
        }
    }

    #[inline]
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn action(&self, message: &str) {
        self.log(LogLevel::Action, message);
    }

    #[inline]
    pub fn effect(&self, message: &str) {
        self.log(LogLevel::Effect, message);
    }
}

impl Default for GameLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GameLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLogger")
            .field("verbosity", &self.verbosity)
            .field("output_mode", &self.output_mode)
            .field("log_count", &self.log_buffer.borrow().len())
            .finish()
    }
}

// Clones and snapshots carry the configuration, never the captured entries
impl Clone for GameLogger {
    fn clone(&self) -> Self {
        GameLogger {
            verbosity: self.verbosity,
            output_format: self.output_format,
            output_mode: self.output_mode,
            format_bump: RefCell::new(Bump::new()),
            log_buffer: RefCell::new(Vec::new()),
        }
    }
}

impl Serialize for GameLogger {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("GameLogger", 3)?;
        state.serialize_field("verbosity", &self.verbosity)?;
        state.serialize_field("output_format", &self.output_format)?;
        state.serialize_field("output_mode", &self.output_mode)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for GameLogger {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct GameLoggerData {
            verbosity: VerbosityLevel,
            #[serde(default)]
            output_format: OutputFormat,
            #[serde(default)]
            output_mode: OutputMode,
        }

        let data = GameLoggerData::deserialize(deserializer)?;
        let mut logger = GameLogger::with_verbosity(data.verbosity);
        logger.output_format = data.output_format;
        logger.output_mode = data.output_mode;
        Ok(logger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_creation() {
        let logger = GameLogger::new();
        assert_eq!(logger.verbosity(), VerbosityLevel::Normal);
        assert!(!logger.is_capturing());
    }

    #[test]
    fn test_log_capture() {
        let logger = GameLogger::capturing();
        logger.info("nothing to discard");
        logger.warn("invalid choice");
        logger.effect("deals 2 damage");

        let logs = logger.logs();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].level, LogLevel::Info);
        assert_eq!(logs[1].level, LogLevel::Warn);
        assert_eq!(logs.count_matching(LogLevel::Effect, "damage"), 1);
    }

    #[test]
    fn test_silent_logger_is_noop() {
        let logger = GameLogger::silent();
        logger.error("boom");
        logger.info("quiet");
        assert!(logger.logs().is_empty());
    }

    #[test]
    fn test_flush_buffer() {
        let mut logger = GameLogger::new();
        logger.enable_capture();
        logger.action("Alice quests");
        assert_eq!(logger.logs().len(), 1);
        logger.flush_buffer();
        assert!(logger.logs().is_empty());
    }

    #[test]
    fn test_clone_drops_entries() {
        let logger = GameLogger::capturing();
        logger.info("entry");
        let copy = logger.clone();
        assert!(copy.logs().is_empty());
        assert!(copy.is_capturing());
    }

    #[test]
    fn test_serde_keeps_configuration_only() {
        let logger = GameLogger::capturing();
        logger.debug("not serialized");
        let json = serde_json::to_string(&logger).unwrap();
        assert!(!json.contains("not serialized"));
        let back: GameLogger = serde_json::from_str(&json).unwrap();
        assert_eq!(back.verbosity(), VerbosityLevel::Verbose);
        assert_eq!(back.output_mode(), OutputMode::Memory);
    }
}
