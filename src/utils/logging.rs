//! Structured Logging with Credential Redaction
//!
//! Provides safe logging that automatically redacts:
//! - API secrets and passwords (fully)
//! - API keys (partially)
//! - Request signatures (partially)

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Global flag to enable/disable debug logging
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Set while a full-screen terminal UI owns stderr
static SUPPRESSED: AtomicBool = AtomicBool::new(false);

/// Enable debug logging
pub fn enable_debug() {
    DEBUG_ENABLED.store(true, Ordering::SeqCst);
}

/// Check if debug logging is enabled
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::SeqCst)
}

/// Stop writing entries of every level to stderr (alternate screen active).
///
/// Debug mode overrides this.
pub fn suppress_output() {
    SUPPRESSED.store(true, Ordering::SeqCst);
}

/// Resume writing entries to stderr.
pub fn resume_output() {
    SUPPRESSED.store(false, Ordering::SeqCst);
}

pub fn is_output_suppressed() -> bool {
    SUPPRESSED.load(Ordering::SeqCst)
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Structured log entry
#[derive(Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub module: &'static str,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogEntry {
    pub fn new(level: LogLevel, module: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            module,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field to the log entry (auto-redacts sensitive data)
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let value_str = value.to_string();
        let redacted = redact_if_sensitive(key, &value_str);
        self.fields.push((key, redacted));
        self
    }

    /// Whether this entry would be written right now
    pub fn is_enabled(&self) -> bool {
        if self.level == LogLevel::Debug && !is_debug_enabled() {
            return false;
        }
        // debug mode keeps everything visible, even under the TUI
        if is_output_suppressed() && !is_debug_enabled() {
            return false;
        }
        true
    }

    /// Render the entry as a single line (without trailing newline)
    pub fn format_line(&self) -> String {
        let fields_str = self
            .fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");

        if fields_str.is_empty() {
            format!("[{}] {} [{}] {}", timestamp, self.level, self.module, self.message)
        } else {
            format!(
                "[{}] {} [{}] {} | {}",
                timestamp, self.level, self.module, self.message, fields_str
            )
        }
    }

    /// Log the entry
    pub fn log(self) {
        if !self.is_enabled() {
            return;
        }
        eprintln!("{}", self.format_line());
    }
}

/// Redact a value if the key suggests it's sensitive
fn redact_if_sensitive(key: &str, value: &str) -> String {
    let key_lower = key.to_lowercase();

    // Keys that should always be fully redacted
    let fully_redacted_keys = ["secret", "password", "passphrase", "token"];

    for sensitive_key in &fully_redacted_keys {
        if key_lower.contains(sensitive_key) {
            return redact_value(value);
        }
    }

    if key_lower.contains("api_key") || key_lower == "key" {
        return redact_key(value);
    }

    if key_lower.contains("signature") {
        return redact_signature(value);
    }

    value.to_string()
}

/// Fully redact a sensitive value
fn redact_value(value: &str) -> String {
    if value.is_empty() {
        return "[EMPTY]".to_string();
    }

    let len = value.len();
    if len <= 4 {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED:{}chars]", len)
    }
}

/// Partially redact an API key (show first and last 4 chars)
fn redact_key(key: &str) -> String {
    let trimmed = key.trim();

    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }

    // Short keys would be fully revealed by the prefix/suffix
    if trimmed.len() <= 12 || !trimmed.is_ascii() {
        return redact_value(trimmed);
    }

    format!("{}...{}", &trimmed[..4], &trimmed[trimmed.len() - 4..])
}

/// Partially redact a hex signature (show first 10 and last 6 chars)
fn redact_signature(signature: &str) -> String {
    let trimmed = signature.trim();

    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }

    if trimmed.len() <= 20 || !trimmed.is_ascii() {
        return redact_value(trimmed);
    }

    format!("{}...{}", &trimmed[..10], &trimmed[trimmed.len() - 6..])
}

/// Convenience macro for debug logging
#[macro_export]
macro_rules! log_debug {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Debug,
            $module,
            $msg
        ).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Debug,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

/// Convenience macro for info logging
#[macro_export]
macro_rules! log_info {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Info,
            $module,
            $msg
        ).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Info,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

/// Convenience macro for warning logging
#[macro_export]
macro_rules! log_warn {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Warn,
            $module,
            $msg
        ).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Warn,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

/// Convenience macro for error logging
#[macro_export]
macro_rules! log_error {
    ($module:expr, $msg:expr) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Error,
            $module,
            $msg
        ).log()
    };
    ($module:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::Error,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_value() {
        assert_eq!(redact_value(""), "[EMPTY]");
        assert_eq!(redact_value("abc"), "[REDACTED]");
        assert_eq!(redact_value("secret_key_12345"), "[REDACTED:16chars]");
    }

    #[test]
    fn test_redact_key() {
        let redacted = redact_key("ABCD1234efgh5678WXYZ");
        assert_eq!(redacted, "ABCD...WXYZ");

        // too short to partially reveal
        assert_eq!(redact_key("short"), "[REDACTED:5chars]");
    }

    #[test]
    fn test_redact_signature() {
        let sig = "a9e8c4f67b346556f1fa5b29018e356fd6994e097cf6afccb346aaceddb86479";
        let redacted = redact_signature(sig);
        assert!(redacted.starts_with("a9e8c4f67b"));
        assert!(redacted.ends_with("b86479"));
        assert!(redacted.contains("..."));
    }

    #[test]
    fn test_redact_if_sensitive() {
        assert!(redact_if_sensitive("api_secret", "s3cr3t-value").contains("REDACTED"));
        assert!(redact_if_sensitive("api_key", "ABCD1234efgh5678WXYZ").contains("..."));
        assert_eq!(redact_if_sensitive("instrument", "BTC_USDT"), "BTC_USDT");
    }

    #[test]
    fn test_log_entry() {
        let entry = LogEntry::new(LogLevel::Info, "test", "Signed request")
            .field("endpoint", "public/get-candlestick")
            .field("api_secret", "s3cr3t")
            .field("api_key", "ABCD1234efgh5678WXYZ");

        let secret = entry.fields.iter().find(|(k, _)| *k == "api_secret");
        assert!(secret.unwrap().1.contains("REDACTED"));

        let key = entry.fields.iter().find(|(k, _)| *k == "api_key");
        assert_eq!(key.unwrap().1, "ABCD...WXYZ");

        let line = entry.format_line();
        assert!(line.contains("INFO [test] Signed request | endpoint=public/get-candlestick"));
        assert!(!line.contains("s3cr3t"));
    }
}
