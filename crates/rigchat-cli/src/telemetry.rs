//! Trace logging for the CLI. Events go to a JSON-lines file; the terminal
//! is reserved for the conversation.

use std::env;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::Level;
use tracing_subscriber::fmt::time::UtcTime;

const DEFAULT_LEVEL: Level = Level::DEBUG;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Where `--logs` writes, and how much.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LogSettings {
    pub path: PathBuf,
    pub level: Level,
}

impl LogSettings {
    /// `level` comes from `--log-level` or `RIGCHAT_LOG_LEVEL`; unknown
    /// names fall back to debug.
    pub(crate) fn new(level: Option<&str>) -> Self {
        Self {
            path: trace_log_path(),
            level: level.and_then(parse_level).unwrap_or(DEFAULT_LEVEL),
        }
    }

    fn open(&self) -> std::io::Result<File> {
        OpenOptions::new().create(true).append(true).open(&self.path)
    }
}

pub(crate) fn trace_log_path() -> PathBuf {
    env::var("RIGCHAT_TRACE_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir().join("rigchat_trace.jsonl"))
}

fn parse_level(name: &str) -> Option<Level> {
    name.trim().parse().ok()
}

/// Install the global subscriber once. A log file that cannot be opened
/// leaves tracing off rather than failing the chat.
pub(crate) fn init_tracing(settings: &LogSettings) {
    let _ = TRACING_INIT.get_or_init(|| {
        let file = match settings.open() {
            Ok(file) => file,
            Err(err) => {
                eprintln!("rigchat: logging disabled, {}: {}", settings.path.display(), err);
                return;
            }
        };
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(settings.level)
            .with_timer(UtcTime::rfc_3339())
            .with_writer(file)
            .with_target(false)
            .with_current_span(false)
            .with_span_list(false)
            .finish();
        if tracing::subscriber::set_global_default(subscriber).is_ok() {
            tracing::info!(level = %settings.level, "trace logging started");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!(parse_level("info"), Some(Level::INFO));
        assert_eq!(parse_level(" WARN "), Some(Level::WARN));
        assert_eq!(parse_level("chatty"), None);
        assert_eq!(LogSettings::new(Some("trace")).level, Level::TRACE);
        assert_eq!(LogSettings::new(Some("chatty")).level, Level::DEBUG);
        assert_eq!(LogSettings::new(None).level, Level::DEBUG);
    }

    #[test]
    fn test_trace_log_path_env_override() {
        env::set_var("RIGCHAT_TRACE_LOG", "/tmp/custom-rigchat.jsonl");
        assert_eq!(trace_log_path(), PathBuf::from("/tmp/custom-rigchat.jsonl"));
        env::remove_var("RIGCHAT_TRACE_LOG");
        assert_eq!(trace_log_path(), env::temp_dir().join("rigchat_trace.jsonl"));
    }

    #[test]
    fn test_settings_open_appends() {
        let dir = tempfile::tempdir().unwrap();
        let settings = LogSettings {
            path: dir.path().join("trace.jsonl"),
            level: Level::INFO,
        };
        drop(settings.open().unwrap());
        assert!(settings.path.exists());
    }
}
