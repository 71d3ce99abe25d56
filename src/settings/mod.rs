use std::env;
use std::fs::File;
use std::str::FromStr;
use std::time::Duration;

use dotenv::dotenv;
use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, SharedLogger, TermLogger, TerminalMode, WriteLogger};

#[derive(Clone)]
pub struct Config {
    /// How long after the last keystroke a typing indicator survives.
    pub typing_window: Duration,
    /// Upper bound for notification content previews, in characters.
    pub preview_chars: usize,
    pub conversation_cache_capacity: usize,
    pub message_cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            typing_window: Duration::from_secs(3),
            preview_chars: 96,
            conversation_cache_capacity: 64,
            message_cache_capacity: 32,
        }
    }
}

impl Config {
    pub fn env() -> Self {
        dotenv().ok();

        let defaults = Self::default();
        Self {
            typing_window: env_parse("TYPING_WINDOW_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.typing_window),
            preview_chars: env_parse("NOTIFICATION_PREVIEW_CHARS")
                .unwrap_or(defaults.preview_chars),
            conversation_cache_capacity: env_parse("CONVERSATION_CACHE_CAPACITY")
                .unwrap_or(defaults.conversation_cache_capacity),
            message_cache_capacity: env_parse("MESSAGE_CACHE_CAPACITY")
                .unwrap_or(defaults.message_cache_capacity),
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

pub fn init_logging() {
    let rust_log = env::var("RUST_LOG").unwrap_or("info".into());
    let level = LevelFilter::from_str(&rust_log).unwrap_or(LevelFilter::Info);
    let log_file = env::var("SERVICE_NAME")
        .map(|pkg| format!("{pkg}.log"))
        .unwrap_or("carmarket-messaging.log".into());

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Ok(file) = File::create(log_file) {
        loggers.push(WriteLogger::new(level, simplelog::Config::default(), file));
    }

    // second call in one process is a no-op
    let _ = CombinedLogger::init(loggers);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.typing_window, Duration::from_secs(3));
        assert!(config.preview_chars > 0);
        assert!(config.conversation_cache_capacity > 0);
        assert!(config.message_cache_capacity > 0);
    }
}
