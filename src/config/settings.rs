use crate::error::{Result, SlackFeedError};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    pub slack: SlackConfig,
    pub bridge: BridgeConfig,
}

#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub bot_token: String,
    pub app_token: String,
}

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Directory that downloaded attachments are written to
    pub public_dir: PathBuf,
    pub reconnect_interval_secs: u64,
    pub event_buffer: usize,
    /// Only forward messages from this channel (name, `#` optional)
    pub channel_filter: Option<String>,
    pub download_files: bool,
}

impl BridgeConfig {
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_secs(self.reconnect_interval_secs)
    }
}

pub fn load_settings() -> Result<Settings> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    Settings::from_lookup(|key| std::env::var(key).ok())
}

impl Settings {
    /// Build settings from an arbitrary key lookup (the process environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| SlackFeedError::Config(format!("{} not set", key)))
        };

        let slack = SlackConfig {
            bot_token: required("SLACK_BOT_TOKEN")?,
            app_token: required("SLACK_APP_TOKEN")?,
        };

        let bridge = BridgeConfig {
            public_dir: lookup("SLACK_PUBLIC_DIR")
                .unwrap_or_else(|| "./public".to_string())
                .into(),
            reconnect_interval_secs: parse_or(&lookup, "SLACK_RECONNECT_INTERVAL_SECS", 1800)?,
            event_buffer: parse_or(&lookup, "SLACK_EVENT_BUFFER", 256)?,
            channel_filter: lookup("SLACK_CHANNEL").filter(|c| !c.trim().is_empty()),
            download_files: parse_or(&lookup, "SLACK_DOWNLOAD_FILES", true)?,
        };

        if bridge.reconnect_interval_secs == 0 {
            return Err(SlackFeedError::Config(
                "SLACK_RECONNECT_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }
        if bridge.event_buffer == 0 {
            return Err(SlackFeedError::Config(
                "SLACK_EVENT_BUFFER must be greater than zero".to_string(),
            ));
        }

        Ok(Settings { slack, bridge })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| SlackFeedError::Config(format!("Invalid {}", key))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("SLACK_BOT_TOKEN", "xoxb-test"),
            ("SLACK_APP_TOKEN", "xapp-test"),
        ]))
        .unwrap();

        assert_eq!(settings.slack.bot_token, "xoxb-test");
        assert_eq!(settings.bridge.public_dir, PathBuf::from("./public"));
        assert_eq!(settings.bridge.reconnect_interval(), Duration::from_secs(1800));
        assert_eq!(settings.bridge.event_buffer, 256);
        assert!(settings.bridge.channel_filter.is_none());
        assert!(settings.bridge.download_files);
    }

    #[test]
    fn test_missing_token_is_config_error() {
        let err = Settings::from_lookup(lookup_from(&[("SLACK_BOT_TOKEN", "xoxb-test")]))
            .unwrap_err();
        assert!(matches!(err, SlackFeedError::Config(msg) if msg.contains("SLACK_APP_TOKEN")));
    }

    #[test]
    fn test_overrides_parsed() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("SLACK_BOT_TOKEN", "xoxb-test"),
            ("SLACK_APP_TOKEN", "xapp-test"),
            ("SLACK_PUBLIC_DIR", "/srv/dashboard/public"),
            ("SLACK_RECONNECT_INTERVAL_SECS", "60"),
            ("SLACK_CHANNEL", "#general"),
            ("SLACK_DOWNLOAD_FILES", "false"),
        ]))
        .unwrap();

        assert_eq!(
            settings.bridge.public_dir,
            PathBuf::from("/srv/dashboard/public")
        );
        assert_eq!(settings.bridge.reconnect_interval_secs, 60);
        assert_eq!(settings.bridge.channel_filter.as_deref(), Some("#general"));
        assert!(!settings.bridge.download_files);
    }

    #[test]
    fn test_invalid_number_rejected() {
        let err = Settings::from_lookup(lookup_from(&[
            ("SLACK_BOT_TOKEN", "xoxb-test"),
            ("SLACK_APP_TOKEN", "xapp-test"),
            ("SLACK_EVENT_BUFFER", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SlackFeedError::Config(_)));

        let err = Settings::from_lookup(lookup_from(&[
            ("SLACK_BOT_TOKEN", "xoxb-test"),
            ("SLACK_APP_TOKEN", "xapp-test"),
            ("SLACK_RECONNECT_INTERVAL_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SlackFeedError::Config(_)));
    }
}
