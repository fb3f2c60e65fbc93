mod settings;

pub use settings::{BridgeConfig, Settings, SlackConfig, load_settings};
