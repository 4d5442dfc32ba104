pub mod state;

pub use state::{AppSettings, DEFAULT_ENDPOINT, SettingsError, SettingsStore};
