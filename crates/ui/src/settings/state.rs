use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use figment::{
    Figment,
    providers::{Format, Json, Serialized},
};
use gpui::*;
use gpui_component::{Theme, ThemeMode, ThemeRegistry};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use snafu::{ResultExt, Snafu};

use crate::chat::DEFAULT_REPLY_DELAY_MS;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000";
pub const SETTINGS_DIRECTORY_NAME: &str = "banter";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,
    #[serde(
        default = "default_theme_mode",
        serialize_with = "serialize_theme_mode",
        deserialize_with = "deserialize_theme_mode"
    )]
    pub theme_mode: ThemeMode,
    #[serde(default)]
    pub theme_name: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            reply_delay_ms: default_reply_delay_ms(),
            theme_mode: default_theme_mode(),
            theme_name: String::new(),
        }
    }
}

impl AppSettings {
    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    pub fn normalized(mut self) -> Self {
        self.endpoint = if self.endpoint.trim().is_empty() {
            default_endpoint()
        } else {
            self.endpoint.trim().to_string()
        };
        self.theme_name = self.theme_name.trim().to_string();
        self
    }

    /// Environment variables take precedence over the settings file, which
    /// keeps one-off runs against another service a shell-line affair.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(endpoint) = non_empty_env("BANTER_ENDPOINT") {
            self.endpoint = endpoint;
        }

        if let Some(raw_delay) = non_empty_env("BANTER_REPLY_DELAY_MS") {
            match raw_delay.parse::<u64>() {
                Ok(delay) => self.reply_delay_ms = delay,
                Err(_) => {
                    tracing::warn!(
                        raw = %raw_delay,
                        "ignoring non-numeric BANTER_REPLY_DELAY_MS"
                    );
                }
            }
        }

        self
    }

    pub fn apply_theme(&self, window: Option<&mut Window>, cx: &mut App) {
        if let Some(theme_config) = ThemeRegistry::global(cx)
            .themes()
            .get(&SharedString::from(self.theme_name.trim().to_string()))
            .cloned()
        {
            let mode = theme_config.mode;
            let theme = Theme::global_mut(cx);
            if mode.is_dark() {
                theme.dark_theme = theme_config;
            } else {
                theme.light_theme = theme_config;
            }
            Theme::change(mode, window, cx);
            return;
        }

        Theme::change(self.theme_mode, window, cx);
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_reply_delay_ms() -> u64 {
    DEFAULT_REPLY_DELAY_MS
}

fn default_theme_mode() -> ThemeMode {
    ThemeMode::default()
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn serialize_theme_mode<S>(mode: &ThemeMode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let label = if mode.is_dark() { "dark" } else { "light" };
    serializer.serialize_str(label)
}

fn deserialize_theme_mode<'de, D>(deserializer: D) -> Result<ThemeMode, D::Error>
where
    D: Deserializer<'de>,
{
    let label = String::deserialize(deserializer)?;
    match label.trim().to_ascii_lowercase().as_str() {
        "dark" => Ok(ThemeMode::Dark),
        "light" => Ok(ThemeMode::Light),
        _ => Ok(default_theme_mode()),
    }
}

pub struct SettingsStore {
    settings: Arc<ArcSwap<AppSettings>>,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".banter"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(SETTINGS_FILE_NAME)
    }

    pub fn new(config_path: PathBuf) -> Self {
        let settings = Self::load_from_disk(&config_path);
        let store = Self {
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            config_path,
        };

        // Seed the file on first run so the operator has something to edit.
        if !store.config_path.exists()
            && let Err(error) = store.persist(&store.settings())
        {
            tracing::warn!("could not write default settings file: {}", error);
        }

        store
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    pub fn settings(&self) -> Arc<AppSettings> {
        self.settings.load_full()
    }

    fn load_from_disk(path: &PathBuf) -> AppSettings {
        if !path.exists() {
            tracing::info!("settings file not found at {:?}, using defaults", path);
            return AppSettings::default();
        }

        let figment =
            Figment::from(Serialized::defaults(AppSettings::default())).merge(Json::file(path));

        match figment.extract::<AppSettings>() {
            Ok(settings) => settings.normalized(),
            Err(error) => {
                tracing::warn!(
                    "failed to parse settings from {:?}: {}. using defaults",
                    path,
                    error
                );
                AppSettings::default()
            }
        }
    }

    fn persist(&self, settings: &AppSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).context(CreateDirSnafu {
                stage: "create-settings-directory",
                path: parent.to_path_buf(),
            })?;
        }

        let content = serde_json::to_string_pretty(settings).context(SerializeConfigSnafu {
            stage: "serialize-settings-json",
        })?;

        let temp_path = self.config_path.with_extension("json.tmp");
        std::fs::write(&temp_path, content).context(WriteFileSnafu {
            stage: "write-temporary-settings-file",
            path: temp_path.clone(),
        })?;

        std::fs::rename(&temp_path, &self.config_path).context(RenameTempFileSnafu {
            stage: "rename-temporary-settings-file",
            from: temp_path,
            to: self.config_path.clone(),
        })?;

        tracing::info!("saved settings to {:?}", self.config_path);
        Ok(())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("failed to create settings directory at {path:?} on `{stage}`: {source}"))]
    CreateDir {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to serialize settings on `{stage}`: {source}"))]
    SerializeConfig {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("failed to write settings file at {path:?} on `{stage}`: {source}"))]
    WriteFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to move settings file from {from:?} to {to:?} on `{stage}`: {source}"))]
    RenameTempFile {
        stage: &'static str,
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_local_service_with_one_second_pacing() {
        let settings = AppSettings::default();
        assert_eq!(settings.endpoint, "http://127.0.0.1:5000");
        assert_eq!(settings.reply_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn normalized_trims_and_backfills_the_endpoint() {
        let settings = AppSettings {
            endpoint: "   ".to_string(),
            ..AppSettings::default()
        }
        .normalized();
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);

        let settings = AppSettings {
            endpoint: "  http://10.0.0.2:8080  ".to_string(),
            ..AppSettings::default()
        }
        .normalized();
        assert_eq!(settings.endpoint, "http://10.0.0.2:8080");
    }

    #[test]
    fn partial_settings_files_fall_back_to_defaults_per_field() {
        let figment = Figment::from(Serialized::defaults(AppSettings::default()))
            .merge(Json::string(r#"{"reply_delay_ms": 250}"#));
        let settings = figment.extract::<AppSettings>().unwrap().normalized();

        assert_eq!(settings.reply_delay_ms, 250);
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);
    }
}
