use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};
use ts_rs::TS;

use crate::libs::constants::DEFAULT_PROFILE_NAME;

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, TS,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[ts(export, export_to = "index.ts")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, TS,
)]
#[ts(export, export_to = "index.ts")]
pub enum AudioQuality {
    Low,
    Medium,
    #[default]
    High,
}

/**
 * Keys of the settings collection
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
pub enum SettingKey {
    #[strum(serialize = "theme")]
    Theme,
    #[strum(serialize = "audioQuality")]
    AudioQuality,
    #[strum(serialize = "profileName")]
    ProfileName,
}

/**
 * One row of the settings collection, `{ key, value }`
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingRecord {
    pub key: String,
    pub value: Value,
}

impl SettingRecord {
    pub fn new(key: SettingKey, value: Value) -> Self {
        SettingRecord {
            key: key.to_string(),
            value,
        }
    }
}

/**
 * Everything the settings screen shows, with defaults filled in
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "index.ts")]
pub struct Settings {
    pub theme: Theme,
    pub audio_quality: AudioQuality,
    pub profile_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            theme: Theme::default(),
            audio_quality: AudioQuality::default(),
            profile_name: DEFAULT_PROFILE_NAME.to_owned(),
        }
    }
}
