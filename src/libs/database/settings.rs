use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::libs::constants::DEFAULT_PROFILE_NAME;
use crate::libs::error::AnyResult;
use crate::libs::settings::{AudioQuality, SettingKey, SettingRecord, Settings, Theme};
use crate::libs::storage::SETTINGS;

use super::core::DB;

impl DB {
    /// A stored setting, None if missing or if the stored value doesn't parse
    async fn get_setting<T: DeserializeOwned>(&mut self, key: SettingKey) -> AnyResult<Option<T>> {
        let record: Option<SettingRecord> = self.storage.get_as(&SETTINGS, key.as_ref()).await?;

        let Some(record) = record else {
            return Ok(None);
        };

        match serde_json::from_value(record.value) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!("Ignoring malformed setting {}: {}", key, err);
                Ok(None)
            }
        }
    }

    async fn set_setting<T: Serialize>(&mut self, key: SettingKey, value: &T) -> AnyResult<()> {
        let record = SettingRecord::new(key, serde_json::to_value(value)?);
        self.storage.put_as(&SETTINGS, &record).await
    }

    /// All settings, defaults filled in for anything not stored yet
    pub async fn get_settings(&mut self) -> AnyResult<Settings> {
        let defaults = Settings::default();

        Ok(Settings {
            theme: self
                .get_setting(SettingKey::Theme)
                .await?
                .unwrap_or(defaults.theme),
            audio_quality: self
                .get_setting(SettingKey::AudioQuality)
                .await?
                .unwrap_or(defaults.audio_quality),
            profile_name: self
                .get_setting(SettingKey::ProfileName)
                .await?
                .unwrap_or(defaults.profile_name),
        })
    }

    pub async fn set_theme(&mut self, theme: Theme) -> AnyResult<()> {
        self.set_setting(SettingKey::Theme, &theme).await
    }

    pub async fn set_audio_quality(&mut self, quality: AudioQuality) -> AnyResult<()> {
        self.set_setting(SettingKey::AudioQuality, &quality).await
    }

    /// A blank name resets the profile to the default one
    pub async fn set_profile_name(&mut self, name: &str) -> AnyResult<String> {
        let name = match name.trim() {
            "" => DEFAULT_PROFILE_NAME,
            trimmed => trimmed,
        }
        .to_owned();

        self.set_setting(SettingKey::ProfileName, &name).await?;
        Ok(name)
    }
}
