use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::libs::constants::USER_DATA_KEY;
use crate::libs::error::AnyResult;
use crate::libs::storage::{LocalStore, StorageBackend, PLAY_STATS, USER_DATA};
use crate::libs::user_state::{LegacyUserData, UserState};
use crate::libs::utils::truncate_to_millis;

use super::core::DB;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// A user record was already there
    AlreadyInitialized,
    /// The legacy blob was copied into a new user record
    Migrated {
        liked_songs: usize,
        playlists: usize,
        recently_played: usize,
    },
    /// Nothing to migrate, an empty user record was created
    CreatedDefault,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResetOutcome {
    /// The user record has no reset marker, nothing is wiped this time
    Skipped,
    NotDue { next_reset: DateTime<Utc> },
    Reset { cleared: usize },
    Failed(String),
}

impl DB {
    async fn read_legacy_user_data(&self) -> Option<LegacyUserData> {
        let path = self.config.fallback_path();

        let local = match LocalStore::open(&path).await {
            Ok(local) => local,
            Err(err) => {
                warn!("Could not read legacy storage {:?}: {}", path, err);
                return None;
            }
        };

        match local.legacy_user_data() {
            Ok(blob) => blob,
            Err(err) => {
                warn!("Ignoring malformed legacy user data: {}", err);
                None
            }
        }
    }

    /**
     * Make sure the user record exists. On the primary storage, a missing
     * record is first looked for in the legacy blob, which is copied over and
     * left in place so an interrupted migration can simply run again.
     */
    pub async fn ensure_user_state(&mut self, now: DateTime<Utc>) -> AnyResult<MigrationOutcome> {
        if self.storage.get(&USER_DATA, USER_DATA_KEY).await?.is_some() {
            return Ok(MigrationOutcome::AlreadyInitialized);
        }

        let now = truncate_to_millis(now);

        let legacy = if self.storage.is_fallback() {
            // The legacy blob is the fallback's own record, already checked above
            None
        } else {
            self.read_legacy_user_data().await
        };

        let Some(legacy) = legacy else {
            self.storage
                .put_as(&USER_DATA, &UserState::new(now))
                .await?;
            info!("Created default user data");
            return Ok(MigrationOutcome::CreatedDefault);
        };

        let mut state = legacy.into_user_state(Some(now));
        state.version = 0;

        let outcome = MigrationOutcome::Migrated {
            liked_songs: state.liked_songs.len(),
            playlists: state.playlists.len(),
            recently_played: state.recently_played.len(),
        };

        self.storage.put_as(&USER_DATA, &state).await?;
        info!("Data migrated from legacy storage: {:?}", outcome);

        Ok(outcome)
    }

    /**
     * Wipe play stats if the last reset is older than the configured interval,
     * and stamp the new reset time in the same transaction.
     */
    pub async fn check_and_reset_play_stats(&mut self, now: DateTime<Utc>) -> AnyResult<ResetOutcome> {
        let mut state = self.load_user_state().await?;

        let Some(last_reset) = state.last_stats_reset else {
            info!("No stats reset marker, skipping reset");
            return Ok(ResetOutcome::Skipped);
        };

        let next_reset = last_reset + self.config.stats_reset_interval();
        if now - last_reset <= self.config.stats_reset_interval() {
            return Ok(ResetOutcome::NotDue { next_reset });
        }

        let cleared = self.storage.count(&PLAY_STATS).await?;

        state.last_stats_reset = Some(truncate_to_millis(now));
        state.version += 1;

        let record = serde_json::to_value(&state)?;
        self.storage
            .clear_and_put(&PLAY_STATS, &USER_DATA, record)
            .await?;

        info!(
            "Play stats reset ({} record(s) cleared, last reset was {})",
            cleared, last_reset
        );
        Ok(ResetOutcome::Reset { cleared })
    }
}
