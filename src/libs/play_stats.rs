use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::libs::catalog::SongId;

/**
 * PlayStatsRecord
 * How many times a song was played since the last stats reset, and when.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "index.ts")]
pub struct PlayStatsRecord {
    pub song_id: SongId,
    #[serde(default)]
    pub play_count: u32,
    /// Stored as epoch milliseconds so the lastPlayed index sorts numerically
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    #[ts(type = "number | null")]
    pub last_played: Option<DateTime<Utc>>,
}

impl PlayStatsRecord {
    /// What a never-played song looks like
    pub fn empty(song_id: SongId) -> Self {
        PlayStatsRecord {
            song_id,
            play_count: 0,
            last_played: None,
        }
    }

    pub fn record_play(&mut self, now: DateTime<Utc>) {
        self.play_count = self.play_count.saturating_add(1);
        self.last_played = Some(now);
    }
}
