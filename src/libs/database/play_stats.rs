use log::debug;

use crate::libs::catalog::{CatalogProvider, Song, SongId};
use crate::libs::error::AnyResult;
use crate::libs::play_stats::PlayStatsRecord;
use crate::libs::storage::{StorageBackend, MOST_PLAYED_ORDER, PLAY_STATS, RECENTLY_PLAYED_ORDER};
use crate::libs::utils::{now_millis, TimeLogger};

use super::core::DB;

impl DB {
    /// Play stats of a song, a zeroed record if it was never played
    pub async fn get_play_stats(&mut self, song_id: SongId) -> AnyResult<PlayStatsRecord> {
        let record: Option<PlayStatsRecord> = self
            .storage
            .get_as(&PLAY_STATS, &song_id.to_string())
            .await?;
        Ok(record.unwrap_or_else(|| PlayStatsRecord::empty(song_id)))
    }

    /// Count one more play for the song, returns the stats as stored afterwards
    /// (a zeroed record when the storage keeps no stats)
    pub async fn record_play(&mut self, song_id: SongId) -> AnyResult<PlayStatsRecord> {
        let mut record = self.get_play_stats(song_id).await?;
        record.record_play(now_millis());
        self.storage.put_as(&PLAY_STATS, &record).await?;

        let stored = self.get_play_stats(song_id).await?;
        debug!("Song {} played {} time(s)", song_id, stored.play_count);
        Ok(stored)
    }

    /// A song started playing: bump its stats and move it to the top of recently played
    pub async fn record_playback(&mut self, song_id: SongId) -> AnyResult<PlayStatsRecord> {
        let record = self.record_play(song_id).await?;
        self.record_recently_played(song_id).await?;
        Ok(record)
    }

    /// Song ids by descending play count, most recent play first among equal counts
    pub async fn most_played(&mut self, limit: usize) -> AnyResult<Vec<SongId>> {
        let records: Vec<PlayStatsRecord> = self
            .storage
            .get_all_ordered_as(&PLAY_STATS, MOST_PLAYED_ORDER, Some(limit))
            .await?;
        Ok(records.into_iter().map(|record| record.song_id).collect())
    }

    /// Same as `most_played`, resolved against the catalog. Stats of songs the
    /// catalog no longer has are skipped without eating into `limit`.
    pub async fn most_played_songs<C: CatalogProvider>(
        &mut self,
        catalog: &C,
        limit: usize,
    ) -> AnyResult<Vec<Song>> {
        let timer = TimeLogger::new("Retrieved most played songs".into());
        let records: Vec<PlayStatsRecord> = self
            .storage
            .get_all_ordered_as(&PLAY_STATS, MOST_PLAYED_ORDER, None)
            .await?;

        let songs = records
            .iter()
            .filter_map(|record| catalog.song(record.song_id))
            .take(limit)
            .cloned()
            .collect();

        timer.complete();
        Ok(songs)
    }

    /// Stats ordered by last play, most recent first
    pub async fn recently_played_stats(&mut self, limit: usize) -> AnyResult<Vec<PlayStatsRecord>> {
        self.storage
            .get_all_ordered_as(&PLAY_STATS, RECENTLY_PLAYED_ORDER, Some(limit))
            .await
    }

    pub async fn get_all_play_stats(&mut self) -> AnyResult<Vec<PlayStatsRecord>> {
        self.storage.get_all_as(&PLAY_STATS).await
    }

    pub async fn count_play_stats(&mut self) -> AnyResult<usize> {
        self.storage.count(&PLAY_STATS).await
    }

    /// Wipe all play stats. Only meant for the periodic reset.
    pub async fn clear_play_stats(&mut self) -> AnyResult<()> {
        self.storage.clear(&PLAY_STATS).await
    }
}
