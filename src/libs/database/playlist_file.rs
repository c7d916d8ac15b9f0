use log::info;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::libs::catalog::CatalogProvider;
use crate::libs::error::AnyResult;
use crate::libs::playlist_file::{ParsedPlaylistFile, PlaylistFile};
use crate::libs::user_state::{Playlist, PlaylistId};

use super::core::DB;

/// Result of a playlist import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "index.ts")]
pub struct ImportOutcome {
    pub playlist: Playlist,
    pub added: usize,
    pub skipped: usize,
}

impl DB {
    /**
     * Import a playlist file. The file is fully validated before anything is
     * written, songs missing from the catalog are dropped.
     */
    pub async fn import_playlist<C: CatalogProvider>(
        &mut self,
        raw: &str,
        catalog: &C,
    ) -> AnyResult<ImportOutcome> {
        let parsed = ParsedPlaylistFile::parse(raw)?;
        let (draft, skipped) = parsed.into_draft(catalog);
        let added = draft.songs.len();

        let playlist = self.create_playlist(draft).await?;

        info!(
            r#"Imported playlist "{}" ({} song(s) added, {} skipped)"#,
            playlist.name, added, skipped
        );

        Ok(ImportOutcome {
            playlist,
            added,
            skipped,
        })
    }

    /// Build the export document of a playlist, None if it doesn't exist
    pub async fn export_playlist<C: CatalogProvider>(
        &mut self,
        playlist_id: PlaylistId,
        catalog: &C,
    ) -> AnyResult<Option<PlaylistFile>> {
        let Some(playlist) = self.get_playlist(playlist_id).await? else {
            return Ok(None);
        };

        Ok(Some(PlaylistFile::from_playlist(&playlist, catalog)))
    }
}
