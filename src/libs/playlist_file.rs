use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::libs::catalog::{CatalogProvider, SongId};
use crate::libs::constants::PLAYLIST_FILE_EXTENSION;
use crate::libs::error::{AnyResult, ReddensError};
use crate::libs::user_state::{Playlist, PlaylistDraft};
use crate::libs::utils::dedup_keep_first;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "index.ts")]
pub struct PlaylistFileSong {
    pub id: SongId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
}

/**
 * PlaylistFile
 * The shareable .rPlaylist document
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "index.ts")]
pub struct PlaylistFile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub songs: Vec<PlaylistFileSong>,
}

/// A validated import, before it is matched against the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPlaylistFile {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    /// Ids in file order, duplicates included
    pub song_ids: Vec<SongId>,
    /// Entries that carried no usable id
    pub unreadable_entries: usize,
}

fn optional_string(document: &Value, field: &str) -> Option<String> {
    document
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_owned)
}

fn entry_song_id(entry: &Value) -> Option<SongId> {
    // Older exports wrote bare ids instead of objects
    let id = match entry {
        Value::Object(song) => song.get("id")?,
        other => other,
    };
    id.as_u64().and_then(|id| SongId::try_from(id).ok())
}

impl ParsedPlaylistFile {
    /// Validate the raw JSON. Nothing is written anywhere at this point.
    pub fn parse(raw: &str) -> AnyResult<Self> {
        let document: Value = serde_json::from_str(raw)
            .map_err(|err| ReddensError::InvalidPlaylistFile(err.to_string()))?;

        if !document.is_object() {
            return Err(ReddensError::InvalidPlaylistFile(
                "expected a JSON object".into(),
            ));
        }

        let name = match document.get("name").and_then(Value::as_str) {
            Some(name) if !name.trim().is_empty() => name.trim().to_owned(),
            _ => {
                return Err(ReddensError::InvalidPlaylistFile(
                    "missing playlist name".into(),
                ))
            }
        };

        let Some(entries) = document.get("songs").and_then(Value::as_array) else {
            return Err(ReddensError::InvalidPlaylistFile(
                "songs must be a list".into(),
            ));
        };

        let song_ids: Vec<SongId> = entries.iter().filter_map(entry_song_id).collect();

        Ok(ParsedPlaylistFile {
            name,
            description: optional_string(&document, "description"),
            image: optional_string(&document, "image").or_else(|| optional_string(&document, "cover")),
            unreadable_entries: entries.len() - song_ids.len(),
            song_ids,
        })
    }

    /// Keep the songs the catalog knows about, returns the draft and how many entries were dropped
    pub fn into_draft<C: CatalogProvider>(self, catalog: &C) -> (PlaylistDraft, usize) {
        let total = self.song_ids.len() + self.unreadable_entries;

        let songs = dedup_keep_first(
            self.song_ids
                .into_iter()
                .filter(|id| catalog.contains_song(*id))
                .collect(),
        );
        let skipped = total - songs.len();

        let draft = PlaylistDraft {
            name: self.name,
            description: self.description,
            image: self.image,
            songs,
        };

        (draft, skipped)
    }
}

impl PlaylistFile {
    /// The stock cover is written out when the playlist has none
    pub fn from_playlist<C: CatalogProvider>(playlist: &Playlist, catalog: &C) -> Self {
        let songs = playlist
            .songs
            .iter()
            .map(|id| {
                let song = catalog.song(*id);
                PlaylistFileSong {
                    id: *id,
                    title: song.map(|s| s.title.clone()),
                    artist: song.map(|s| s.artist.clone()),
                }
            })
            .collect();

        PlaylistFile {
            name: playlist.name.clone(),
            description: playlist.description.clone(),
            image: Some(playlist.cover().to_owned()),
            songs,
        }
    }

    pub fn to_json(&self) -> AnyResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// "My Mix 2" becomes "My_Mix_2.rPlaylist"
    pub fn export_file_name(&self) -> String {
        let stem = self.name.split_whitespace().collect::<Vec<_>>().join("_");
        format!("{}.{}", stem, PLAYLIST_FILE_EXTENSION)
    }

    pub async fn write_to(&self, path: &Path) -> AnyResult<()> {
        tokio::fs::write(path, self.to_json()?).await?;
        Ok(())
    }
}
