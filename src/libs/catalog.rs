use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::libs::error::AnyResult;

pub type SongId = u32;

/**
 * Song
 * A catalog entry. The catalog is static data shipped with the player, the
 * store only ever references songs by id.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "index.ts")]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub mp3: String,
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "index.ts")]
pub struct Album {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub songs: Vec<SongId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "index.ts")]
pub struct Artist {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub songs: Vec<SongId>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct CatalogData {
    songs: Vec<Song>,
    albums: Vec<Album>,
    artists: Vec<Artist>,
}

/**
 * Read-only view of the song catalog
 */
pub trait CatalogProvider {
    fn song(&self, id: SongId) -> Option<&Song>;

    fn contains_song(&self, id: SongId) -> bool {
        self.song(id).is_some()
    }

    /// Resolve ids to songs, silently dropping the ones the catalog doesn't know
    fn resolve_songs(&self, ids: &[SongId]) -> Vec<Song> {
        ids.iter().filter_map(|id| self.song(*id)).cloned().collect()
    }
}

/**
 * In-memory catalog, usually loaded from the bundled JSON data
 */
#[derive(Debug, Default, Clone)]
pub struct StaticCatalog {
    songs: HashMap<SongId, Song>,
    albums: Vec<Album>,
    artists: Vec<Artist>,
}

impl StaticCatalog {
    pub fn new(songs: Vec<Song>) -> Self {
        StaticCatalog {
            songs: songs.into_iter().map(|song| (song.id, song)).collect(),
            albums: Vec::new(),
            artists: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> AnyResult<Self> {
        let data: CatalogData = serde_json::from_str(json)?;
        let mut catalog = StaticCatalog::new(data.songs);
        catalog.albums = data.albums;
        catalog.artists = data.artists;
        Ok(catalog)
    }

    pub async fn from_file(path: &Path) -> AnyResult<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        StaticCatalog::from_json(&json)
    }

    pub fn song_count(&self) -> usize {
        self.songs.len()
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    pub fn artists(&self) -> &[Artist] {
        &self.artists
    }
}

impl CatalogProvider for StaticCatalog {
    fn song(&self, id: SongId) -> Option<&Song> {
        self.songs.get(&id)
    }
}
