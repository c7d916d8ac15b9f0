use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::libs::catalog::SongId;
use crate::libs::constants::{DEFAULT_PLAYLIST_COVER, RECENTLY_PLAYED_LIMIT, USER_DATA_KEY};
use crate::libs::error::{AnyResult, ReddensError};
use crate::libs::utils::dedup_keep_first;

pub type PlaylistId = i64;

fn default_user_key() -> String {
    USER_DATA_KEY.to_owned()
}

/**
 * Playlist
 * A user-created playlist. Playlists only exist inside the user state and are
 * referenced elsewhere by id.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "index.ts")]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Cover art, URL or data URI. Older records call it "cover".
    #[serde(default, alias = "cover")]
    pub image: Option<String>,
    #[serde(default)]
    pub songs: Vec<SongId>,
}

impl Playlist {
    pub fn contains(&self, song_id: SongId) -> bool {
        self.songs.contains(&song_id)
    }

    /// Cover to display, the stock one when the playlist has none
    pub fn cover(&self) -> &str {
        self.image.as_deref().unwrap_or(DEFAULT_PLAYLIST_COVER)
    }
}

/**
 * What the UI provides when creating a playlist
 */
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "index.ts")]
pub struct PlaylistDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub songs: Vec<SongId>,
}

impl PlaylistDraft {
    pub fn named(name: impl Into<String>) -> Self {
        PlaylistDraft {
            name: name.into(),
            ..PlaylistDraft::default()
        }
    }
}

/**
 * Partial update of a playlist, None fields are left untouched
 */
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "index.ts")]
pub struct PlaylistEdit {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

/**
 * UserState
 * The singleton record holding everything the user changes: likes, playlists,
 * recently played songs and the last time play stats were wiped.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "index.ts")]
pub struct UserState {
    #[serde(default = "default_user_key")]
    pub id: String,
    #[serde(default)]
    pub liked_songs: Vec<SongId>,
    #[serde(default)]
    pub playlists: Vec<Playlist>,
    /// Most recent first
    #[serde(default)]
    pub recently_played: Vec<SongId>,
    #[serde(default)]
    pub last_stats_reset: Option<DateTime<Utc>>,
    /// Bumped on every save, a save carrying an older version is rejected
    #[serde(default)]
    #[ts(type = "number")]
    pub version: u64,
}

impl Default for UserState {
    fn default() -> Self {
        UserState {
            id: default_user_key(),
            liked_songs: Vec::new(),
            playlists: Vec::new(),
            recently_played: Vec::new(),
            last_stats_reset: None,
            version: 0,
        }
    }
}

impl UserState {
    /// A fresh state, as created on first launch
    pub fn new(now: DateTime<Utc>) -> Self {
        UserState {
            last_stats_reset: Some(now),
            ..UserState::default()
        }
    }

    /// Repair invariants that older or hand-edited records may break
    pub fn normalize(mut self) -> Self {
        self.id = default_user_key();
        self.liked_songs = dedup_keep_first(self.liked_songs);
        self.recently_played = dedup_keep_first(self.recently_played);
        self.recently_played.truncate(RECENTLY_PLAYED_LIMIT);
        for playlist in self.playlists.iter_mut() {
            playlist.songs = dedup_keep_first(std::mem::take(&mut playlist.songs));
        }
        self
    }

    pub fn is_liked(&self, song_id: SongId) -> bool {
        self.liked_songs.contains(&song_id)
    }

    /// Like the song if it wasn't, unlike it otherwise. Returns whether it is liked now.
    pub fn toggle_liked(&mut self, song_id: SongId) -> bool {
        match self.liked_songs.iter().position(|id| *id == song_id) {
            Some(index) => {
                self.liked_songs.remove(index);
                false
            }
            None => {
                self.liked_songs.push(song_id);
                true
            }
        }
    }

    /// Move (or insert) the song at the front of the recently played list
    pub fn record_recently_played(&mut self, song_id: SongId) {
        self.recently_played.retain(|id| *id != song_id);
        self.recently_played.insert(0, song_id);
        self.recently_played.truncate(RECENTLY_PLAYED_LIMIT);
    }

    pub fn playlist(&self, playlist_id: PlaylistId) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.id == playlist_id)
    }

    fn playlist_mut(&mut self, playlist_id: PlaylistId) -> Option<&mut Playlist> {
        self.playlists.iter_mut().find(|p| p.id == playlist_id)
    }

    /**
     * Playlist ids are millisecond timestamps, bumped past the highest existing
     * id so two playlists created within the same millisecond never collide.
     */
    pub fn next_playlist_id(&self, now: DateTime<Utc>) -> PlaylistId {
        let highest = self.playlists.iter().map(|p| p.id).max();
        match highest {
            Some(highest) if highest >= now.timestamp_millis() => highest + 1,
            _ => now.timestamp_millis(),
        }
    }

    pub fn create_playlist(
        &mut self,
        draft: PlaylistDraft,
        now: DateTime<Utc>,
    ) -> AnyResult<Playlist> {
        let name = validate_name(&draft.name)?;

        let playlist = Playlist {
            id: self.next_playlist_id(now),
            name,
            description: draft.description,
            image: draft.image,
            songs: dedup_keep_first(draft.songs),
        };

        self.playlists.push(playlist.clone());
        Ok(playlist)
    }

    /// Returns false if the playlist doesn't exist or already has the song
    pub fn add_song_to_playlist(&mut self, playlist_id: PlaylistId, song_id: SongId) -> bool {
        match self.playlist_mut(playlist_id) {
            Some(playlist) if !playlist.contains(song_id) => {
                playlist.songs.push(song_id);
                true
            }
            _ => false,
        }
    }

    pub fn remove_song_from_playlist(&mut self, playlist_id: PlaylistId, song_id: SongId) -> bool {
        let Some(playlist) = self.playlist_mut(playlist_id) else {
            return false;
        };

        let before = playlist.songs.len();
        playlist.songs.retain(|id| *id != song_id);
        playlist.songs.len() != before
    }

    pub fn rename_playlist(&mut self, playlist_id: PlaylistId, name: &str) -> AnyResult<bool> {
        self.edit_playlist(
            playlist_id,
            PlaylistEdit {
                name: Some(name.to_owned()),
                ..PlaylistEdit::default()
            },
        )
    }

    pub fn edit_playlist(&mut self, playlist_id: PlaylistId, edit: PlaylistEdit) -> AnyResult<bool> {
        let name = edit.name.as_deref().map(validate_name).transpose()?;

        let Some(playlist) = self.playlist_mut(playlist_id) else {
            return Ok(false);
        };

        let mut changed = false;
        if let Some(name) = name {
            changed |= playlist.name != name;
            playlist.name = name;
        }
        if let Some(description) = edit.description {
            changed |= playlist.description.as_ref() != Some(&description);
            playlist.description = Some(description);
        }
        if let Some(image) = edit.image {
            changed |= playlist.image.as_ref() != Some(&image);
            playlist.image = Some(image);
        }

        Ok(changed)
    }

    pub fn delete_playlist(&mut self, playlist_id: PlaylistId) -> bool {
        let before = self.playlists.len();
        self.playlists.retain(|p| p.id != playlist_id);
        self.playlists.len() != before
    }
}

fn validate_name(name: &str) -> AnyResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ReddensError::InvalidPlaylistName);
    }
    Ok(name.to_owned())
}

/**
 * Shape of the single blob kept by the fallback store. It only carries the
 * user-facing lists, play stats and the reset marker never live there.
 */
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyUserData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub liked_songs: Vec<SongId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub playlists: Vec<Playlist>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recently_played: Vec<SongId>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub version: u64,
}

/// Older writers stored `null` for lists they never filled
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl LegacyUserData {
    /// Build a full user state out of the blob, the reset marker is the caller's call
    pub fn into_user_state(self, last_stats_reset: Option<DateTime<Utc>>) -> UserState {
        UserState {
            id: default_user_key(),
            liked_songs: self.liked_songs,
            playlists: self.playlists,
            recently_played: self.recently_played,
            last_stats_reset,
            version: self.version,
        }
        .normalize()
    }
}

impl From<UserState> for LegacyUserData {
    fn from(state: UserState) -> Self {
        LegacyUserData {
            liked_songs: state.liked_songs,
            playlists: state.playlists,
            recently_played: state.recently_played,
            version: state.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn toggling_twice_restores_membership() {
        let mut state = UserState::default();
        state.liked_songs = vec![3];

        assert!(state.toggle_liked(5));
        assert!(!state.toggle_liked(5));
        assert_eq!(state.liked_songs, vec![3]);

        assert!(!state.toggle_liked(3));
        assert!(state.toggle_liked(3));
        assert_eq!(state.liked_songs, vec![3]);
    }

    #[test]
    fn recently_played_is_bounded_and_unique() {
        let mut state = UserState::default();
        for round in 0..3 {
            for id in 0..30u32 {
                state.record_recently_played((id * 7 + round) % 25);
            }
        }
        assert!(state.recently_played.len() <= RECENTLY_PLAYED_LIMIT);
        let unique = dedup_keep_first(state.recently_played.clone());
        assert_eq!(unique, state.recently_played);
    }

    #[test]
    fn replaying_moves_to_front_and_keeps_others_in_order() {
        let mut state = UserState::default();
        for id in [1, 2, 3, 4] {
            state.record_recently_played(id);
        }
        assert_eq!(state.recently_played, vec![4, 3, 2, 1]);

        state.record_recently_played(2);
        assert_eq!(state.recently_played, vec![2, 4, 3, 1]);
    }

    #[test]
    fn oldest_entry_falls_off_past_the_limit() {
        let mut state = UserState::default();
        for id in 1..=21 {
            state.record_recently_played(id);
        }
        assert_eq!(state.recently_played.len(), 20);
        assert_eq!(state.recently_played[0], 21);
        assert!(!state.recently_played.contains(&1));
    }

    #[test]
    fn adding_a_present_song_is_a_noop() {
        let mut state = UserState::default();
        let playlist = state
            .create_playlist(PlaylistDraft::named("Chill"), at(1_000))
            .unwrap();

        assert!(state.add_song_to_playlist(playlist.id, 7));
        assert!(!state.add_song_to_playlist(playlist.id, 7));
        assert_eq!(state.playlist(playlist.id).unwrap().songs, vec![7]);
    }

    #[test]
    fn missing_playlists_are_noops() {
        let mut state = UserState::default();
        state
            .create_playlist(PlaylistDraft::named("Mine"), at(1_000))
            .unwrap();
        let before = state.clone();

        assert!(!state.delete_playlist(42));
        assert!(!state.add_song_to_playlist(42, 1));
        assert!(!state.remove_song_from_playlist(42, 1));
        assert!(!state.rename_playlist(42, "Other").unwrap());
        assert_eq!(state, before);
    }

    #[test]
    fn playlist_ids_never_collide() {
        let mut state = UserState::default();
        let first = state
            .create_playlist(PlaylistDraft::named("a"), at(5_000))
            .unwrap();
        let second = state
            .create_playlist(PlaylistDraft::named("b"), at(5_000))
            .unwrap();
        let third = state
            .create_playlist(PlaylistDraft::named("c"), at(4_000))
            .unwrap();

        assert_eq!(first.id, 5_000);
        assert_eq!(second.id, 5_001);
        assert_eq!(third.id, 5_002);
    }

    #[test]
    fn empty_names_are_rejected() {
        let mut state = UserState::default();
        let err = state
            .create_playlist(PlaylistDraft::named("   "), at(1))
            .unwrap_err();
        assert!(matches!(err, ReddensError::InvalidPlaylistName));

        let playlist = state
            .create_playlist(PlaylistDraft::named(" Road trip "), at(1))
            .unwrap();
        assert_eq!(playlist.name, "Road trip");
        assert!(state.rename_playlist(playlist.id, "").is_err());
        assert_eq!(state.playlist(playlist.id).unwrap().name, "Road trip");
    }

    #[test]
    fn edit_only_touches_given_fields() {
        let mut state = UserState::default();
        let playlist = state
            .create_playlist(
                PlaylistDraft {
                    name: "Gym".into(),
                    description: Some("loud".into()),
                    ..PlaylistDraft::default()
                },
                at(1),
            )
            .unwrap();

        let changed = state
            .edit_playlist(
                playlist.id,
                PlaylistEdit {
                    image: Some("data:image/png;base64,AAAA".into()),
                    ..PlaylistEdit::default()
                },
            )
            .unwrap();
        assert!(changed);

        let edited = state.playlist(playlist.id).unwrap();
        assert_eq!(edited.name, "Gym");
        assert_eq!(edited.description.as_deref(), Some("loud"));
        assert_eq!(edited.image.as_deref(), Some("data:image/png;base64,AAAA"));
    }

    #[test]
    fn normalize_repairs_legacy_data() {
        let state = UserState {
            id: "someone-else".into(),
            liked_songs: vec![1, 1, 2],
            recently_played: (0..30).chain(0..5).collect(),
            playlists: vec![Playlist {
                id: 1,
                name: "dupes".into(),
                description: None,
                image: None,
                songs: vec![4, 4, 5],
            }],
            ..UserState::default()
        }
        .normalize();

        assert_eq!(state.id, "user");
        assert_eq!(state.liked_songs, vec![1, 2]);
        assert_eq!(state.recently_played, (0..20).collect::<Vec<_>>());
        assert_eq!(state.playlists[0].songs, vec![4, 5]);
    }

    #[test]
    fn playlists_without_image_use_the_stock_cover() {
        let mut playlist = Playlist {
            id: 1,
            name: "Covers".into(),
            description: None,
            image: None,
            songs: Vec::new(),
        };
        assert_eq!(playlist.cover(), DEFAULT_PLAYLIST_COVER);

        playlist.image = Some("data:image/png;base64,AAAA".into());
        assert_eq!(playlist.cover(), "data:image/png;base64,AAAA");
    }

    #[test]
    fn null_lists_in_the_legacy_blob_are_empty() {
        let blob: LegacyUserData = serde_json::from_str(
            r#"{ "likedSongs": [1, 2], "playlists": [{ "id": 5, "name": "Kept" }], "recentlyPlayed": null }"#,
        )
        .unwrap();

        assert_eq!(blob.liked_songs, vec![1, 2]);
        assert_eq!(blob.playlists[0].name, "Kept");
        assert!(blob.recently_played.is_empty());
    }

    #[test]
    fn reads_the_stored_record_shape() {
        let json = r#"{
            "id": "user",
            "likedSongs": [2, 6],
            "playlists": [{ "id": 1713000000000, "name": "Doors", "description": "", "cover": "x.png", "songs": [2] }],
            "recentlyPlayed": [6],
            "lastStatsReset": "2025-04-12T09:30:00.000Z"
        }"#;
        let state: UserState = serde_json::from_str(json).unwrap();
        assert_eq!(state.version, 0);
        assert_eq!(state.playlists[0].image.as_deref(), Some("x.png"));
        assert_eq!(
            state.last_stats_reset.unwrap(),
            Utc.with_ymd_and_hms(2025, 4, 12, 9, 30, 0).unwrap()
        );
    }
}
