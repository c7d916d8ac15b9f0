use log::{debug, info};

use crate::libs::catalog::{CatalogProvider, Song, SongId};
use crate::libs::constants::USER_DATA_KEY;
use crate::libs::error::{AnyResult, ReddensError};
use crate::libs::storage::{StorageBackend, USER_DATA};
use crate::libs::user_state::{Playlist, PlaylistDraft, PlaylistEdit, PlaylistId, UserState};
use crate::libs::utils::now_millis;

use super::core::DB;

impl DB {
    async fn get_stored_user_state(&mut self) -> AnyResult<Option<UserState>> {
        let state: Option<UserState> = self.storage.get_as(&USER_DATA, USER_DATA_KEY).await?;
        Ok(state.map(UserState::normalize))
    }

    /// Get the user record, creating (and persisting) an empty one if there is none yet
    pub async fn load_user_state(&mut self) -> AnyResult<UserState> {
        if let Some(state) = self.get_stored_user_state().await? {
            return Ok(state);
        }

        info!("No user data found, creating a fresh record");
        let state = UserState::new(now_millis());
        self.storage.put_as(&USER_DATA, &state).await?;

        // Hand back what was persisted, the fallback blob doesn't keep every field
        Ok(self.get_stored_user_state().await?.unwrap_or(state))
    }

    /**
     * Save the whole user record. The key is always forced to the singleton
     * key, and the save is rejected if the record changed since `state` was
     * loaded. Returns the record as stored, with its new version.
     */
    pub async fn save_user_state(&mut self, mut state: UserState) -> AnyResult<UserState> {
        let stored_version = self
            .get_stored_user_state()
            .await?
            .map(|stored| stored.version);

        if let Some(found) = stored_version {
            if found != state.version {
                return Err(ReddensError::Conflict {
                    expected: state.version,
                    found,
                });
            }
        }

        state.id = USER_DATA_KEY.to_owned();
        state.version += 1;

        let state = state.normalize();
        self.storage.put_as(&USER_DATA, &state).await?;
        Ok(state)
    }

    /// Load, apply a mutation and save if the mutation reports a change
    async fn update_user_state<T, F>(&mut self, mutate: F) -> AnyResult<T>
    where
        F: FnOnce(&mut UserState) -> AnyResult<(T, bool)>,
    {
        let mut state = self.load_user_state().await?;
        let (result, changed) = mutate(&mut state)?;

        if changed {
            self.save_user_state(state).await?;
        } else {
            debug!("User data unchanged, skipping save");
        }

        Ok(result)
    }

    /// Like or unlike a song, returns whether the song is liked afterwards
    pub async fn toggle_liked(&mut self, song_id: SongId) -> AnyResult<bool> {
        self.update_user_state(|state| Ok((state.toggle_liked(song_id), true)))
            .await
    }

    pub async fn is_liked(&mut self, song_id: SongId) -> AnyResult<bool> {
        Ok(self.load_user_state().await?.is_liked(song_id))
    }

    /// Liked songs known to the catalog, in the order they were liked
    pub async fn liked_songs<C: CatalogProvider>(&mut self, catalog: &C) -> AnyResult<Vec<Song>> {
        let state = self.load_user_state().await?;
        Ok(catalog.resolve_songs(&state.liked_songs))
    }

    pub async fn record_recently_played(&mut self, song_id: SongId) -> AnyResult<()> {
        self.update_user_state(|state| {
            state.record_recently_played(song_id);
            Ok(((), true))
        })
        .await
    }

    /// Recently played songs known to the catalog, most recent first
    pub async fn recently_played_songs<C: CatalogProvider>(
        &mut self,
        catalog: &C,
    ) -> AnyResult<Vec<Song>> {
        let state = self.load_user_state().await?;
        Ok(catalog.resolve_songs(&state.recently_played))
    }

    /// Get all the playlists, in creation order
    pub async fn get_all_playlists(&mut self) -> AnyResult<Vec<Playlist>> {
        Ok(self.load_user_state().await?.playlists)
    }

    /// Get a single playlist by ID
    pub async fn get_playlist(&mut self, playlist_id: PlaylistId) -> AnyResult<Option<Playlist>> {
        Ok(self.load_user_state().await?.playlist(playlist_id).cloned())
    }

    /// Create a playlist given a name and optional details
    pub async fn create_playlist(&mut self, draft: PlaylistDraft) -> AnyResult<Playlist> {
        let playlist = self
            .update_user_state(|state| Ok((state.create_playlist(draft, now_millis())?, true)))
            .await?;

        info!(r#"Created playlist "{}" ({})"#, playlist.name, playlist.id);
        Ok(playlist)
    }

    /// Returns false when the playlist doesn't exist or already has the song
    pub async fn add_song_to_playlist(
        &mut self,
        playlist_id: PlaylistId,
        song_id: SongId,
    ) -> AnyResult<bool> {
        self.update_user_state(|state| {
            let added = state.add_song_to_playlist(playlist_id, song_id);
            Ok((added, added))
        })
        .await
    }

    pub async fn remove_song_from_playlist(
        &mut self,
        playlist_id: PlaylistId,
        song_id: SongId,
    ) -> AnyResult<bool> {
        self.update_user_state(|state| {
            let removed = state.remove_song_from_playlist(playlist_id, song_id);
            Ok((removed, removed))
        })
        .await
    }

    /// Update a playlist name by ID
    pub async fn rename_playlist(&mut self, playlist_id: PlaylistId, name: &str) -> AnyResult<bool> {
        self.update_user_state(|state| {
            let renamed = state.rename_playlist(playlist_id, name)?;
            Ok((renamed, renamed))
        })
        .await
    }

    pub async fn edit_playlist(
        &mut self,
        playlist_id: PlaylistId,
        edit: PlaylistEdit,
    ) -> AnyResult<bool> {
        self.update_user_state(|state| {
            let edited = state.edit_playlist(playlist_id, edit)?;
            Ok((edited, edited))
        })
        .await
    }

    /// Delete a playlist by ID, deleting an unknown playlist is not an error
    pub async fn delete_playlist(&mut self, playlist_id: PlaylistId) -> AnyResult<bool> {
        self.update_user_state(|state| {
            let deleted = state.delete_playlist(playlist_id);
            Ok((deleted, deleted))
        })
        .await
    }

    pub async fn count_user_records(&mut self) -> AnyResult<usize> {
        self.storage.count(&USER_DATA).await
    }
}
