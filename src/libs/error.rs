use anyhow::Result;
use serde::{ser::Serializer, Serialize};
use thiserror::Error;

/**
 * Create the error type that represents all errors possible in the store.
 * Expected conditions (missing records, no-op mutations) are not errors and
 * never end up here.
 */
#[derive(Debug, Error)]
pub enum ReddensError {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    ORMLite(#[from] ormlite::Error),

    #[error(transparent)]
    ORMLiteSqlx(#[from] ormlite::SqlxError),

    #[error("An error occurred while manipulating the config: {0}")]
    Config(String),

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /**
     * Custom errors
     */
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Record in collection {collection} has no usable key at \"{key_path}\"")]
    MissingKey {
        collection: &'static str,
        key_path: &'static str,
    },

    #[error("Invalid playlist file: {0}")]
    InvalidPlaylistFile(String),

    #[error("Playlist name cannot be empty")]
    InvalidPlaylistName,

    #[error("User data was modified concurrently (expected version {expected}, found {found})")]
    Conflict { expected: u64, found: u64 },
}

/**
 * Errors are forwarded as plain strings to the UI layer
 */
impl Serialize for ReddensError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}

pub type AnyResult<T, E = ReddensError> = Result<T, E>;

impl From<serde_json::Error> for ReddensError {
    fn from(error: serde_json::Error) -> Self {
        if error.is_data() || error.is_syntax() || error.is_eof() {
            ReddensError::DeserializationError(error.to_string())
        } else {
            ReddensError::SerializationError(error.to_string())
        }
    }
}

impl From<toml::ser::Error> for ReddensError {
    fn from(error: toml::ser::Error) -> Self {
        ReddensError::Config(error.to_string())
    }
}

impl From<toml::de::Error> for ReddensError {
    fn from(error: toml::de::Error) -> Self {
        ReddensError::Config(error.to_string())
    }
}
