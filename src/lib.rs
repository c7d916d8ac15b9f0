/*!
 * Persistent user state for the Reddens web player: liked songs, playlists,
 * recently played, play statistics and settings. Records live in SQLite and
 * degrade to a single JSON key-value file when the database can't be opened.
 */
pub mod libs;

pub use libs::catalog::{CatalogProvider, Song, SongId, StaticCatalog};
pub use libs::config::Config;
pub use libs::database::{init, setup, DBState, ImportOutcome, MigrationOutcome, ResetOutcome, StartupReport, DB};
pub use libs::error::{AnyResult, ReddensError};
pub use libs::storage::BackendKind;
