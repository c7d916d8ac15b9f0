pub mod core;
pub mod migration;
pub mod play_stats;
pub mod playlist_file;
pub mod settings;
pub mod user_state;

pub use self::core::*;
pub use migration::{MigrationOutcome, ResetOutcome};
pub use playlist_file::ImportOutcome;
