pub mod catalog;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod play_stats;
pub mod playlist_file;
pub mod settings;
pub mod storage;
pub mod user_state;
pub mod utils;
