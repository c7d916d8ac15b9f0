// Storage-related constants

/// Key of the one and only user data record
pub const USER_DATA_KEY: &str = "user";

/// localStorage-style key of the legacy single-blob user data
pub const LEGACY_USER_DATA_KEY: &str = "reddensUserData";

pub const DATABASE_FILE_NAME: &str = "reddens.db";
pub const FALLBACK_FILE_NAME: &str = "local_storage.json";

pub const RECENTLY_PLAYED_LIMIT: usize = 20;

/// 7 days, 604 800 000 ms
pub const STATS_RESET_INTERVAL_DAYS: u32 = 7;

pub const PLAYLIST_FILE_EXTENSION: &str = "rPlaylist";

pub const DEFAULT_PLAYLIST_COVER: &str = "https://images.unsplash.com/photo-1494232410401-ad00d5433cfa?ixlib=rb-4.0.3&ixid=M3wxMjA3fDB8MHxzZWFyY2h8Mnx8cmVkJTIwbXVzaWN8ZW58MHx8MHx8fDA%3D&w=1000&q=80";

pub const DEFAULT_PROFILE_NAME: &str = "User123";
