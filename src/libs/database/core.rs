use chrono::Utc;
use log::{error, info};
use tokio::sync::{Mutex, MutexGuard};

use crate::libs::config::Config;
use crate::libs::error::AnyResult;
use crate::libs::storage::{BackendKind, Storage, StorageBackend};
use crate::libs::utils::TimeLogger;

use super::migration::{MigrationOutcome, ResetOutcome};

/// Core database struct that holds the selected storage backend
pub struct DB {
    pub storage: Storage,
    pub config: Config,
}

impl DB {
    pub fn backend_kind(&self) -> BackendKind {
        self.storage.kind()
    }
}

/// Database state wrapper, every user action goes through its lock so that
/// read-modify-write cycles on the user record never interleave
pub struct DBState(Mutex<DB>);

impl DBState {
    pub fn new(db: DB) -> Self {
        DBState(Mutex::new(db))
    }

    /// Get a lock on the database
    pub async fn get_lock(&self) -> MutexGuard<'_, DB> {
        self.0.lock().await
    }
}

/// What happened while the store was starting up
#[derive(Debug, Clone, PartialEq)]
pub struct StartupReport {
    pub backend: BackendKind,
    pub migration: MigrationOutcome,
    pub reset: ResetOutcome,
}

/// Open the storage, SQLite first and the fallback file otherwise
pub async fn setup(config: Config) -> AnyResult<DB> {
    let storage = Storage::open(&config).await?;
    info!("Storage ready ({})", storage.kind());
    Ok(DB { storage, config })
}

/**
 * Full startup sequence: open storage, make sure the user record exists
 * (migrating legacy data if needed), then run the periodic stats reset.
 * A failing reset only costs the reset, the store is still handed over.
 */
pub async fn init(config: Config) -> AnyResult<(DBState, StartupReport)> {
    let timer = TimeLogger::new("Initialized store".into());
    let mut db = setup(config).await?;

    let now = Utc::now();
    let migration = db.ensure_user_state(now).await?;

    let reset = match db.check_and_reset_play_stats(now).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!("Failed to check play stats reset: {}", err);
            ResetOutcome::Failed(err.to_string())
        }
    };

    let report = StartupReport {
        backend: db.backend_kind(),
        migration,
        reset,
    };
    info!("Startup report: {:?}", report);
    timer.complete();

    Ok((DBState::new(db), report))
}
