use std::cmp::Ordering;

use serde_json::Value;
use strum::{Display, IntoStaticStr};

use crate::libs::error::{AnyResult, ReddensError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub enum CollectionName {
    #[strum(serialize = "userData")]
    UserData,
    #[strum(serialize = "playStats")]
    PlayStats,
    #[strum(serialize = "settings")]
    Settings,
}

/// A secondary index over one field of the stored records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: &'static str,
    pub key_path: &'static str,
}

/**
 * Declaration of a record collection: where it lives, which field is its
 * primary key and which fields can be used for ordered lookups.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSchema {
    pub name: CollectionName,
    pub table: &'static str,
    pub key_path: &'static str,
    pub indices: &'static [IndexSpec],
}

pub const USER_DATA: CollectionSchema = CollectionSchema {
    name: CollectionName::UserData,
    table: "user_data",
    key_path: "id",
    indices: &[],
};

pub const PLAY_STATS: CollectionSchema = CollectionSchema {
    name: CollectionName::PlayStats,
    table: "play_stats",
    key_path: "songId",
    indices: &[
        IndexSpec {
            name: "playCount",
            key_path: "playCount",
        },
        IndexSpec {
            name: "lastPlayed",
            key_path: "lastPlayed",
        },
    ],
};

pub const SETTINGS: CollectionSchema = CollectionSchema {
    name: CollectionName::Settings,
    table: "settings",
    key_path: "key",
    indices: &[],
};

pub const ALL_COLLECTIONS: [&CollectionSchema; 3] = [&USER_DATA, &PLAY_STATS, &SETTINGS];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub key_path: &'static str,
    pub direction: SortDirection,
}

/// playCount desc, then lastPlayed desc, then songId asc
pub const MOST_PLAYED_ORDER: &[OrderBy] = &[
    OrderBy {
        key_path: "playCount",
        direction: SortDirection::Desc,
    },
    OrderBy {
        key_path: "lastPlayed",
        direction: SortDirection::Desc,
    },
    OrderBy {
        key_path: "songId",
        direction: SortDirection::Asc,
    },
];

pub const RECENTLY_PLAYED_ORDER: &[OrderBy] = &[
    OrderBy {
        key_path: "lastPlayed",
        direction: SortDirection::Desc,
    },
    OrderBy {
        key_path: "songId",
        direction: SortDirection::Asc,
    },
];

impl CollectionSchema {
    /// Extract the primary key of a record as stored in the key column
    pub fn key_of(&self, record: &Value) -> AnyResult<String> {
        match record.get(self.key_path) {
            Some(Value::String(key)) if !key.is_empty() => Ok(key.clone()),
            Some(Value::Number(key)) => Ok(key.to_string()),
            _ => Err(ReddensError::MissingKey {
                collection: self.name.into(),
                key_path: self.key_path,
            }),
        }
    }
}

/// SQLite's cross-type order: NULL, then numbers, then text
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) | Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(_) => 3,
    }
}

fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/**
 * Compare two records field by field the way an `ORDER BY json_extract(...)`
 * over `order` would, for backends that sort in memory.
 */
pub fn compare_records(order: &[OrderBy], a: &Value, b: &Value) -> Ordering {
    order
        .iter()
        .map(|o| {
            let ordering = compare_field(a.get(o.key_path), b.get(o.key_path));
            match o.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        })
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}
