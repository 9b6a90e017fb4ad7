use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CarnyxError, Result};

pub const ITEM_ID_LEN: usize = 11;
pub const COLLECTION_ID_LEN: usize = 34;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd)]
pub struct ItemId(pub String);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd)]
pub struct CollectionId(pub String);

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A remote identifier, classified by its shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteId {
    Item(ItemId),
    Collection(CollectionId),
}

impl RemoteId {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.chars().count() {
            ITEM_ID_LEN => Ok(RemoteId::Item(ItemId(raw.to_owned()))),
            COLLECTION_ID_LEN => Ok(RemoteId::Collection(CollectionId(raw.to_owned()))),
            len => Err(CarnyxError::Usage(format!(
                "identifier {raw:?} has length {len}, expected {ITEM_ID_LEN} (item) or {COLLECTION_ID_LEN} (collection)"
            ))),
        }
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteId::Item(id) => id.fmt(f),
            RemoteId::Collection(id) => id.fmt(f),
        }
    }
}

/// Identity of one remote media item. Titles are already transliterated
/// when a record leaves the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,
    pub title: String,
    pub channel: String,
}

impl ItemRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            id: ItemId(id.into()),
            title: title.into(),
            channel: channel.into(),
        }
    }

    /// Join key against the local mirror: the file stem this item is stored under.
    pub fn key(&self) -> String {
        crate::path::sanitize_segment(&self.title)
    }
}
