use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{CarnyxError, Result};
use crate::record::{CollectionId, ItemId, ItemRecord, RemoteId};
use crate::title::transliterate;

/// Metadata as the remote catalog reports it, before any normalization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteEntry {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn resolve_item(&self, id: &ItemId) -> Result<RemoteEntry>;
    /// Entries in the collection's published order.
    async fn resolve_collection(&self, id: &CollectionId) -> Result<Vec<RemoteEntry>>;
}

pub struct CollectionResolver {
    source: Arc<dyn MetadataSource>,
}

impl CollectionResolver {
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self { source }
    }

    /// Never returns an empty success for a collection the source failed to
    /// read: a failed lookup must not look like an empty remote.
    pub async fn resolve(&self, id: &RemoteId) -> Result<Vec<ItemRecord>> {
        match id {
            RemoteId::Item(item) => {
                let entry = self.source.resolve_item(item).await?;
                let record = Self::normalize(entry).ok_or_else(|| {
                    CarnyxError::resolution(item.to_string(), "item has no title")
                })?;
                Ok(vec![record])
            }
            RemoteId::Collection(collection) => {
                let entries = self.source.resolve_collection(collection).await?;
                let total = entries.len();
                let records: Vec<ItemRecord> =
                    entries.into_iter().filter_map(Self::normalize).collect();
                if records.len() < total {
                    tracing::warn!(
                        collection = %collection,
                        skipped = total - records.len(),
                        "skipping unavailable collection entries"
                    );
                }
                tracing::info!(collection = %collection, items = records.len(), "resolved collection");
                Ok(records)
            }
        }
    }

    fn normalize(entry: RemoteEntry) -> Option<ItemRecord> {
        let title = entry.title?;
        let channel = entry.channel.or(entry.uploader).unwrap_or_default();
        Some(ItemRecord {
            id: ItemId(entry.id),
            title: transliterate(&title),
            channel,
        })
    }
}
