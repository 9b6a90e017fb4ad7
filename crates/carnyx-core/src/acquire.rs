use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::time;

use crate::config::SyncConfig;
use crate::error::{CarnyxError, Result};
use crate::filesystem::MirrorFilesystem;
use crate::media::{AudioFetcher, FetchRequest};
use crate::path::destination_path;
use crate::record::ItemRecord;
use crate::tag::{TagSet, TagWriter};

/// Fetch, transcode and tag a single item into a destination directory.
pub struct AcquisitionPipeline {
    fetcher: Arc<dyn AudioFetcher>,
    tagger: Arc<dyn TagWriter>,
    fs: Arc<dyn MirrorFilesystem>,
    config: Arc<SyncConfig>,
}

impl AcquisitionPipeline {
    pub fn new(
        fetcher: Arc<dyn AudioFetcher>,
        tagger: Arc<dyn TagWriter>,
        fs: Arc<dyn MirrorFilesystem>,
        config: Arc<SyncConfig>,
    ) -> Self {
        Self {
            fetcher,
            tagger,
            fs,
            config,
        }
    }

    /// Where `item` would be written inside `dir`.
    pub fn plan_path(&self, item: &ItemRecord, dir: &Path) -> Result<PathBuf> {
        destination_path(dir, &item.title, self.config.extension())
    }

    /// Produces the tagged file for `item` and returns its path.
    ///
    /// A `TagWrite` error still leaves the fetched file in place. Any other
    /// failure removes whatever partial output the fetch left behind, unless
    /// the destination file existed before this call.
    pub async fn acquire(
        &self,
        item: &ItemRecord,
        dir: &Path,
        album: Option<&str>,
    ) -> Result<PathBuf> {
        let path = self.plan_path(item, dir)?;
        let request = FetchRequest {
            id: item.id.clone(),
            output_stem: path.with_extension(""),
            format: self.config.audio_format,
            bitrate_kbps: self.config.bitrate_kbps,
        };
        let preexisting = self.fs.exists(&path).await.unwrap_or(true);

        tracing::info!(id = %item.id, title = %item.title, "acquiring");
        let fetched = match time::timeout(self.config.item_timeout(), self.fetcher.fetch(&request)).await {
            Ok(result) => result,
            Err(_) => Err(CarnyxError::Timeout {
                id: item.id.to_string(),
                elapsed: self.config.item_timeout(),
            }),
        };
        let produced = match fetched {
            Ok(produced) => produced,
            Err(err) => {
                if self.config.cleanup_partial {
                    self.remove_partials(&request, preexisting).await;
                }
                return Err(err);
            }
        };

        let tags = TagSet::for_item(item, album);
        self.tagger
            .write(&produced, &tags)
            .await
            .map_err(|err| match err {
                CarnyxError::TagWrite { .. } => err,
                other => CarnyxError::TagWrite {
                    path: produced.clone(),
                    reason: other.to_string(),
                },
            })?;

        tracing::info!(path = %produced.display(), "acquired");
        Ok(produced)
    }

    async fn remove_partials(&self, request: &FetchRequest, keep_output: bool) {
        let output = request.output_path();
        for candidate in request.partial_outputs() {
            if keep_output && candidate == output {
                continue;
            }
            match self.fs.remove_file(&candidate).await {
                Ok(()) => tracing::debug!(path = %candidate.display(), "removed partial output"),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    tracing::warn!(path = %candidate.display(), error = %err, "could not remove partial output")
                }
            }
        }
    }
}
