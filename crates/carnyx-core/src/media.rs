use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::AudioFormat;
use crate::error::Result;
use crate::record::ItemId;

/// Intermediate containers the helper may leave behind before extracting audio.
const INTERMEDIATE_EXTENSIONS: &[&str] = &["webm", "m4a", "mp4", "opus", "ogg", "weba"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub id: ItemId,
    /// Destination without the audio extension.
    pub output_stem: PathBuf,
    pub format: AudioFormat,
    pub bitrate_kbps: u32,
}

impl FetchRequest {
    /// The file a successful fetch produces.
    pub fn output_path(&self) -> PathBuf {
        with_suffix(&self.output_stem, self.format.extension())
    }

    /// Every file a fetch of this request may have written, finished or not.
    pub fn partial_outputs(&self) -> Vec<PathBuf> {
        let mut paths = vec![
            self.output_path(),
            with_suffix(&self.output_stem, &format!("{}.part", self.format.extension())),
            with_suffix(&self.output_stem, "part"),
        ];
        for ext in INTERMEDIATE_EXTENSIONS {
            paths.push(with_suffix(&self.output_stem, ext));
            paths.push(with_suffix(&self.output_stem, &format!("{ext}.part")));
        }
        paths
    }
}

/// Appends `.suffix` without treating dots already in the stem as an extension.
pub(crate) fn with_suffix(stem: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = stem.as_os_str().to_owned();
    raw.push(".");
    raw.push(suffix);
    PathBuf::from(raw)
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    /// Fetch and transcode one item, returning the path of the produced file.
    async fn fetch(&self, request: &FetchRequest) -> Result<PathBuf>;
}
