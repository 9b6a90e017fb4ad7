use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lofty::config::WriteOptions;
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::Tag;
use tokio::task;

use crate::error::{CarnyxError, Result};
use crate::record::ItemRecord;

/// Metadata embedded into every produced file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSet {
    pub artist: String,
    pub title: String,
    /// Only set in collection mode, or when a single item is given an album name.
    pub album: Option<String>,
}

impl TagSet {
    pub fn for_item(item: &ItemRecord, album: Option<&str>) -> Self {
        Self {
            artist: item.channel.clone(),
            title: item.title.clone(),
            album: album.map(str::to_owned),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TagWriter: Send + Sync {
    async fn write(&self, path: &Path, tags: &TagSet) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTagWriter;

impl LoftyTagWriter {
    pub fn new() -> Self {
        Self
    }

    fn write_sync(path: &Path, tags: &TagSet) -> Result<()> {
        let failed = |reason: String| CarnyxError::TagWrite {
            path: path.to_path_buf(),
            reason,
        };

        let mut tagged_file = Probe::open(path)
            .map_err(|err| failed(err.to_string()))?
            .guess_file_type()
            .map_err(|err| failed(err.to_string()))?
            .read()
            .map_err(|err| failed(err.to_string()))?;

        let tag_type = tagged_file.primary_tag_type();
        if tagged_file.tag(tag_type).is_none() {
            tagged_file.insert_tag(Tag::new(tag_type));
        }
        let tag = tagged_file
            .tag_mut(tag_type)
            .ok_or_else(|| failed(format!("container does not support {tag_type:?} tags")))?;

        tag.set_artist(tags.artist.clone());
        tag.set_title(tags.title.clone());
        match &tags.album {
            Some(album) => tag.set_album(album.clone()),
            None => tag.remove_album(),
        }

        tag.save_to_path(path, WriteOptions::default())
            .map_err(|err| failed(err.to_string()))
    }
}

#[async_trait]
impl TagWriter for LoftyTagWriter {
    async fn write(&self, path: &Path, tags: &TagSet) -> Result<()> {
        let owned: PathBuf = path.to_path_buf();
        let tags = tags.clone();
        task::spawn_blocking(move || Self::write_sync(&owned, &tags))
            .await
            .map_err(|err| CarnyxError::TagWrite {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_test_wav(path: &Path) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
        for _ in 0..1_000 {
            writer.write_sample(0i16).expect("write left");
            writer.write_sample(0i16).expect("write right");
        }
        writer.finalize().expect("finalize wav");
    }

    fn read_back(path: &Path) -> (Option<String>, Option<String>, Option<String>) {
        let tagged = Probe::open(path)
            .expect("open")
            .guess_file_type()
            .expect("guess")
            .read()
            .expect("read");
        let tag = tagged.primary_tag().expect("primary tag");
        (
            tag.artist().map(|v| v.into_owned()),
            tag.title().map(|v| v.into_owned()),
            tag.album().map(|v| v.into_owned()),
        )
    }

    fn tags(album: Option<&str>) -> TagSet {
        TagSet::for_item(
            &ItemRecord::new("NqtcqA53l3I", "Song A", "Some Channel"),
            album,
        )
    }

    #[tokio::test]
    async fn writes_artist_title_and_album() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("Song A.wav");
        write_test_wav(&path);

        LoftyTagWriter::new()
            .write(&path, &tags(Some("Road Trip")))
            .await
            .expect("write tags");

        let (artist, title, album) = read_back(&path);
        assert_eq!(artist.as_deref(), Some("Some Channel"));
        assert_eq!(title.as_deref(), Some("Song A"));
        assert_eq!(album.as_deref(), Some("Road Trip"));
    }

    #[tokio::test]
    async fn album_is_absent_without_a_name() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("Song A.wav");
        write_test_wav(&path);

        let writer = LoftyTagWriter::new();
        writer.write(&path, &tags(Some("Old Album"))).await.expect("first write");
        writer.write(&path, &tags(None)).await.expect("second write");

        let (artist, _, album) = read_back(&path);
        assert_eq!(artist.as_deref(), Some("Some Channel"));
        assert_eq!(album, None);
    }

    #[tokio::test]
    async fn unrecognized_container_is_a_tag_write_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("Song A.mp3");
        std::fs::write(&path, b"definitely not audio").expect("write");

        let err = LoftyTagWriter::new()
            .write(&path, &tags(None))
            .await
            .unwrap_err();
        assert!(matches!(err, CarnyxError::TagWrite { .. }));
        assert!(path.exists());
    }
}
