use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::error::{CarnyxError, Result};
use crate::filesystem::MirrorFilesystem;

/// Titles present in a mirror directory, one per audio file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalTitles(BTreeSet<String>);

impl LocalTitles {
    pub fn contains(&self, title: &str) -> bool {
        self.0.contains(title)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for LocalTitles {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

pub struct MirrorScanner {
    fs: Arc<dyn MirrorFilesystem>,
    extension: String,
}

impl MirrorScanner {
    pub fn new(fs: Arc<dyn MirrorFilesystem>, extension: &str) -> Self {
        Self {
            fs,
            extension: format!(".{extension}"),
        }
    }

    /// Non-recursive listing of `dir`, audio extension stripped.
    ///
    /// A directory that does not exist yet is an empty mirror. Entries
    /// without the audio extension are ignored, which keeps them out of
    /// the delete set.
    pub async fn scan(&self, dir: &Path) -> Result<LocalTitles> {
        let names = match self.fs.list_files(dir).await {
            Ok(names) => names,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(dir = %dir.display(), "mirror directory missing, treating as empty");
                return Ok(LocalTitles::default());
            }
            Err(source) => {
                return Err(CarnyxError::DirectoryAccess {
                    path: dir.to_path_buf(),
                    source,
                });
            }
        };

        let mut titles = BTreeSet::new();
        for name in names {
            match name.strip_suffix(self.extension.as_str()) {
                Some(title) => {
                    titles.insert(title.to_owned());
                }
                None => tracing::debug!(file = %name, "ignoring non-audio entry"),
            }
        }
        Ok(LocalTitles(titles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::{LocalFilesystem, MockMirrorFilesystem};
    use mockall::predicate::always;
    use tempfile::tempdir;

    fn scanner_with(fs: MockMirrorFilesystem) -> MirrorScanner {
        MirrorScanner::new(Arc::new(fs), "mp3")
    }

    #[tokio::test]
    async fn strips_extension_and_ignores_other_files() {
        let mut fs = MockMirrorFilesystem::new();
        fs.expect_list_files().with(always()).returning(|_| {
            Ok(vec![
                "Song A.mp3".into(),
                "Song B.mp3".into(),
                "Song C.webm.part".into(),
                "cover.jpg".into(),
                "Loud.MP3".into(),
            ])
        });

        let titles = scanner_with(fs).scan(Path::new("/mix")).await.expect("scan");
        assert_eq!(titles, LocalTitles::from_iter(["Song A", "Song B"]));
    }

    #[tokio::test]
    async fn missing_directory_is_empty() {
        let mut fs = MockMirrorFilesystem::new();
        fs.expect_list_files()
            .returning(|_| Err(io::Error::from(io::ErrorKind::NotFound)));

        let titles = scanner_with(fs).scan(Path::new("/nowhere")).await.expect("scan");
        assert!(titles.is_empty());
    }

    #[tokio::test]
    async fn unreadable_directory_is_fatal() {
        let mut fs = MockMirrorFilesystem::new();
        fs.expect_list_files()
            .returning(|_| Err(io::Error::from(io::ErrorKind::PermissionDenied)));

        let err = scanner_with(fs).scan(Path::new("/locked")).await.unwrap_err();
        assert!(matches!(err, CarnyxError::DirectoryAccess { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn scans_a_real_directory() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(dir.path().join("Song A.mp3"), b"a").expect("write");
        std::fs::write(dir.path().join(".mp3.mp3"), b"b").expect("write");
        std::fs::create_dir(dir.path().join("Album.mp3")).expect("mkdir");

        let scanner = MirrorScanner::new(Arc::new(LocalFilesystem::new()), "mp3");
        let titles = scanner.scan(dir.path()).await.expect("scan");
        assert_eq!(titles.len(), 2);
        assert!(titles.contains("Song A"));
        assert!(titles.contains(".mp3"));
        assert!(!titles.contains("Album"));
    }
}
