use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CarnyxError {
    #[error("usage error: {0}")]
    Usage(String),
    #[error("could not resolve {id}: {reason}")]
    Resolution { id: String, reason: String },
    #[error("cannot read directory {}: {source}", path.display())]
    DirectoryAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unsafe destination for title {title:?}: {reason}")]
    Path { title: String, reason: String },
    #[error("acquisition of {id} failed: {reason}")]
    Acquisition { id: String, reason: String },
    #[error("acquisition of {id} timed out after {}s", elapsed.as_secs())]
    Timeout { id: String, elapsed: Duration },
    #[error("writing tags to {} failed: {reason}", path.display())]
    TagWrite { path: PathBuf, reason: String },
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigValidationError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl CarnyxError {
    /// Fatal errors abort the run; the rest only cost the item they belong to.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CarnyxError::Usage(_)
                | CarnyxError::Resolution { .. }
                | CarnyxError::DirectoryAccess { .. }
                | CarnyxError::Config(_)
        )
    }

    pub(crate) fn resolution(id: impl Into<String>, reason: impl ToString) -> Self {
        CarnyxError::Resolution {
            id: id.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn acquisition(id: impl Into<String>, reason: impl ToString) -> Self {
        CarnyxError::Acquisition {
            id: id.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = CarnyxError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_fatal_and_per_item_errors() {
        assert!(CarnyxError::Usage("bad".into()).is_fatal());
        assert!(CarnyxError::resolution("PL", "offline").is_fatal());
        assert!(
            CarnyxError::DirectoryAccess {
                path: PathBuf::from("/x"),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            }
            .is_fatal()
        );

        assert!(!CarnyxError::acquisition("abc", "404").is_fatal());
        assert!(
            !CarnyxError::Timeout {
                id: "abc".into(),
                elapsed: Duration::from_secs(5),
            }
            .is_fatal()
        );
        assert!(
            !CarnyxError::TagWrite {
                path: PathBuf::from("a.mp3"),
                reason: "not a container".into(),
            }
            .is_fatal()
        );
        assert!(
            !CarnyxError::Path {
                title: "..".into(),
                reason: "traversal".into(),
            }
            .is_fatal()
        );
    }
}
