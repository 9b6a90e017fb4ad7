use std::path::{Component, Path, PathBuf};

use crate::error::{CarnyxError, Result};

const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Turn a title into a single path segment.
pub fn sanitize_segment(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| if RESERVED.contains(&c) || c.is_control() { '_' } else { c })
        .collect();
    replaced.trim().trim_end_matches('.').trim_end().to_owned()
}

/// `dir/<sanitized title>.<ext>`, refusing anything that would not land directly in `dir`.
pub fn destination_path(dir: &Path, title: &str, extension: &str) -> Result<PathBuf> {
    let segment = sanitize_segment(title);
    let unsafe_path = |reason: &str| CarnyxError::Path {
        title: title.to_owned(),
        reason: reason.to_owned(),
    };

    if segment.is_empty() {
        return Err(unsafe_path("title is empty after sanitizing"));
    }
    if segment == "." || segment == ".." {
        return Err(unsafe_path("title is a relative path component"));
    }

    let file_name = format!("{segment}.{extension}");
    let mut components = Path::new(&file_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => {}
        _ => return Err(unsafe_path("title does not form a single file name")),
    }

    let path = dir.join(&file_name);
    if path.parent() != Some(dir) {
        return Err(unsafe_path("path escapes the destination directory"));
    }
    Ok(path)
}

/// Lexically resolve `path` against `base`, folding `.` and `..` without touching the disk.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_separators_and_reserved_characters() {
        assert_eq!(sanitize_segment("normal name"), "normal name");
        assert_eq!(sanitize_segment("path/with/slashes"), "path_with_slashes");
        assert_eq!(sanitize_segment("Artist\\Song"), "Artist_Song");
        assert_eq!(sanitize_segment("what? <live>"), "what_ _live_");
        assert_eq!(sanitize_segment("tab\there"), "tab_here");
        assert_eq!(sanitize_segment("  padded.. "), "padded");
    }

    #[test]
    fn destination_stays_inside_directory() {
        let dir = Path::new("/music/mix");
        let hostile = [
            "../../etc/passwd",
            "..",
            "/absolute",
            "a/../../b",
            "..\\..\\windows",
            "./hidden",
            "C:\\x",
        ];
        for title in hostile {
            match destination_path(dir, title, "mp3") {
                Ok(path) => {
                    assert_eq!(path.parent(), Some(dir), "{title}");
                    assert!(path.starts_with(dir), "{title}");
                }
                Err(CarnyxError::Path { .. }) => {}
                Err(other) => panic!("unexpected error for {title}: {other}"),
            }
        }
    }

    #[test]
    fn degenerate_titles_are_rejected() {
        let dir = Path::new("/music");
        for title in ["", "   ", ".", "..", "...", " . "] {
            assert!(
                matches!(destination_path(dir, title, "mp3"), Err(CarnyxError::Path { .. })),
                "{title:?}"
            );
        }
    }

    #[test]
    fn builds_expected_file_name() {
        let path = destination_path(Path::new("/music"), "Song A", "mp3").unwrap();
        assert_eq!(path, Path::new("/music/Song A.mp3"));
    }

    #[test]
    fn absolutize_folds_relative_components() {
        let base = Path::new("/home/user");
        assert_eq!(absolutize(base, Path::new(".")), Path::new("/home/user"));
        assert_eq!(absolutize(base, Path::new("./")), Path::new("/home/user"));
        assert_eq!(absolutize(base, Path::new("a/..")), Path::new("/home/user"));
        assert_eq!(absolutize(base, Path::new("mix")), Path::new("/home/user/mix"));
        assert_eq!(absolutize(base, Path::new("/srv/mix")), Path::new("/srv/mix"));
    }
}
