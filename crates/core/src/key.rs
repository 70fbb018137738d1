//! Object key derivation
//!
//! Maps a local file path to the key it is stored under in the bucket.

use std::fmt;
use std::path::{Component, Path};

/// Remote object key
///
/// Always uses `/` as the separator, whatever the host path convention is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Get the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return a key with `prefix` joined in front by a single `/`
    ///
    /// An empty prefix (or one made only of slashes) leaves the key untouched.
    pub fn with_prefix(self, prefix: &str) -> Self {
        let prefix = prefix.trim_matches('/');
        if prefix.is_empty() {
            self
        } else {
            Self(format!("{prefix}/{}", self.0))
        }
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Compute the object key for `path` relative to `root`
///
/// The relative path is computed lexically, so a path beside the root maps to
/// a key starting with `..`. When no relative path exists (one side absolute
/// and the other relative, different volumes, or a root that climbs above its
/// starting point) the full path is used as the key instead of failing the
/// file. That key exposes the local directory layout to the bucket, so the
/// fallback is logged.
pub fn to_key(root: &Path, path: &Path) -> ObjectKey {
    match relative_path(root, path) {
        Some(rel) => ObjectKey(rel),
        None => {
            tracing::warn!(
                root = %root.display(),
                path = %path.display(),
                "Cannot make path relative to the upload root, using full path as key"
            );
            ObjectKey(normalize(path))
        }
    }
}

/// Lexical relative path from `root` to `path`, joined with `/`
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    if root.is_absolute() != path.is_absolute() {
        return None;
    }

    let root = clean(root);
    let path = clean(path);
    let common = root
        .iter()
        .zip(path.iter())
        .take_while(|(a, b)| a == b)
        .count();

    // Only plain names can be climbed out of with `..`
    if root[common..]
        .iter()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }

    let parts: Vec<String> = std::iter::repeat_n("..".to_string(), root.len() - common)
        .chain(
            path[common..]
                .iter()
                .map(|c| normalize(Path::new(c.as_os_str()))),
        )
        .collect();

    if parts.is_empty() {
        Some(".".to_string())
    } else {
        Some(parts.join("/"))
    }
}

/// Drop `.` and resolve `..` against preceding names
fn clean(path: &Path) -> Vec<Component<'_>> {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) => {}
                _ => out.push(component),
            },
            _ => out.push(component),
        }
    }
    out
}

fn normalize(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_to_key_nested() {
        let root = PathBuf::from("/srv/assets");
        let path = root.join("img").join("logo.png");
        assert_eq!(to_key(&root, &path).as_str(), "img/logo.png");
    }

    #[test]
    fn test_to_key_top_level() {
        let root = PathBuf::from("/srv/assets");
        let path = root.join("index.html");
        assert_eq!(to_key(&root, &path).as_str(), "index.html");
    }

    #[test]
    fn test_to_key_relative_root() {
        let root = PathBuf::from("./public");
        let path = PathBuf::from("./public/css/site.css");
        assert_eq!(to_key(&root, &path).as_str(), "css/site.css");
    }

    #[test]
    fn test_to_key_never_contains_backslash() {
        let root = PathBuf::from("/data");
        let path = PathBuf::from("/data/a\\b\\c.txt");
        let key = to_key(&root, &path);
        assert!(!key.as_str().contains('\\'));
        assert_eq!(key.as_str(), "a/b/c.txt");
    }

    #[test]
    fn test_to_key_outside_root_climbs() {
        let root = PathBuf::from("/srv/assets");
        assert_eq!(
            to_key(&root, Path::new("/srv/other/x.txt")).as_str(),
            "../other/x.txt"
        );
        assert_eq!(
            to_key(&root, Path::new("/tmp/other/file.txt")).as_str(),
            "../../tmp/other/file.txt"
        );
    }

    #[test]
    fn test_to_key_cleans_dot_segments() {
        let root = PathBuf::from("/srv/./assets/");
        let path = PathBuf::from("/srv/assets/img/../css/site.css");
        assert_eq!(to_key(&root, &path).as_str(), "css/site.css");
        assert_eq!(to_key(&root, &root).as_str(), ".");
    }

    #[test]
    fn test_to_key_falls_back_when_not_relative() {
        // absolute path against a relative root
        let key = to_key(Path::new("assets"), Path::new("/tmp/other/file.txt"));
        assert_eq!(key.as_str(), "/tmp/other/file.txt");

        // a root above the working directory cannot be climbed out of
        let key = to_key(Path::new("../assets"), Path::new("notes/a.txt"));
        assert_eq!(key.as_str(), "notes/a.txt");
    }

    #[test]
    fn test_to_key_does_not_start_with_root() {
        let root = PathBuf::from("/srv/assets");
        let key = to_key(&root, &root.join("a/b.txt"));
        assert!(!key.as_str().starts_with("/srv/assets"));
        assert!(!key.as_str().starts_with('/'));
    }

    #[test]
    fn test_with_prefix() {
        let key = to_key(Path::new("/r"), Path::new("/r/a/b.txt"));
        assert_eq!(key.clone().with_prefix("site/v2/").as_str(), "site/v2/a/b.txt");
        assert_eq!(key.clone().with_prefix("/site").as_str(), "site/a/b.txt");
        assert_eq!(key.with_prefix("").as_str(), "a/b.txt");
    }
}
