//! Stable output file names derived from input paths.
//!
//! Every output file written for an input is named `{md5(absolute input path)}.csv.bz2`,
//! so re-running against the same input overwrites instead of accumulating files.

use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

use md5::{Digest, Md5};

use crate::ChopError;

/// Extension of every output file
pub const OUTPUT_SUFFIX: &str = "csv.bz2";

/// Lowercase hex MD5 digest of an input file's absolute path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputIdentity(String);

impl OutputIdentity {
    /// Fingerprint `input`, resolving it against the working directory first.
    pub fn for_input(input: &Path) -> Result<Self, ChopError> {
        let absolute = absolute_clean(input).map_err(|source| ChopError::InputOpen {
            path: input.to_path_buf(),
            source,
        })?;
        Ok(Self::from_absolute(&absolute))
    }

    /// Fingerprint an already absolute path without touching the filesystem.
    pub fn from_absolute(path: &Path) -> Self {
        let digest = Md5::digest(path.as_os_str().as_encoded_bytes());
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name used for every partition of this input.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.0, OUTPUT_SUFFIX)
    }
}

impl fmt::Display for OutputIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Absolute, lexically cleaned form of `path`.
///
/// `.` components are dropped and `..` removes the preceding component; symlinks
/// are not resolved.
pub fn absolute_clean(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_md5_hex_of_path() {
        let identity = OutputIdentity::from_absolute(Path::new("/data/in.csv"));
        let expected = hex::encode(Md5::digest(b"/data/in.csv"));
        assert_eq!(identity.as_str(), expected);
        assert_eq!(identity.as_str().len(), 32);
        assert!(identity
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_eq!(identity.file_name(), format!("{expected}.csv.bz2"));
    }

    #[test]
    fn identity_is_stable_across_calls() {
        let a = OutputIdentity::for_input(Path::new("some/input.csv")).unwrap();
        let b = OutputIdentity::for_input(Path::new("some/input.csv")).unwrap();
        assert_eq!(a, b);
    }

    #[cfg(unix)]
    #[test]
    fn dot_segments_are_cleaned() {
        assert_eq!(
            absolute_clean(Path::new("/data/./raw/../in.csv")).unwrap(),
            PathBuf::from("/data/in.csv")
        );
        assert_eq!(
            OutputIdentity::for_input(Path::new("/data/raw/../in.csv")).unwrap(),
            OutputIdentity::from_absolute(Path::new("/data/in.csv"))
        );
    }

    #[test]
    fn relative_paths_resolve_against_working_directory() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(
            absolute_clean(Path::new("in.csv")).unwrap(),
            absolute_clean(&cwd.join("in.csv")).unwrap()
        );
    }
}
