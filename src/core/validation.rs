//! Validation for archive member names
//!
//! Member names become file names inside the container, with the `.npy`
//! suffix appended, and must fit the 16-bit name-length field.

use crate::error::{NpyError, Result};

/// Suffix appended to every member name on write and stripped on read
pub const MEMBER_SUFFIX: &str = ".npy";

/// A validated member name (without suffix)
///
/// # Rules
/// - Not empty
/// - No NUL bytes
/// - `len(name) + 4` fits in a `u16`
///
/// Uniqueness within a container is not checked; see
/// [`load_archive_member`](crate::load_archive_member).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberName(String);

impl MemberName {
    /// Longest accepted name in bytes
    pub const MAX_LENGTH: usize = u16::MAX as usize - MEMBER_SUFFIX.len();

    /// Create a new validated member name
    ///
    /// # Examples
    ///
    /// ```
    /// use npy_archive::MemberName;
    ///
    /// let name = MemberName::new("weights").unwrap();
    /// assert_eq!(name.file_name(), "weights.npy");
    /// assert!(MemberName::new("").is_err());
    /// ```
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(NpyError::format("member name is empty"));
        }
        if name.contains('\0') {
            return Err(NpyError::format(format!(
                "member name {:?} contains a NUL byte",
                name
            )));
        }
        if name.len() > Self::MAX_LENGTH {
            return Err(NpyError::UnsupportedFeature(format!(
                "member name of {} bytes exceeds the {} byte limit",
                name.len(),
                Self::MAX_LENGTH
            )));
        }
        Ok(MemberName(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name as stored in the container, suffix included
    pub fn file_name(&self) -> String {
        format!("{}{}", self.0, MEMBER_SUFFIX)
    }
}

impl std::fmt::Display for MemberName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Recover the logical member name from a stored file name
///
/// Returns the name and whether the suffix was present.
pub fn strip_member_suffix(file_name: &str) -> (&str, bool) {
    match file_name.strip_suffix(MEMBER_SUFFIX) {
        Some(stem) => (stem, true),
        None => (file_name, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["a", "arr_0", "nested/path", "with space", "ünïcödé"] {
            let member = MemberName::new(name).unwrap();
            assert_eq!(member.as_str(), name);
            assert_eq!(member.file_name(), format!("{}.npy", name));
        }
    }

    #[test]
    fn test_invalid_names() {
        assert!(matches!(MemberName::new(""), Err(NpyError::Format(_))));
        assert!(matches!(MemberName::new("a\0b"), Err(NpyError::Format(_))));

        let long = "x".repeat(MemberName::MAX_LENGTH + 1);
        assert!(matches!(
            MemberName::new(long),
            Err(NpyError::UnsupportedFeature(_))
        ));
        assert!(MemberName::new("x".repeat(MemberName::MAX_LENGTH)).is_ok());
    }

    #[test]
    fn test_strip_suffix() {
        assert_eq!(strip_member_suffix("arr.npy"), ("arr", true));
        assert_eq!(strip_member_suffix("arr.npy.npy"), ("arr.npy", true));
        assert_eq!(strip_member_suffix("npy"), ("npy", false));
        assert_eq!(strip_member_suffix("ab"), ("ab", false));
    }
}
