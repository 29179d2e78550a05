//! Hierarchical environment names
//!
//! Provides [`EnvironmentName`], the validated form of names such as
//! `us-west/staging`. Each segment becomes one directory below the
//! environments root, so validation rejects anything that could escape that
//! root or that some supported platform cannot store as a directory name.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

/// Separator between segments in the canonical form
pub const SEPARATOR: char = '/';

/// Characters no supported filesystem accepts in a directory name
const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Device names Windows reserves regardless of extension
const RESERVED_DEVICES: &[&str] = &["CON", "PRN", "AUX", "NUL"];

/// Validated environment name
///
/// Never empty. Ordering follows the canonical `/`-joined string, so
/// `a-b` sorts before `a/b`.
///
/// # Examples
/// - `["default"]` → `default`
/// - `["us-west", "staging"]` → `us-west/staging`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EnvironmentName(Vec<String>);

impl EnvironmentName {
    /// Validate a raw `/`-separated name
    ///
    /// Leading or trailing separators are not trimmed; they produce an
    /// empty segment and are rejected.
    ///
    /// # Errors
    /// Returns [`NameError`] naming the first offending segment.
    pub fn normalize(raw: &str) -> Result<Self, NameError> {
        if raw.is_empty() {
            return Err(NameError::Empty);
        }

        let segments = raw
            .split(SEPARATOR)
            .map(|seg| validate_segment(raw, seg).map(|()| seg.to_string()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self(segments))
    }

    /// Build a name from already-split segments, validating each
    ///
    /// # Errors
    /// Returns [`NameError::Empty`] for no segments, otherwise the first
    /// segment violation.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, NameError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(NameError::Empty);
        }

        let raw = segments.join("/");
        for seg in &segments {
            validate_segment(&raw, seg)?;
        }

        Ok(Self(segments))
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments (always at least one)
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Parent name, `None` for a top-level name
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.len() > 1 {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        } else {
            None
        }
    }

    /// Last segment (the leaf directory name)
    #[inline]
    #[must_use]
    pub fn last(&self) -> &str {
        // Non-empty by construction
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    /// Strict prefixes of this name, shortest first
    ///
    /// `a/b/c` yields `a` then `a/b`.
    #[must_use]
    pub fn ancestors(&self) -> Vec<Self> {
        (1..self.0.len())
            .map(|len| Self(self.0[..len].to_vec()))
            .collect()
    }

    /// Check if this name is a strict prefix of another
    #[inline]
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && self.0 == other.0[..self.0.len()]
    }

    /// Relative filesystem path, one component per segment
    #[must_use]
    pub fn to_relative_path(&self) -> PathBuf {
        self.0.iter().collect()
    }

    /// Bytes of the canonical form, without allocating it
    fn canonical_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().enumerate().flat_map(|(i, seg)| {
            let sep = if i > 0 { Some(SEPARATOR as u8) } else { None };
            sep.into_iter().chain(seg.bytes())
        })
    }
}

fn validate_segment(raw: &str, seg: &str) -> Result<(), NameError> {
    if seg.is_empty() {
        return Err(NameError::EmptySegment {
            name: raw.to_string(),
        });
    }

    // Covers "." and ".." as well as hidden entries like ".metadata"
    if seg.starts_with('.') {
        return Err(NameError::Reserved {
            segment: seg.to_string(),
        });
    }

    if let Some(character) = seg
        .chars()
        .find(|c| FORBIDDEN_CHARS.contains(c) || c.is_control())
    {
        return Err(NameError::InvalidCharacter {
            segment: seg.to_string(),
            character,
        });
    }

    if seg.ends_with('.') || seg.ends_with(' ') {
        return Err(NameError::TrailingCharacter {
            segment: seg.to_string(),
        });
    }

    if is_device_name(seg) {
        return Err(NameError::ReservedDeviceName {
            segment: seg.to_string(),
        });
    }

    Ok(())
}

fn is_device_name(seg: &str) -> bool {
    let stem = seg.split('.').next().unwrap_or(seg).to_ascii_uppercase();
    if RESERVED_DEVICES.contains(&stem.as_str()) {
        return true;
    }

    match stem.as_bytes() {
        [b'C', b'O', b'M', d] | [b'L', b'P', b'T', d] => (b'1'..=b'9').contains(d),
        _ => false,
    }
}

impl Display for EnvironmentName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl FromStr for EnvironmentName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

impl TryFrom<String> for EnvironmentName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::normalize(&value)
    }
}

impl From<EnvironmentName> for String {
    fn from(name: EnvironmentName) -> Self {
        name.to_string()
    }
}

impl Ord for EnvironmentName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical_bytes().cmp(other.canonical_bytes())
    }
}

impl PartialOrd for EnvironmentName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Errors related to environment names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    /// Nothing to validate
    #[error("environment name must not be empty")]
    Empty,

    /// Two separators in a row, or a leading/trailing separator
    #[error("environment name '{name}' contains an empty segment")]
    EmptySegment {
        /// The full name as given
        name: String,
    },

    /// `.`, `..` or any other dot-prefixed segment
    #[error("segment '{segment}' is reserved (segments must not start with '.')")]
    Reserved {
        /// Offending segment
        segment: String,
    },

    /// Character not portable to every supported filesystem
    #[error("segment '{segment}' contains invalid character {character:?}")]
    InvalidCharacter {
        /// Offending segment
        segment: String,
        /// First rejected character
        character: char,
    },

    /// Segment ends with a dot or a space
    #[error("segment '{segment}' must not end with '.' or a space")]
    TrailingCharacter {
        /// Offending segment
        segment: String,
    },

    /// Windows device name such as `CON` or `lpt1`
    #[error("segment '{segment}' is a reserved device name")]
    ReservedDeviceName {
        /// Offending segment
        segment: String,
    },
}

impl NameError {
    /// The offending segment, when the error is about a single segment
    #[must_use]
    pub fn segment(&self) -> Option<&str> {
        match self {
            Self::Empty | Self::EmptySegment { .. } => None,
            Self::Reserved { segment }
            | Self::InvalidCharacter { segment, .. }
            | Self::TrailingCharacter { segment }
            | Self::ReservedDeviceName { segment } => Some(segment),
        }
    }
}
