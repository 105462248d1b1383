//! Dotted version numbers and update comparison.
//!
//! Versions are arbitrary-length sequences of non-negative integers
//! (e.g. "1.4", "1.4.0", "0.48.7.2"). Missing trailing components count as
//! zero, so "1.2" and "1.2.0" are the same version.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, UpdateError};

/// A dotted numeric version.
#[derive(Debug, Clone)]
pub struct Version {
    components: Vec<u64>,
}

impl Version {
    /// Parse a dot-separated version string.
    ///
    /// Every component must be a non-negative integer; anything else is an
    /// [`UpdateError::InvalidVersion`] rather than a silent zero.
    pub fn parse(s: &str) -> Result<Self> {
        Self::from_str(s)
    }

    fn component(&self, index: usize) -> u64 {
        self.components.get(index).copied().unwrap_or(0)
    }
}

impl FromStr for Version {
    type Err = UpdateError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(UpdateError::InvalidVersion(s.to_string()));
        }

        let components = s
            .split('.')
            .map(|part| {
                if !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(UpdateError::InvalidVersion(s.to_string()));
                }
                part.parse::<u64>()
                    .map_err(|_| UpdateError::InvalidVersion(s.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { components })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.components {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{component}")?;
            first = false;
        }
        Ok(())
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for index in 0..len {
            match self.component(index).cmp(&other.component(index)) {
                Ordering::Equal => {}
                other => return other,
            }
        }
        Ordering::Equal
    }
}

/// Compare two versions after zero-padding them to the same length.
#[must_use]
pub fn compare(a: &Version, b: &Version) -> Ordering {
    a.cmp(b)
}

/// Decide whether `candidate` should replace the `current` install.
///
/// Returns `true` when nothing is recorded as installed. When either string
/// fails to parse this also returns `true`: a corrupt record must never pin
/// the installation to an old build.
#[must_use]
pub fn is_newer(current: Option<&str>, candidate: &str) -> bool {
    let Some(current) = current else {
        return true;
    };

    match (Version::parse(current), Version::parse(candidate)) {
        (Ok(current), Ok(candidate)) => candidate > current,
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!("Could not compare versions, updating anyway: {}", e);
            true
        }
    }
}
