//! Single start/end pattern.

use crate::crypto::{HOSTNAME_APPROX_LEN, HOSTNAME_LEN, ONION_ALPHABET};

/// Errors reported when compiling user-supplied patterns.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    /// Combined start + end length exceeds a full hostname.
    #[error("pattern is too long ({len} > 56 characters)")]
    TooLong { len: usize },

    /// The start part contains characters outside the base32 alphabet.
    #[error("start part contains invalid characters: {0:?}")]
    BadStartAlphabet(String),

    /// The end part contains characters outside the base32 alphabet.
    #[error("end part contains invalid characters: {0:?}")]
    BadEndAlphabet(String),

    /// The end part does not finish with `d`.
    #[error("last character of end part must be 'd', not {0:?}")]
    BadEndLastChar(char),

    /// The second to last character of the end part is not one of `aiqy`.
    #[error("second to last character of end part must be one of \"aiqy\", not {0:?}")]
    BadEndPenultimate(char),

    /// An argument had more than one `:` separator.
    #[error("pattern has too many ':' separators: {0:?}")]
    InvalidSyntax(String),
}

/// A prefix/suffix constraint on a hostname.
///
/// Immutable once compiled; shared by reference across workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    start: String,
    end: String,
}

impl Pattern {
    /// Creates a pattern without validating it; see [`Pattern::validate`].
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn end(&self) -> &str {
        &self.end
    }

    /// Checks this pattern against the approximate encoding of a candidate.
    ///
    /// Only the prefix is consulted; the last 5 bytes of an approximate
    /// hostname are wrong, so the suffix cannot be checked here.
    #[inline]
    pub fn matches_approx(&self, hostname: &[u8]) -> bool {
        let stable = &hostname[..HOSTNAME_APPROX_LEN.min(hostname.len())];
        stable.starts_with(self.start.as_bytes())
    }

    /// Checks this pattern against a full hostname.
    #[inline]
    pub fn matches_exact(&self, hostname: &[u8]) -> bool {
        hostname.starts_with(self.start.as_bytes()) && hostname.ends_with(self.end.as_bytes())
    }

    /// Checks that the pattern can match a real v3 hostname.
    ///
    /// Every hostname ends in `d` (the version byte), and the checksum
    /// leaves only `a`, `i`, `q` or `y` possible in the second to last
    /// position, so end parts outside those constraints can never match.
    pub fn validate(&self) -> Result<(), PatternError> {
        let len = self.start.len() + self.end.len();
        if len > HOSTNAME_LEN {
            return Err(PatternError::TooLong { len });
        }

        let invalid: String = self
            .start
            .chars()
            .filter(|&c| !ONION_ALPHABET.contains(&(c as u8)) || !c.is_ascii())
            .collect();
        if !invalid.is_empty() {
            return Err(PatternError::BadStartAlphabet(invalid));
        }

        if self.end.is_empty() {
            return Ok(());
        }

        let invalid: String = self
            .end
            .chars()
            .filter(|&c| !ONION_ALPHABET.contains(&(c as u8)) || !c.is_ascii())
            .collect();
        if !invalid.is_empty() {
            return Err(PatternError::BadEndAlphabet(invalid));
        }

        let bytes = self.end.as_bytes();
        let last = bytes[bytes.len() - 1];
        if last != b'd' {
            return Err(PatternError::BadEndLastChar(last as char));
        }

        if bytes.len() >= 2 {
            let penultimate = bytes[bytes.len() - 2];
            if !b"aiqy".contains(&penultimate) {
                return Err(PatternError::BadEndPenultimate(penultimate as char));
            }
        }

        Ok(())
    }

    /// Expected number of candidates per match, assuming uniform output.
    pub fn estimated_difficulty(&self) -> u64 {
        let len = self.start.len() + self.end.len();
        32u64.saturating_pow(len as u32)
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.end.is_empty() {
            f.write_str(&self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}
