//! Ordered collection of patterns with any/all combining.

use super::pattern::{Pattern, PatternError};

/// An immutable, ordered set of [`Pattern`]s.
///
/// With `match_all = false` a hostname matches if any inner pattern matches;
/// an empty set matches nothing. With `match_all = true` every inner pattern
/// must match; an empty set matches everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSet {
    inner: Vec<Pattern>,
    match_all: bool,
}

impl PatternSet {
    /// Builds a set from already validated patterns.
    pub fn new(inner: Vec<Pattern>, match_all: bool) -> Self {
        Self { inner, match_all }
    }

    /// Compiles command-line arguments of the form `start` or `start:end`
    /// into an any-match set. Each compiled pattern is validated.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self, PatternError> {
        let mut inner = Vec::with_capacity(args.len());

        for arg in args {
            let arg = arg.as_ref();
            let parts: Vec<&str> = arg.split(':').collect();

            let pattern = match parts.as_slice() {
                [start] => Pattern::new(*start, ""),
                [start, end] => Pattern::new(*start, *end),
                _ => return Err(PatternError::InvalidSyntax(arg.to_string())),
            };

            pattern.validate()?;
            inner.push(pattern);
        }

        Ok(Self::new(inner, false))
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.inner
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Checks the set against the approximate encoding of a candidate.
    #[inline]
    pub fn matches_approx(&self, hostname: &[u8]) -> bool {
        for pattern in &self.inner {
            let matched = pattern.matches_approx(hostname);
            if matched && !self.match_all {
                return true;
            }
            if !matched && self.match_all {
                return false;
            }
        }

        self.match_all
    }

    /// Checks the set against a full hostname. Each inner pattern must
    /// satisfy both its approximate and its exact predicate.
    #[inline]
    pub fn matches_exact(&self, hostname: &[u8]) -> bool {
        for pattern in &self.inner {
            let matched = pattern.matches_approx(hostname) && pattern.matches_exact(hostname);
            if matched && !self.match_all {
                return true;
            }
            if !matched && self.match_all {
                return false;
            }
        }

        self.match_all
    }

    /// Expected number of candidates per match for the whole set.
    pub fn estimated_difficulty(&self) -> u64 {
        if self.inner.is_empty() {
            return if self.match_all { 1 } else { u64::MAX };
        }

        if self.match_all {
            self.inner
                .iter()
                .map(Pattern::estimated_difficulty)
                .fold(1u64, u64::saturating_mul)
        } else {
            self.inner
                .iter()
                .map(Pattern::estimated_difficulty)
                .min()
                .unwrap_or(u64::MAX)
        }
    }

    /// A rough human-readable cost estimate for the set.
    pub fn difficulty_description(&self) -> &'static str {
        match self.estimated_difficulty() {
            0..=32_768 => "very easy (instant)",
            32_769..=33_554_432 => "easy (seconds)",
            33_554_433..=34_359_738_368 => "medium (minutes to hours)",
            _ => "hard (days or more)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOSTNAME: &[u8] = b"abcdyjsviqu5fqvqzv5mnfonrapka477vonf6fuko7duolp5g3id";

    #[test]
    fn parse_splits_on_colon() {
        let set = PatternSet::parse(&["food:xid", "dark"]).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.patterns()[0].start(), "food");
        assert_eq!(set.patterns()[0].end(), "xid");
        assert_eq!(set.patterns()[1].start(), "dark");
        assert_eq!(set.patterns()[1].end(), "");
    }

    #[test]
    fn parse_rejects_extra_separators() {
        assert_eq!(
            PatternSet::parse(&["a:b:c"]),
            Err(PatternError::InvalidSyntax("a:b:c".into()))
        );
    }

    #[test]
    fn parse_rejects_invalid_patterns() {
        assert_eq!(
            PatternSet::parse(&["alpine9"]),
            Err(PatternError::BadStartAlphabet("9".into()))
        );
        assert_eq!(
            PatternSet::parse(&["food:xix"]),
            Err(PatternError::BadEndLastChar('x'))
        );
    }

    #[test]
    fn any_match_takes_the_first_hit() {
        let set = PatternSet::new(
            vec![Pattern::new("zzz", ""), Pattern::new("abcd", "")],
            false,
        );
        assert!(set.matches_approx(HOSTNAME));
        assert!(set.matches_exact(HOSTNAME));
    }

    #[test]
    fn any_match_fails_when_nothing_matches() {
        let set = PatternSet::new(vec![Pattern::new("zzz", "")], false);
        assert!(!set.matches_approx(HOSTNAME));
        assert!(!set.matches_exact(HOSTNAME));
    }

    #[test]
    fn all_match_requires_every_pattern() {
        let both = PatternSet::new(
            vec![Pattern::new("abcd", ""), Pattern::new("", "3id")],
            true,
        );
        assert!(both.matches_exact(HOSTNAME));

        let one_off = PatternSet::new(
            vec![Pattern::new("abcd", ""), Pattern::new("zzz", "")],
            true,
        );
        assert!(!one_off.matches_exact(HOSTNAME));
    }

    #[test]
    fn empty_set_semantics() {
        let any = PatternSet::new(Vec::new(), false);
        assert!(!any.matches_approx(HOSTNAME));
        assert!(!any.matches_exact(HOSTNAME));

        let all = PatternSet::new(Vec::new(), true);
        assert!(all.matches_approx(HOSTNAME));
        assert!(all.matches_exact(HOSTNAME));
    }

    #[test]
    fn exact_match_implies_approx_match_for_short_starts() {
        let set = PatternSet::parse(&["abcd", "a:3id"]).unwrap();
        if set.matches_exact(HOSTNAME) {
            assert!(set.matches_approx(HOSTNAME));
        }
    }

    #[test]
    fn any_match_difficulty_is_the_easiest_pattern() {
        let set = PatternSet::parse(&["aaaa", "ab"]).unwrap();
        assert_eq!(set.estimated_difficulty(), 1024);
    }
}
