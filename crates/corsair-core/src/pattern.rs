//! Filename-style glob matching.
//!
//! Origins are matched against operator-supplied patterns where `*` matches
//! any run of characters and `?` matches exactly one character. Character
//! classes (`[abc]`, `[!abc]`) are honoured as well.
//!
//! By default the candidate is lowercased before matching and the pattern is
//! taken as written, so `*.example.com` matches `API.Example.com` while
//! `*.Example.com` matches nothing. [`CaseSensitivity::Sensitive`] skips the
//! lowercasing, which is how HTTP method tokens are compared.
//!
//! Runs of `*` behave like a single `*`, and a `[` without a closing `]` is
//! an ordinary character. Every other part of such a pattern keeps its
//! wildcard meaning.
//!
//! # Example
//!
//! ```
//! use corsair_core::pattern::{matches, matches_any, GlobPattern};
//!
//! assert!(matches("palim.woopy.com", "*.woopy.com"));
//! assert!(matches("Example1.com", "example?.com"));
//!
//! let patterns = [GlobPattern::new("example.com"), GlobPattern::new("*.example.com")];
//! assert!(matches_any("sub.example.com", &patterns));
//! assert!(!matches_any("example.org", &patterns));
//! ```

use glob::{MatchOptions, Pattern};

/// Whether a comparison distinguishes upper and lower case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseSensitivity {
    /// The candidate is lowercased: `EXAMPLE.com` matches `example.com`.
    #[default]
    Insensitive,
    /// Exact comparison. Used for HTTP method tokens.
    Sensitive,
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// A glob pattern compiled once and matched many times.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    raw: String,
    compiled: Option<Pattern>,
}

impl GlobPattern {
    /// Compiles a pattern. Anything the glob compiler still rejects after
    /// normalization is compared literally.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let compiled = match Pattern::new(&normalize(&raw)) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                tracing::debug!(pattern = %raw, error = %e, "Glob pattern does not compile, matching literally");
                None
            }
        };
        Self { raw, compiled }
    }

    /// Returns the pattern text as configured.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Case-insensitive match.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.matches_with(candidate, CaseSensitivity::Insensitive)
    }

    /// Match with explicit case handling.
    #[must_use]
    pub fn matches_with(&self, candidate: &str, case: CaseSensitivity) -> bool {
        let lowered;
        let candidate = match case {
            CaseSensitivity::Insensitive => {
                lowered = candidate.to_lowercase();
                lowered.as_str()
            }
            CaseSensitivity::Sensitive => candidate,
        };
        match &self.compiled {
            Some(pattern) => pattern.matches_with(candidate, MATCH_OPTIONS),
            None => candidate == self.raw,
        }
    }
}

/// Rewrites filename-glob syntax into what `glob::Pattern` accepts.
///
/// `glob` reads `**` as a recursive path wildcard and rejects an unterminated
/// `[`. Here `**` collapses to `*` and a lone `[` is escaped as `[[]`.
fn normalize(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                out.push('*');
                while chars.get(i + 1) == Some(&'*') {
                    i += 1;
                }
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.extend(&chars[i..=end]);
                    i = end;
                }
                None => out.push_str("[[]"),
            },
            c => out.push(c),
        }
        i += 1;
    }
    out
}

/// Index of the `]` closing the class opened at `start`. A `]` right after
/// `[` or `[!` is a member of the class.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    chars[j.min(chars.len())..]
        .iter()
        .position(|&c| c == ']')
        .map(|offset| j + offset)
}

impl PartialEq for GlobPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for GlobPattern {}

impl std::fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Returns `true` if `candidate` matches `pattern`, ignoring case.
#[must_use]
pub fn matches(candidate: &str, pattern: &str) -> bool {
    GlobPattern::new(pattern).matches(candidate)
}

/// Returns `true` if `candidate` matches `pattern` under the given case rule.
#[must_use]
pub fn matches_with(candidate: &str, pattern: &str, case: CaseSensitivity) -> bool {
    GlobPattern::new(pattern).matches_with(candidate, case)
}

/// Returns `true` if any pattern matches. An empty list never matches.
#[must_use]
pub fn matches_any<'a, I>(candidate: &str, patterns: I) -> bool
where
    I: IntoIterator<Item = &'a GlobPattern>,
{
    patterns.into_iter().any(|p| p.matches(candidate))
}
