//! Scope parsing and matching.
//!
//! Scopes are prefix-typed, `/`-chained hierarchical identifiers:
//!
//! - `repo:acme`
//! - `repo:acme/folder:src/api`
//! - `repo:acme/folder:src/user:alice`
//!
//! A decision binds to exactly one scope string. Whether a stored decision
//! covers an incoming query or action is decided here, deterministically,
//! and the accumulated specificity is the primary ranking key when several
//! decisions compete.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The recognized scope prefixes. Unknown prefixes (and bare strings)
/// collapse to the [`ScopeKind::Fallback`] level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Repo,
    Folder,
    User,
    Workflow,
    Team,
    /// Catch-all for unprefixed or unknown-prefix segments.
    #[serde(rename = "scope")]
    Fallback,
}

impl ScopeKind {
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "repo" => Some(Self::Repo),
            "folder" => Some(Self::Folder),
            "user" => Some(Self::User),
            "workflow" => Some(Self::Workflow),
            "team" => Some(Self::Team),
            _ => None,
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Repo => write!(f, "repo"),
            Self::Folder => write!(f, "folder"),
            Self::User => write!(f, "user"),
            Self::Workflow => write!(f, "workflow"),
            Self::Team => write!(f, "team"),
            Self::Fallback => write!(f, "scope"),
        }
    }
}

/// One parsed level of a scope chain.
///
/// `level` is the zero-based position of the prefixed segment in the chain;
/// `specificity` is the cumulative count of path segments consumed up to and
/// including this level (the prefixed segment counts as 1, each further
/// `/`-delimited sub-segment as 1 more).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeLevel {
    pub kind: ScopeKind,
    pub value: String,
    pub level: usize,
    pub specificity: usize,
}

/// Splits a scope string into non-empty `/`-delimited segments.
fn split_segments(scope: &str) -> Vec<&str> {
    scope.split('/').filter(|seg| !seg.is_empty()).collect()
}

/// Parses a scope string into its ordered levels.
///
/// Total: never fails. A string with no recognized prefix degrades to a
/// single [`ScopeKind::Fallback`] level whose specificity is its segment
/// count; an empty string yields no levels.
///
/// # Examples
///
/// ```
/// use decree::scope::{parse, ScopeKind};
///
/// let levels = parse("repo:acme/folder:src/api");
/// assert_eq!(levels.len(), 2);
/// assert_eq!(levels[0].kind, ScopeKind::Repo);
/// assert_eq!(levels[0].specificity, 1);
/// assert_eq!(levels[1].kind, ScopeKind::Folder);
/// assert_eq!(levels[1].value, "src/api");
/// assert_eq!(levels[1].specificity, 3);
/// ```
#[must_use]
pub fn parse(scope: &str) -> Vec<ScopeLevel> {
    let segments = split_segments(scope);
    if segments.is_empty() {
        return Vec::new();
    }

    // Fallback path: no segment carries a recognized prefix.
    let has_prefix = segments
        .iter()
        .any(|seg| seg.split_once(':').is_some_and(|(p, _)| ScopeKind::from_prefix(p).is_some()));
    if !has_prefix {
        return vec![ScopeLevel {
            kind: ScopeKind::Fallback,
            value: segments.join("/"),
            level: 0,
            specificity: segments.len(),
        }];
    }

    let mut levels: Vec<ScopeLevel> = Vec::new();
    let mut specificity = 0usize;

    for seg in segments {
        specificity += 1;
        let prefixed = seg
            .split_once(':')
            .and_then(|(p, rest)| ScopeKind::from_prefix(p).map(|kind| (kind, rest)));

        match prefixed {
            Some((kind, rest)) => {
                levels.push(ScopeLevel {
                    kind,
                    value: rest.to_string(),
                    level: levels.len(),
                    specificity,
                });
            }
            None => match levels.last_mut() {
                // Unprefixed continuation extends the current level's value.
                Some(last) => {
                    last.value.push('/');
                    last.value.push_str(seg);
                    last.specificity = specificity;
                }
                None => {
                    levels.push(ScopeLevel {
                        kind: ScopeKind::Fallback,
                        value: seg.to_string(),
                        level: 0,
                        specificity,
                    });
                }
            },
        }
    }

    levels
}

/// Returns true if *candidate* covers *reference*: exact equality, or
/// *reference* extends *candidate* with a `/`-prefixed continuation.
///
/// Matching is segment-boundary prefix matching. A `*` inside a candidate
/// segment matches any run of characters within the corresponding reference
/// segment (never across `/`). Empty candidate or reference never matches.
///
/// # Examples
///
/// ```
/// use decree::scope::covers;
///
/// assert!(covers("repo:acme", "repo:acme/folder:src"));
/// assert!(!covers("repo:acme/folder:src", "repo:acme"));
/// assert!(covers("repo:*", "repo:acme/folder:src"));
/// ```
#[must_use]
pub fn covers(candidate: &str, reference: &str) -> bool {
    if candidate.is_empty() || reference.is_empty() {
        return false;
    }

    let candidate_segs = split_segments(candidate);
    let reference_segs = split_segments(reference);

    if candidate_segs.is_empty() || candidate_segs.len() > reference_segs.len() {
        return false;
    }

    candidate_segs
        .iter()
        .zip(reference_segs.iter())
        .all(|(pat, seg)| segment_matches(pat, seg))
}

/// Case-sensitive glob match for a single segment; only `*` is special.
fn segment_matches(pattern: &str, segment: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == segment;
    }

    let mut remainder = segment;
    let mut parts = pattern.split('*');

    // First part is anchored at the start.
    if let Some(first) = parts.next() {
        let Some(rest) = remainder.strip_prefix(first) else {
            return false;
        };
        remainder = rest;
    }

    let mut tail: Option<&str> = None;
    for part in parts {
        if let Some(prev) = tail.take() {
            match remainder.find(prev) {
                Some(pos) => remainder = &remainder[pos + prev.len()..],
                None => return false,
            }
        }
        tail = Some(part);
    }

    // Last part is anchored at the end.
    match tail {
        Some(last) => remainder.ends_with(last),
        None => true,
    }
}

/// Total accumulated specificity of a scope string (higher = more specific).
#[must_use]
pub fn specificity_of(scope: &str) -> usize {
    split_segments(scope).len()
}
