//! Metric identity and tag parsing (spec §3, §6).

use crate::error::MetricsError;
use std::fmt;

const FORBIDDEN: [char; 3] = [':', ',', ';'];

/// A single `(name, value?)` tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricTag {
    name: String,
    value: Option<String>,
}

impl MetricTag {
    /// Builds a tag from an already-split name/value pair, trimming and
    /// validating both.
    ///
    /// # Errors
    /// Returns [`MetricsError::Configuration`] if `name` is empty after
    /// trimming, or either part contains `:`, `,`, or `;`.
    pub fn new(name: &str, value: Option<&str>) -> Result<Self, MetricsError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MetricsError::Configuration(
                "tag name must not be empty".to_string(),
            ));
        }
        if name.contains(FORBIDDEN) {
            return Err(MetricsError::Configuration(format!(
                "tag name {name:?} contains a reserved character"
            )));
        }
        let value = match value {
            None => None,
            Some(v) => {
                let v = v.trim();
                if v.contains(FORBIDDEN) {
                    return Err(MetricsError::Configuration(format!(
                        "tag value {v:?} contains a reserved character"
                    )));
                }
                Some(v.to_string())
            }
        };
        Ok(Self {
            name: name.to_string(),
            value,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Canonical form: `name` or `name:value`.
    #[must_use]
    pub fn canonical(&self) -> String {
        match &self.value {
            None => self.name.clone(),
            Some(v) => format!("{}:{}", self.name, v),
        }
    }

    /// Parses a single `name` or `name:value` segment (already trimmed of
    /// surrounding whitespace by the caller).
    fn parse_one(segment: &str) -> Result<Self, MetricsError> {
        match segment.split_once(':') {
            Some((name, value)) => Self::new(name, Some(value)),
            None => Self::new(segment, None),
        }
    }
}

impl fmt::Display for MetricTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Parses a comma-separated tag list, ignoring empty segments (spec §6).
///
/// # Errors
/// Returns [`MetricsError::Configuration`] on the first malformed segment.
pub fn parse_many(input: &str) -> Result<Vec<MetricTag>, MetricsError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(MetricTag::parse_one)
        .collect()
}

/// Value-typed, hashable, totally ordered metric identity (spec §3, §9).
///
/// The canonical string is built once at construction (resolving the source
/// design's unpopulated-`_string`-field ambiguity, see DESIGN.md) and is the
/// sole basis for `Hash`, `Eq`, and `Ord`.
#[derive(Debug, Clone)]
pub struct MetricIdentity {
    canonical: String,
    name: String,
    tags: Vec<MetricTag>,
}

impl MetricIdentity {
    #[must_use]
    pub fn new(name: impl Into<String>, mut tags: Vec<MetricTag>) -> Self {
        let name = name.into();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        let canonical = Self::build_canonical(&name, &tags);
        Self {
            canonical,
            name,
            tags,
        }
    }

    fn build_canonical(name: &str, sorted_tags: &[MetricTag]) -> String {
        if sorted_tags.is_empty() {
            return name.to_string();
        }
        let mut out = String::with_capacity(name.len() + sorted_tags.len() * 8);
        out.push_str(name);
        out.push(';');
        for (i, tag) in sorted_tags.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&tag.canonical());
        }
        out
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn tags(&self) -> &[MetricTag] {
        &self.tags
    }

    #[must_use]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

impl fmt::Display for MetricIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl PartialEq for MetricIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}
impl Eq for MetricIdentity {}

impl PartialOrd for MetricIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for MetricIdentity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.canonical.cmp(&other.canonical)
    }
}
impl std::hash::Hash for MetricIdentity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}
