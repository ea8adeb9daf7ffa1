use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, TrellisError};

/// Hierarchical task identifier: dot-separated non-negative integer segments,
/// e.g. `"3"` or `"1.2.4"`. Depth equals the segment count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(String);

impl TaskId {
    pub const MAX_LEN: usize = 50;

    /// Boundary parser for CLI and file-name inputs; maps grammar failures
    /// onto the crate error type.
    pub fn parse(input: &str) -> Result<Self> {
        input
            .parse()
            .map_err(|e: TaskIdParseError| TrellisError::InvalidTaskId(input.to_string(), e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn depth(&self) -> usize {
        self.0.bytes().filter(|b| *b == b'.').count() + 1
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// The ID with the last segment removed; `None` at depth 1.
    pub fn parent(&self) -> Option<TaskId> {
        self.0.rfind('.').map(|dot| TaskId(self.0[..dot].to_string()))
    }

    /// Direct-child test: one level deeper *and* textually prefixed by
    /// `parent + "."`. Both checks are required — `"1.10"` is a textual
    /// prefix match of `"1"`, and `"1.1"` must not count as a child of
    /// `"1.10"`.
    pub fn is_direct_child_of(&self, parent: &TaskId) -> bool {
        self.depth() == parent.depth() + 1
            && self.0.starts_with(parent.as_str())
            && self.0.as_bytes().get(parent.0.len()) == Some(&b'.')
    }

    fn last_segment(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    fn validate(value: &str) -> std::result::Result<(), TaskIdParseError> {
        if value.is_empty() {
            return Err(TaskIdParseError::Empty);
        }
        if value.len() > Self::MAX_LEN {
            return Err(TaskIdParseError::TooLong(value.len()));
        }
        for segment in value.split('.') {
            if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                return Err(TaskIdParseError::Malformed);
            }
        }
        Ok(())
    }
}

/// Numeric comparison of two digit-only segments. Leading zeros are
/// insignificant, so strip them and compare by length then bytes.
fn cmp_segment(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

impl Ord for TaskId {
    /// Segment-wise numeric order: `"2" < "10"`, `"1.2" < "1.10"`. A prefix
    /// sorts before its extensions; equal-valued spellings (`"01"` vs `"1"`)
    /// fall back to string order so the ordering stays total and consistent
    /// with `Eq`.
    fn cmp(&self, other: &Self) -> Ordering {
        let mut left = self.segments();
        let mut right = other.segments();
        loop {
            match (left.next(), right.next()) {
                (Some(a), Some(b)) => match cmp_segment(a, b) {
                    Ordering::Equal => continue,
                    decided => return decided,
                },
                (Some(_), None) => return Ordering::Greater,
                (None, Some(_)) => return Ordering::Less,
                (None, None) => return self.0.cmp(&other.0),
            }
        }
    }
}

impl PartialOrd for TaskId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = TaskIdParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::validate(trimmed)?;
        Ok(Self(trimmed.to_string()))
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for TaskId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// The direct children of `parent` among `ids`, in comparator order.
pub fn direct_children_of(parent: &TaskId, ids: &[TaskId]) -> Vec<TaskId> {
    let mut children: Vec<TaskId> = ids
        .iter()
        .filter(|id| id.is_direct_child_of(parent))
        .cloned()
        .collect();
    children.sort();
    children
}

/// Mint the next unused child slot under `parent` (max last segment + 1).
/// The minted id is re-validated before it is handed to any store, so an id
/// that breaks the grammar (length, in practice) is refused here instead of
/// being persisted and failing on the next snapshot load.
pub fn next_child(parent: &TaskId, ids: &[TaskId]) -> Result<TaskId> {
    let max = ids
        .iter()
        .filter(|id| id.is_direct_child_of(parent))
        .filter_map(|id| id.last_segment().parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    let slot = max
        .checked_add(1)
        .ok_or_else(|| mint_failed(&format!("under {parent}"), "sibling counter overflow"))?;
    let minted = format!("{}.{slot}", parent.as_str());
    TaskId::validate(&minted).map_err(|e| mint_failed(&format!("under {parent}"), &e.to_string()))?;
    Ok(TaskId(minted))
}

/// Mint the next unused top-level slot. A u64 slot is at most 20 digits, well
/// inside the length limit, so only counter overflow can fail here.
pub fn next_root(ids: &[TaskId]) -> Result<TaskId> {
    let max = ids
        .iter()
        .filter(|id| id.depth() == 1)
        .filter_map(|id| id.as_str().parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    let slot = max
        .checked_add(1)
        .ok_or_else(|| mint_failed("at the top level", "sibling counter overflow"))?;
    Ok(TaskId(slot.to_string()))
}

fn mint_failed(place: &str, reason: &str) -> TrellisError {
    TrellisError::IdMintFailed(place.to_string(), reason.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskIdParseError {
    Empty,
    TooLong(usize),
    Malformed,
}

impl fmt::Display for TaskIdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "task id cannot be empty"),
            Self::TooLong(actual) => write!(
                f,
                "task id must be at most {} characters (got {})",
                TaskId::MAX_LEN,
                actual
            ),
            Self::Malformed => write!(
                f,
                "task id must be dot-separated integer segments (e.g. 1, 1.2, 1.2.3)"
            ),
        }
    }
}

impl std::error::Error for TaskIdParseError {}
