//! Node identifier parsing and canonicalization
//!
//! A node identifier has five dash-separated segments:
//! - country: 2 letters (`uk`)
//! - batch: 2 letters followed by 4 digits (`sa2341`)
//! - type: `hnode`, `tnode` or `anode`
//! - revision: 2 alphanumerics (`a1`)
//! - serial: 4 alphanumerics (`0001`)
//!
//! Identifiers are case-insensitive. The canonical form is the lowercase
//! string; only ASCII is accepted so folding never changes length or
//! segment count.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const SEGMENT_COUNT: usize = 5;

/// Kind of node encoded in the third segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Home,
    Tower,
    Amplifier,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "hnode",
            Self::Tower => "tnode",
            Self::Amplifier => "anode",
        }
    }

    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "hnode" => Some(Self::Home),
            "tnode" => Some(Self::Tower),
            "anode" => Some(Self::Amplifier),
            _ => None,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Segment of a node identifier, used to report where parsing failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Country,
    Batch,
    Type,
    Revision,
    Serial,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Country => "country",
            Self::Batch => "batch",
            Self::Type => "type",
            Self::Revision => "revision",
            Self::Serial => "serial",
        };
        f.write_str(name)
    }
}

/// Node identifier validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeIdError {
    Empty,
    NonAscii,
    SegmentCount { expected: usize, got: usize },
    InvalidSegment { segment: Segment, value: String },
}

impl fmt::Display for NodeIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "node id is empty"),
            Self::NonAscii => write!(f, "node id contains non-ASCII characters"),
            Self::SegmentCount { expected, got } => {
                write!(f, "node id must have {} segments (got {})", expected, got)
            }
            Self::InvalidSegment { segment, value } => {
                write!(f, "invalid {} segment '{}'", segment, value)
            }
        }
    }
}

impl std::error::Error for NodeIdError {}

/// Canonical (lowercase, structurally valid) node identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    /// Validate `raw` against the node id grammar and fold it to lowercase.
    pub fn canonicalize(raw: &str) -> Result<Self, NodeIdError> {
        if raw.is_empty() {
            return Err(NodeIdError::Empty);
        }
        if !raw.is_ascii() {
            return Err(NodeIdError::NonAscii);
        }

        let canonical = raw.to_ascii_lowercase();
        let segments: Vec<&str> = canonical.split('-').collect();
        if segments.len() != SEGMENT_COUNT {
            return Err(NodeIdError::SegmentCount {
                expected: SEGMENT_COUNT,
                got: segments.len(),
            });
        }

        check(Segment::Country, segments[0], |s| {
            s.len() == 2 && s.bytes().all(|b| b.is_ascii_lowercase())
        })?;
        check(Segment::Batch, segments[1], |s| {
            s.len() == 6
                && s.bytes().take(2).all(|b| b.is_ascii_lowercase())
                && s.bytes().skip(2).all(|b| b.is_ascii_digit())
        })?;
        check(Segment::Type, segments[2], |s| NodeType::from_segment(s).is_some())?;
        check(Segment::Revision, segments[3], |s| is_alnum_of_len(s, 2))?;
        check(Segment::Serial, segments[4], |s| is_alnum_of_len(s, 4))?;

        Ok(Self(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn node_type(&self) -> NodeType {
        // The grammar was checked at construction.
        self.0
            .split('-')
            .nth(2)
            .and_then(NodeType::from_segment)
            .unwrap_or(NodeType::Home)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

fn check(segment: Segment, value: &str, valid: impl Fn(&str) -> bool) -> Result<(), NodeIdError> {
    if valid(value) {
        Ok(())
    } else {
        Err(NodeIdError::InvalidSegment {
            segment,
            value: value.to_string(),
        })
    }
}

fn is_alnum_of_len(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodeId {
    type Err = NodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::canonicalize(s)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::canonicalize(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_form_is_lowercase() {
        let id = NodeId::canonicalize("UK-AA0001-HNODE-A1-0001").unwrap();
        assert_eq!(id.as_str(), "uk-aa0001-hnode-a1-0001");
        assert_eq!(id.node_type(), NodeType::Home);
    }

    #[test]
    fn test_case_variants_are_equal() {
        let variants = [
            "uk-sa2341-hnode-v0-a1a0",
            "UK-SA2341-HNODE-V0-A1A0",
            "Uk-Sa2341-hNoDe-v0-A1a0",
        ];
        let first = NodeId::canonicalize(variants[0]).unwrap();
        for v in &variants[1..] {
            let id = NodeId::canonicalize(v).unwrap();
            assert_eq!(id, first);
            assert_eq!(id.as_str().len(), v.len());
        }
    }

    #[test]
    fn test_node_types() {
        assert_eq!(
            NodeId::canonicalize("uk-sa2341-tnode-a1-0001").unwrap().node_type(),
            NodeType::Tower
        );
        assert_eq!(
            NodeId::canonicalize("uk-sa2341-anode-a1-0001").unwrap().node_type(),
            NodeType::Amplifier
        );
    }

    #[test]
    fn test_segment_count() {
        assert_eq!(
            NodeId::canonicalize("uk-sa2341-hnode-a1"),
            Err(NodeIdError::SegmentCount { expected: 5, got: 4 })
        );
        assert_eq!(
            NodeId::canonicalize("uk-sa2341-hnode-a1-0001-x"),
            Err(NodeIdError::SegmentCount { expected: 5, got: 6 })
        );
        assert!(matches!(
            NodeId::canonicalize("uk-sa2341--hnode-a1-0001"),
            Err(NodeIdError::SegmentCount { .. })
        ));
    }

    #[test]
    fn test_invalid_segments() {
        let cases = [
            ("u1-sa2341-hnode-a1-0001", Segment::Country),
            ("ukk-sa2341-hnode-a1-0001", Segment::Country),
            ("uk-s12341-hnode-a1-0001", Segment::Batch),
            ("uk-sa234-hnode-a1-0001", Segment::Batch),
            ("uk-sa2341-xnode-a1-0001", Segment::Type),
            ("uk-sa2341-hnode-a_-0001", Segment::Revision),
            ("uk-sa2341-hnode-a1-00001", Segment::Serial),
        ];
        for (raw, expected) in cases {
            match NodeId::canonicalize(raw) {
                Err(NodeIdError::InvalidSegment { segment, .. }) => assert_eq!(segment, expected, "{raw}"),
                other => panic!("expected invalid {expected} for {raw}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_rejects_empty_and_non_ascii() {
        assert_eq!(NodeId::canonicalize(""), Err(NodeIdError::Empty));
        assert_eq!(
            NodeId::canonicalize("uk-sa2341-hnöde-a1-0001"),
            Err(NodeIdError::NonAscii)
        );
    }

    #[test]
    fn test_serde_canonicalizes() {
        let id: NodeId = serde_json::from_str("\"UK-AA0001-HNODE-A1-0001\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"uk-aa0001-hnode-a1-0001\"");
        assert!(serde_json::from_str::<NodeId>("\"not-a-node\"").is_err());
    }
}
