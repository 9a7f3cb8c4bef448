//! Edge direction and provenance.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of an edge a node sits on, seen from that node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The node is the edge's `from` endpoint.
    #[default]
    Out,
    /// The node is the edge's `to` endpoint.
    In,
    /// Either endpoint.
    Either,
}

impl Direction {
    /// Returns the direction as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Out => "out",
            Self::In => "in",
            Self::Either => "either",
        }
    }

    /// Parses a direction, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "out" | "outgoing" => Some(Self::Out),
            "in" | "incoming" => Some(Self::In),
            "either" | "both" | "any" => Some(Self::Either),
            _ => None,
        }
    }

    /// Returns `true` for [`Direction::Out`] and [`Direction::In`].
    #[must_use]
    pub const fn is_directional(&self) -> bool {
        !matches!(self, Self::Either)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown direction: {s}"))
    }
}

/// Where an edge row came from.
///
/// Each user edge u→v is stored as a `Real` row u→v plus an `Inferred` row
/// v→u. Directional reads only ever see `Real` rows; the `Inferred` mirror
/// lets bidirectional traversal walk a single column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeProvenance {
    /// Authored by a caller, in the stated direction.
    Real,
    /// Mirror row written alongside a real edge.
    Inferred,
}

impl EdgeProvenance {
    /// Column encoding.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Real => 0,
            Self::Inferred => 1,
        }
    }

    /// Decodes the column value.
    #[must_use]
    pub const fn from_i64(v: i64) -> Option<Self> {
        match v {
            0 => Some(Self::Real),
            1 => Some(Self::Inferred),
            _ => None,
        }
    }
}
