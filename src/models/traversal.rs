//! Path query description.
//!
//! A [`Traversal`] describes one path query: where to start, which way to
//! walk, how many hops, and optionally where to stop. It is built per query
//! and never persisted.
//!
//! ```rust
//! use graphrel::models::{Direction, NodeId, Traversal};
//!
//! let traversal = Traversal::new(NodeId::new(1))
//!     .with_direction(Direction::Either)
//!     .with_depth_range(2, 4)
//!     .with_end(NodeId::new(9));
//!
//! assert_eq!(traversal.depth().min(), 2);
//! assert_eq!(traversal.end(), Some(NodeId::new(9)));
//! ```

use crate::models::{Direction, NodeId};
use crate::{Error, Result};
use std::fmt;

/// Inclusive hop-count bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthRange {
    min: u32,
    max: u32,
}

impl DepthRange {
    /// Every path of 1 to `max` hops; `up_to(0)` is the trivial start-only path.
    #[must_use]
    pub const fn up_to(max: u32) -> Self {
        Self {
            min: if max == 0 { 0 } else { 1 },
            max,
        }
    }

    /// Paths of exactly `depth` hops.
    #[must_use]
    pub const fn exactly(depth: u32) -> Self {
        Self {
            min: depth,
            max: depth,
        }
    }

    /// Explicit bounds. Not validated until the traversal runs.
    #[must_use]
    pub const fn between(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Lower bound.
    #[must_use]
    pub const fn min(&self) -> u32 {
        self.min
    }

    /// Upper bound.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Checks `min <= max <= limit`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the bounds are inverted or exceed `limit`.
    pub fn validate(&self, limit: u32) -> Result<()> {
        if self.min > self.max {
            return Err(Error::InvalidInput(format!(
                "depth range {self} has min greater than max"
            )));
        }
        if self.max > limit {
            return Err(Error::InvalidInput(format!(
                "depth {} exceeds the configured maximum of {limit}",
                self.max
            )));
        }
        Ok(())
    }
}

impl Default for DepthRange {
    fn default() -> Self {
        Self::up_to(1)
    }
}

impl fmt::Display for DepthRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// One path query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traversal {
    start: NodeId,
    direction: Direction,
    depth: DepthRange,
    end: Option<NodeId>,
    label: Option<String>,
}

impl Traversal {
    /// Starts a one-hop outgoing traversal from `start`.
    #[must_use]
    pub fn new(start: impl Into<NodeId>) -> Self {
        Self {
            start: start.into(),
            direction: Direction::Out,
            depth: DepthRange::default(),
            end: None,
            label: None,
        }
    }

    /// Sets the walk direction.
    #[must_use]
    pub const fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Walks up to `depth` hops (`[1, depth]`).
    #[must_use]
    pub const fn with_depth(mut self, depth: u32) -> Self {
        self.depth = DepthRange::up_to(depth);
        self
    }

    /// Walks between `min` and `max` hops inclusive.
    #[must_use]
    pub const fn with_depth_range(mut self, min: u32, max: u32) -> Self {
        self.depth = DepthRange::between(min, max);
        self
    }

    /// Keeps only paths that terminate at `end`.
    #[must_use]
    pub fn with_end(mut self, end: impl Into<NodeId>) -> Self {
        self.end = Some(end.into());
        self
    }

    /// Follows only edges carrying this label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Start node.
    #[must_use]
    pub const fn start(&self) -> NodeId {
        self.start
    }

    /// Walk direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Hop bounds.
    #[must_use]
    pub const fn depth(&self) -> DepthRange {
        self.depth
    }

    /// Optional end node.
    #[must_use]
    pub const fn end(&self) -> Option<NodeId> {
        self.end
    }

    /// Optional label filter.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}
