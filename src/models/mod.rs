//! Plain data types shared by the graph layer.
//!
//! Nothing here touches storage: ids, direction and provenance enums, payload
//! encoding, and the [`Traversal`] query description.

mod direction;
mod ids;
pub mod payload;
mod traversal;

pub use direction::{Direction, EdgeProvenance};
pub use ids::{EdgeId, NodeId};
pub use traversal::{DepthRange, Traversal};
