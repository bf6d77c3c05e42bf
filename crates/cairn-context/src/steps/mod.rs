//! The five pipeline stages
//!
//! Stage order is fixed by [`crate::ContextPipeline`]; each module exposes a
//! single pure function plus the metrics it fills in.

pub mod dedupe;
pub mod group;
pub mod merge;
pub mod normalize;
pub mod pack;

pub use dedupe::dedupe;
pub use group::{DocumentChunks, group_by_document};
pub use merge::merge_adjacent;
pub use normalize::normalize;
pub use pack::pack_window;
