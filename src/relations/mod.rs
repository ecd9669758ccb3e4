//! Joins the flat tables into a nested, referentially checked graph.

mod cache;
mod graph;
mod read;
mod tree;

pub use cache::GraphCache;
pub use graph::Graph;
pub use read::ReadView;
pub use tree::{JoinedAssignment, JoinedCategory, JoinedCritique, JoinedReview};
