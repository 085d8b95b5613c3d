pub mod rewriter;
pub mod routes;

pub use rewriter::{rewrite, RewriteResult, TrackingLink};
