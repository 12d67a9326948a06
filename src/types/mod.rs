//! Public result types for the Brevity API.

mod digest;
mod sentiment;
mod summary;

pub use digest::DigestResult;
pub use sentiment::{SentimentLabel, SentimentReport, SentimentResult, UNIFORM_SCORE};
pub use summary::SummaryResult;
