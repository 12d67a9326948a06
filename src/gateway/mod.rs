//! Request facade and its builder

mod builder;
mod facade;

pub use builder::BrevityBuilder;
pub use facade::{Brevity, DIGEST_TOO_SHORT_NOTE};
