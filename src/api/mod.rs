pub mod envelope;
pub mod error;
pub mod handlers;
pub mod middleware;

/// Author tag carried by every response envelope.
pub const CREATOR: &str = "RANZZ";
