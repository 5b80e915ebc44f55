//! Outbound adapters (driven side).

pub mod pinnacle;
pub mod subscriber;
