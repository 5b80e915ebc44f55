//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the sync engine's external collaborators: the
//! upstream feed provider and downstream update subscribers.

pub mod provider;
pub mod subscriber;
