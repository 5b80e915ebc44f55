//! Pinnacle-style odds API adapter.
//!
//! Implements [`FeedProvider`](crate::port::FeedProvider) over the REST
//! fixtures and odds endpoints.

pub mod client;
pub mod dto;

pub use client::PinnacleClient;
