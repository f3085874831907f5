//! navshell-feed: announcement feed IO boundary.
//! The `FeedClient` trait the controller consumes, and the HTTP client that
//! talks to the console API. No scheduling or caching here.

pub mod client;
pub mod error;
pub mod http;

pub use client::FeedClient;
pub use error::FeedError;
pub use http::HttpFeedClient;
