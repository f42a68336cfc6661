//! `/sample` demo backend.
//!
//! # Data Flow
//! ```text
//! GET …/sample
//!     → client.rs (fetch random joke from upstream)
//!     → recent.rs (dedupe, keep newest N)
//!     → { api_data, jokes }
//! ```

pub mod client;
pub mod recent;

pub use client::{FetchedJoke, JokeClient, SampleError};
pub use recent::{RecentJokes, StoredJoke};
