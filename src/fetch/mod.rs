//! Fetching from remote origins.

pub mod http;

pub use http::{FetchResponse, FetchResult, HttpFetcher, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
