//! Error types for the posts API client.
//!
//! # Design
//! `NotFound` keeps a dedicated variant because callers often want to tell
//! "the record is gone" apart from other server failures. `Transport` is
//! produced by hosts, not by the core: the core never performs I/O, so a host
//! that cannot reach the server or hits the request timeout reports it here.
//!
//! The screens treat every variant the same way (one rejected outcome with a
//! diagnostic). The enum is `Clone` so the query cache can keep the last error
//! next to the last good data.

/// Errors returned by `PostsClient` parse methods and by hosts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response (unreachable, timeout, ...).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}
