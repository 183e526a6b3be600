//! Requests handed to the host for execution.
//!
//! A `Dispatch` pairs an `HttpRequest` with the `RequestId` the host must
//! report its completion under. Nothing is ever cancelled: a completion that
//! arrives after its screen lost focus is still applied.

use std::fmt;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Identifies one in-flight request. Allocated monotonically per `AppContext`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a request does, so its completion can be parsed and applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Create,
    Update(u64),
    Delete(u64),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::List => write!(f, "list posts"),
            Operation::Create => write!(f, "create post"),
            Operation::Update(id) => write!(f, "update post {id}"),
            Operation::Delete(id) => write!(f, "delete post {id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub id: RequestId,
    pub operation: Operation,
    pub request: HttpRequest,
}

/// What a host reports back for a `Dispatch`: the response, or the transport
/// failure that prevented one.
pub type Reply = Result<HttpResponse, ApiError>;
