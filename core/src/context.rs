//! Process-wide state handed explicitly to every handler.

use crate::cache::QueryCache;
use crate::client::PostsClient;
use crate::config::ClientConfig;
use crate::dispatch::{Dispatch, Operation, RequestId};
use crate::types::Post;

/// Created once when the shell starts and torn down with it. Screens borrow
/// it for the duration of a single handler call and never hold on to it.
#[derive(Debug)]
pub struct AppContext {
    pub client: PostsClient,
    pub cache: QueryCache<Vec<Post>>,
    next_id: u64,
}

impl AppContext {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: PostsClient::new(config),
            cache: QueryCache::new(),
            next_id: 0,
        }
    }

    pub fn next_request_id(&mut self) -> RequestId {
        self.next_id += 1;
        RequestId(self.next_id)
    }

    /// A fresh list-posts request under a new id.
    pub fn list_dispatch(&mut self) -> Dispatch {
        Dispatch {
            id: self.next_request_id(),
            operation: Operation::List,
            request: self.client.build_list_posts(),
        }
    }
}
