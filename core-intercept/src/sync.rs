//! Background sync handlers
//!
//! A sync event carries only a tag. The worker dispatches it to the handler
//! registered for that tag; tags with no handler are ignored.

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait SyncHandler: Send + Sync {
    /// Tag this handler answers to, e.g. `"sync-bookmarks"`.
    fn tag(&self) -> &str;

    async fn run(&self) -> Result<()>;
}
