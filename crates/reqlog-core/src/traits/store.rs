//! Document store trait for pluggable persistence backends.

use async_trait::async_trait;

use crate::result::AppResult;

/// An append-only store of documents.
///
/// Each call to [`insert`](DocumentStore::insert) is one independent write
/// attempt: implementations must not retry, batch, or buffer. Documents are
/// never read back, updated, or deleted through this trait.
#[async_trait]
pub trait DocumentStore<Doc>: Send + Sync + std::fmt::Debug + 'static
where
    Doc: Send + Sync + 'static,
{
    /// Insert one document.
    async fn insert(&self, doc: &Doc) -> AppResult<()>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
