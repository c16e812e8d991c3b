use async_trait::async_trait;

use crate::auth::{error::StoreError, repo_types::User};

/// Persistence for user credentials, shared by every request handler.
///
/// Implementations handle their own synchronization; callers hold them behind
/// an `Arc` and never lock around calls.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Creates the backing table if it does not exist yet. Safe to call repeatedly.
    async fn initialize(&self) -> Result<(), StoreError>;

    /// Exact match on both fields. A mismatch is `Ok(None)`.
    async fn find_by_credentials(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Inserts `count` new synthetic users and returns how many rows were written.
    async fn seed_users(&self, count: u64) -> Result<u64, StoreError>;

    /// Removes every user, returning how many were deleted.
    async fn reset_users(&self) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
