use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::auth::{
    error::StoreError,
    repo_types::User,
    seed,
    store::CredentialStore,
};

pub const SQLITE_INIT: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id            BLOB PRIMARY KEY NOT NULL,
        username      TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at    TEXT NOT NULL
    )
"#;

/// SQLite-backed credential store.
#[derive(Debug)]
pub struct SqliteCredentialStore {
    db: SqlitePool,
    batch_size: usize,
    // Serializes seed/reset so concurrent callers get disjoint usernames.
    write_lock: Mutex<()>,
}

impl SqliteCredentialStore {
    pub fn new(db: SqlitePool, batch_size: usize) -> Self {
        Self {
            db,
            batch_size: batch_size.max(1),
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        sqlx::query(SQLITE_INIT).execute(&self.db).await?;
        Ok(())
    }

    async fn find_by_credentials(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE username = ?1 AND password_hash = ?2
            LIMIT 1
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    /// Numbering starts at `COUNT(users) + 1`. Rows that were not seeded shift
    /// the range, and a generated username that already exists fails the whole
    /// call with `StoreError::Conflict`.
    async fn seed_users(&self, count: u64) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.db.begin().await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *tx)
            .await?;
        let start = existing.max(0) as u64 + 1;

        let end = start + count;
        let mut next = start;
        let mut inserted = 0u64;
        while next < end {
            let len = (end - next).min(self.batch_size as u64);
            let chunk: Vec<_> = seed::generate(next, len).collect();
            next += len;

            let now = OffsetDateTime::now_utc();
            let mut qb = QueryBuilder::<Sqlite>::new(
                "INSERT INTO users (id, username, password_hash, created_at) ",
            );
            qb.push_values(chunk, |mut row, user| {
                row.push_bind(Uuid::new_v4())
                    .push_bind(user.username)
                    .push_bind(user.password_hash)
                    .push_bind(now);
            });
            let res = qb.build().execute(&mut *tx).await?;
            inserted += res.rows_affected();
            debug!(inserted, total = count, "seed batch written");
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn reset_users(&self) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock().await;
        let res = sqlx::query("DELETE FROM users").execute(&self.db).await?;
        Ok(res.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}

#[cfg(test)]
impl SqliteCredentialStore {
    /// Single-connection in-memory store; the connection is never recycled so
    /// the database lives as long as the pool.
    pub(crate) async fn in_memory(batch_size: usize) -> Self {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        let store = Self::new(pool, batch_size);
        store.initialize().await.expect("initialize schema");
        store
    }

    pub(crate) async fn insert_user(&self, username: &str, password_hash: &str) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(id)
        .bind(username)
        .bind(password_hash)
        .bind(OffsetDateTime::now_utc())
        .execute(&self.db)
        .await
        .expect("insert user");
        id
    }

    pub(crate) async fn usernames(&self) -> Vec<String> {
        sqlx::query_scalar("SELECT username FROM users ORDER BY created_at, username")
            .fetch_all(&self.db)
            .await
            .expect("list usernames")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let store = SqliteCredentialStore::in_memory(100).await;
        store.initialize().await.expect("second initialize");
        store.insert_user("alice", "abc123").await;
        store.initialize().await.expect("third initialize");
        assert_eq!(store.usernames().await, vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn find_on_empty_store_is_none() {
        let store = SqliteCredentialStore::in_memory(100).await;
        let found = store.find_by_credentials("alice", "abc123").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn find_requires_exact_match_on_both_fields() {
        let store = SqliteCredentialStore::in_memory(100).await;
        let id = store.insert_user("alice", "abc123").await;

        let user = store
            .find_by_credentials("alice", "abc123")
            .await
            .unwrap()
            .expect("alice should match");
        assert_eq!(user.id, id);
        assert_eq!(user.username, "alice");

        for (name, hash) in [
            ("alice", "ABC123"),
            ("Alice", "abc123"),
            ("alice", "abc123 "),
            ("alice", ""),
            ("bob", "abc123"),
        ] {
            let found = store.find_by_credentials(name, hash).await.unwrap();
            assert!(found.is_none(), "{name}/{hash} should not match");
        }
    }

    #[tokio::test]
    async fn special_characters_are_plain_data() {
        let store = SqliteCredentialStore::in_memory(100).await;
        store.insert_user("alice", "abc123").await;
        let found = store
            .find_by_credentials("' OR '1'='1", "' OR '1'='1")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn seed_on_empty_store_inserts_exactly_n() {
        let store = SqliteCredentialStore::in_memory(7).await;
        let inserted = store.seed_users(25).await.unwrap();
        assert_eq!(inserted, 25);

        let names = store.usernames().await;
        assert_eq!(names.len(), 25);
        assert_eq!(names.iter().collect::<HashSet<_>>().len(), 25);
    }

    #[tokio::test]
    async fn seeded_credentials_are_found() {
        let store = SqliteCredentialStore::in_memory(4).await;
        store.seed_users(10).await.unwrap();

        for n in 1..=10 {
            let user = store
                .find_by_credentials(&seed::username_for(n), &seed::password_hash_for(n))
                .await
                .unwrap()
                .unwrap_or_else(|| panic!("seeded user {n} missing"));
            assert_eq!(user.username, seed::username_for(n));

            let wrong = store
                .find_by_credentials(&seed::username_for(n), &seed::password_hash_for(n + 1))
                .await
                .unwrap();
            assert!(wrong.is_none());
        }
    }

    #[tokio::test]
    async fn seed_zero_is_a_no_op() {
        let store = SqliteCredentialStore::in_memory(10).await;
        assert_eq!(store.seed_users(0).await.unwrap(), 0);
        assert!(store.usernames().await.is_empty());
    }

    #[tokio::test]
    async fn repeated_seeding_appends_new_users() {
        let store = SqliteCredentialStore::in_memory(10).await;
        assert_eq!(store.seed_users(5).await.unwrap(), 5);
        assert_eq!(store.seed_users(5).await.unwrap(), 5);

        let names = store.usernames().await;
        assert_eq!(names.len(), 10);
        assert_eq!(names.iter().collect::<HashSet<_>>().len(), 10);
        assert!(names.contains(&seed::username_for(10)));
    }

    #[tokio::test]
    async fn concurrent_seeds_produce_disjoint_usernames() {
        let store = Arc::new(SqliteCredentialStore::in_memory(16).await);
        let (a, b) = tokio::join!(store.seed_users(40), store.seed_users(40));
        assert_eq!(a.unwrap(), 40);
        assert_eq!(b.unwrap(), 40);

        let names = store.usernames().await;
        assert_eq!(names.len(), 80);
        assert_eq!(names.iter().collect::<HashSet<_>>().len(), 80);
    }

    #[tokio::test]
    async fn conflicting_seed_rolls_back_and_reports_conflict() {
        let store = SqliteCredentialStore::in_memory(2).await;
        // One existing row, so seeding starts at user2; user4 lands in the second batch.
        store.insert_user(&seed::username_for(4), "x").await;

        let err = store.seed_users(5).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)), "got {err:?}");
        assert_eq!(store.usernames().await, vec![seed::username_for(4)]);
    }

    #[tokio::test]
    async fn numbering_continues_after_existing_rows() {
        let store = SqliteCredentialStore::in_memory(10).await;
        store.insert_user("alice", "abc123").await;
        assert_eq!(store.seed_users(2).await.unwrap(), 2);

        let names = store.usernames().await;
        assert!(!names.contains(&seed::username_for(1)));
        assert!(names.contains(&seed::username_for(2)));
        assert!(names.contains(&seed::username_for(3)));
    }

    #[tokio::test]
    async fn uneven_batches_write_every_user() {
        let store = SqliteCredentialStore::in_memory(3).await;
        assert_eq!(store.seed_users(10).await.unwrap(), 10);
        for n in [1, 3, 4, 9, 10] {
            let found = store
                .find_by_credentials(&seed::username_for(n), &seed::password_hash_for(n))
                .await
                .unwrap();
            assert!(found.is_some(), "user {n} missing");
        }
        assert!(store
            .find_by_credentials(&seed::username_for(11), &seed::password_hash_for(11))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn reset_removes_everyone() {
        let store = SqliteCredentialStore::in_memory(10).await;
        store.seed_users(12).await.unwrap();
        assert_eq!(store.reset_users().await.unwrap(), 12);
        assert!(store.usernames().await.is_empty());
        assert_eq!(store.seed_users(3).await.unwrap(), 3);
        assert_eq!(store.usernames().await[0], seed::username_for(1));
    }

    #[tokio::test]
    async fn ping_fails_once_pool_is_closed() {
        let store = SqliteCredentialStore::in_memory(10).await;
        store.ping().await.expect("ping open pool");
        store.db.close().await;
        assert!(store.ping().await.is_err());
    }
}
