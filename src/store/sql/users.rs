use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use crate::auth::password::PasswordCodec;
use crate::auth::repo_types::{NewUser, User};
use crate::store::{StoreError, StoreResult, UserRepository};
use crate::validation::ValidationErrors;

pub struct SqlUserRepository {
    db: PgPool,
    codec: PasswordCodec,
}

impl SqlUserRepository {
    pub fn new(db: PgPool, codec: PasswordCodec) -> Self {
        Self { db, codec }
    }
}

fn email_taken() -> ValidationErrors {
    ValidationErrors::single("email", "already registered")
}

#[async_trait]
impl UserRepository for SqlUserRepository {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        user.validate()?;

        let taken: Option<i64> = sqlx::query_scalar(r#"SELECT id FROM users WHERE email = $1"#)
            .bind(&user.email)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| StoreError::internal("check email", e))?;
        if taken.is_some() {
            return Err(email_taken().into());
        }

        let password_hash = self
            .codec
            .hash(&user.password)
            .map_err(|e| StoreError::internal("hash password", e))?;

        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            // a concurrent registration won the race past the check above
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::from(email_taken())
            }
            e => StoreError::internal("insert user", e),
        })?;

        debug!(user_id = created.id, "user stored");
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| StoreError::internal("find user by email", e))?
        .ok_or(StoreError::NotFound)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| StoreError::internal("find user by id", e))?
        .ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::HashCost;
    use crate::auth::repo_types::test_user;
    use crate::store::sql::testing::test_db;

    async fn repo() -> SqlUserRepository {
        SqlUserRepository::new(test_db().await, PasswordCodec::new(HashCost::Fast))
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn create_and_find_by_email() {
        let repo = repo().await;
        assert!(matches!(
            repo.find_by_email("user@user.com").await,
            Err(StoreError::NotFound)
        ));

        let created = repo.create(test_user()).await.expect("create user");
        let found = repo.find_by_email("user@user.com").await.expect("find user");
        assert_eq!(found, created);
        assert!(PasswordCodec::new(HashCost::Fast).verify(&found.password_hash, "Password"));
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn duplicate_email_rejected() {
        let repo = repo().await;
        repo.create(test_user()).await.unwrap();
        let err = repo.create(test_user()).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref v) if v.contains("email")));
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn concurrent_duplicate_registrations_store_one_row() {
        let repo = std::sync::Arc::new(repo().await);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.create(test_user()).await })
            })
            .collect();

        let mut created = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => created += 1,
                Err(StoreError::Validation(v)) => assert!(v.contains("email")),
                Err(e) => panic!("unexpected error: {e:?}"),
            }
        }
        assert_eq!(created, 1);

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = $1")
            .bind("user@user.com")
            .fetch_one(&repo.db)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn closed_pool_is_internal_not_missing() {
        let repo = repo().await;
        repo.db.close().await;

        assert!(matches!(
            repo.find_by_email("user@user.com").await,
            Err(StoreError::Internal(_))
        ));
        assert!(matches!(repo.find_by_id(1).await, Err(StoreError::Internal(_))));
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn find_by_id() {
        let repo = repo().await;
        let created = repo.create(test_user()).await.unwrap();
        assert_eq!(repo.find_by_id(created.id).await.unwrap().name, "Parviz");
        assert!(matches!(repo.find_by_id(created.id + 100).await, Err(StoreError::NotFound)));
    }
}
