use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::Arena;
use crate::auth::password::PasswordCodec;
use crate::auth::repo_types::{NewUser, User};
use crate::store::{StoreError, StoreResult, UserRepository};
use crate::validation::ValidationErrors;

pub struct MemoryUserRepository {
    codec: PasswordCodec,
    users: RwLock<Arena<User>>,
}

impl MemoryUserRepository {
    pub fn new(codec: PasswordCodec) -> Self {
        Self {
            codec,
            users: RwLock::new(Arena::default()),
        }
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        user.validate()?;
        let password_hash = self
            .codec
            .hash(&user.password)
            .map_err(|e| StoreError::internal("hash password", e))?;

        // check and insert under one write lock so two registrations can't race
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(ValidationErrors::single("email", "already registered").into());
        }
        let NewUser { name, email, .. } = user;
        let created = users
            .insert_with(|id| User {
                id,
                name,
                email,
                password_hash,
            })
            .clone();
        debug!(user_id = created.id, "user stored");
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<User> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<User> {
        self.users
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::HashCost;
    use crate::auth::repo_types::test_user;

    fn repo() -> MemoryUserRepository {
        MemoryUserRepository::new(PasswordCodec::new(HashCost::Fast))
    }

    #[tokio::test]
    async fn create_assigns_id_and_hashes_password() {
        let repo = repo();
        let user = repo.create(test_user()).await.expect("create user");
        assert_eq!(user.id, 1);
        assert_eq!(user.name, "Parviz");
        assert_ne!(user.password_hash, "Password");
        assert!(PasswordCodec::new(HashCost::Fast).verify(&user.password_hash, "Password"));
    }

    #[tokio::test]
    async fn create_rejects_invalid_user_without_storing() {
        let repo = repo();
        let mut bad = test_user();
        bad.password = "123".into();
        let err = repo.create(bad).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref v) if v.contains("password")));
        assert!(matches!(
            repo.find_by_email("user@user.com").await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn duplicate_email_is_a_validation_failure() {
        let repo = repo();
        repo.create(test_user()).await.unwrap();
        let err = repo.create(test_user()).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref v) if v.contains("email")));
    }

    #[tokio::test]
    async fn find_by_email_round_trip() {
        let repo = repo();
        assert!(matches!(
            repo.find_by_email("user@password.com").await,
            Err(StoreError::NotFound)
        ));

        let created = repo.create(test_user()).await.unwrap();
        let found = repo.find_by_email("user@user.com").await.unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn find_by_id() {
        let repo = repo();
        let created = repo.create(test_user()).await.unwrap();
        assert_eq!(repo.find_by_id(created.id).await.unwrap().email, "user@user.com");
        assert!(matches!(repo.find_by_id(45).await, Err(StoreError::NotFound)));
    }
}
