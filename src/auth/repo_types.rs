use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::validation::{check_email, check_length, ValidationErrors};

/// User record as stored. Never carries a plaintext password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String, // Argon2 PHC string, not exposed in JSON
}

/// Registration input. The plaintext password lives only here and is
/// consumed by `UserRepository::create`.
#[derive(Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_length(&mut errors, "name", &self.name, 2, 20);
        check_email(&mut errors, "email", &self.email);
        check_length(&mut errors, "password", &self.password, 6, 50);
        errors.into_result()
    }
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn test_user() -> NewUser {
    NewUser {
        name: "Parviz".into(),
        email: "user@user.com".into(),
        password: "Password".into(),
    }
}
