use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::{error, warn};

/// Work factor for password hashing. Picked by whoever builds the store,
/// never read from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashCost {
    /// Argon2id defaults (19 MiB, 2 passes).
    Production,
    /// Minimum parameters, for tests and throwaway local runs.
    Fast,
}

#[derive(Debug, Clone)]
pub struct PasswordCodec {
    cost: HashCost,
}

impl PasswordCodec {
    pub fn new(cost: HashCost) -> Self {
        Self { cost }
    }

    fn argon2(&self) -> anyhow::Result<Argon2<'static>> {
        let params = match self.cost {
            HashCost::Production => Params::default(),
            HashCost::Fast => Params::new(Params::MIN_M_COST, Params::MIN_T_COST, 1, None)
                .map_err(|e| anyhow::anyhow!(e.to_string()))?,
        };
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    pub fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()?
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// Wrong password and unparseable digest both come back as `false`.
    pub fn verify(&self, hash: &str, candidate: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "argon2 parse hash error");
                return false;
            }
        };
        // parameters come from the digest itself
        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }
}
