//! Session-bound access gate.
//!
//! A caller is either [`Identity::Anonymous`] or [`Identity::Authenticated`]
//! with an owner id. Tokens are signed JWTs whose `jti` must also be present in
//! the in-process registry, so `invalidate` takes effect immediately instead of
//! waiting for `exp`.

use std::collections::HashMap;

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::claims::SessionClaims;
use super::password::PasswordCodec;
use crate::config::SessionConfig;
use crate::store::{StoreError, UserRepository};

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password.
    #[error("incorrect email or password")]
    AuthFailed,

    /// Missing, forged, expired or invalidated session token.
    #[error("not authenticated")]
    NotAuthenticated,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Authenticated(i64),
}

/// A freshly issued session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub owner_id: i64,
    pub expires_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy)]
struct LiveSession {
    owner_id: i64,
    expires_at: OffsetDateTime,
}

pub struct SessionGate {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
    codec: PasswordCodec,
    live: RwLock<HashMap<Uuid, LiveSession>>,
}

impl SessionGate {
    pub fn new(config: &SessionConfig, codec: PasswordCodec) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl: Duration::hours(config.ttl_hours),
            codec,
            live: RwLock::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn validation(&self, check_exp: bool) -> Validation {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.validate_exp = check_exp;
        validation
    }

    /// Anonymous -> Authenticated. Requires a known email and a matching password.
    #[instrument(skip(self, users, password))]
    pub async fn authenticate(
        &self,
        users: &dyn UserRepository,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let user = match users.find_by_email(email).await {
            Ok(u) => u,
            Err(StoreError::NotFound) => {
                warn!("login unknown email");
                return Err(AuthError::AuthFailed);
            }
            Err(e) => return Err(e.into()),
        };

        if !self.codec.verify(&user.password_hash, password) {
            warn!(user_id = user.id, "login invalid password");
            return Err(AuthError::AuthFailed);
        }

        let session = self.issue(user.id).await?;
        info!(user_id = user.id, "session opened");
        Ok(session)
    }

    async fn issue(&self, owner_id: i64) -> Result<Session, AuthError> {
        let now = OffsetDateTime::now_utc();
        let expires_at = now
            .checked_add(self.ttl)
            .ok_or_else(|| {
                StoreError::internal("session expiry", anyhow::anyhow!("ttl {} overflows", self.ttl))
            })?;
        let claims = SessionClaims {
            sub: owner_id,
            jti: Uuid::new_v4(),
            iat: now.unix_timestamp() as usize,
            exp: expires_at.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| StoreError::internal("sign session token", e))?;

        let mut live = self.live.write().await;
        live.retain(|_, s| s.expires_at > now);
        live.insert(claims.jti, LiveSession {
            owner_id,
            expires_at,
        });
        debug!(owner_id, jti = %claims.jti, "session issued");

        Ok(Session {
            token,
            owner_id,
            expires_at,
        })
    }

    /// Owner id of a live session.
    pub async fn identify(&self, token: &str) -> Result<i64, AuthError> {
        let claims = decode::<SessionClaims>(token, &self.decoding, &self.validation(true))
            .map_err(|e| {
                warn!(error = %e, "session token rejected");
                AuthError::NotAuthenticated
            })?
            .claims;

        let now = OffsetDateTime::now_utc();
        let entry = self.live.read().await.get(&claims.jti).copied();
        match entry {
            Some(s) if s.owner_id == claims.sub && s.expires_at > now => {
                debug!(owner_id = s.owner_id, "session verified");
                Ok(s.owner_id)
            }
            Some(_) => {
                // write lock only to drop the stale entry
                self.live.write().await.remove(&claims.jti);
                warn!(jti = %claims.jti, "session expired");
                Err(AuthError::NotAuthenticated)
            }
            None => {
                warn!(jti = %claims.jti, "session not live");
                Err(AuthError::NotAuthenticated)
            }
        }
    }

    #[cfg(test)]
    async fn live_count(&self) -> usize {
        self.live.read().await.len()
    }

    /// Authenticated -> Anonymous, effective immediately. Unknown or forged
    /// tokens are ignored.
    pub async fn invalidate(&self, token: &str) {
        let Ok(data) = decode::<SessionClaims>(token, &self.decoding, &self.validation(false))
        else {
            return;
        };
        if self.live.write().await.remove(&data.claims.jti).is_some() {
            info!(owner_id = data.claims.sub, "session closed");
        }
    }

    /// Maps an optional presented token onto the two gate states.
    pub async fn resolve(&self, token: Option<&str>) -> Identity {
        match token {
            Some(t) => match self.identify(t).await {
                Ok(owner_id) => Identity::Authenticated(owner_id),
                Err(_) => Identity::Anonymous,
            },
            None => Identity::Anonymous,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_gate() -> SessionGate {
    use super::password::HashCost;
    SessionGate::new(
        &SessionConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_hours: 72,
        },
        PasswordCodec::new(HashCost::Fast),
    )
}
