use std::sync::Arc;

use anyhow::Context;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    claims::TokenIdentity,
    dto::UserResponse,
    jwt::TokenService,
    password::PasswordHasher,
    repo::UserRepository,
    repo_types::NewUser,
};
use crate::error::{AuthError, RepoError};

/// Register / login / profile workflow. Holds no per-request state.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
    // Verified against when the email is unknown, so both login failures cost one Argon2 run.
    decoy_hash: Arc<OnceCell<String>>,
}

const DECOY_PASSWORD: &str = "decoy-password-for-unknown-accounts";

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Create an account. Expects `email` already normalized.
    #[instrument(skip(self, name, password))]
    pub async fn register(
        &self,
        name: String,
        email: String,
        password: String,
    ) -> Result<UserResponse, AuthError> {
        // Advisory only; the store's unique constraint is the real guard.
        match self.users.get_by_email(&email).await {
            Ok(_) => {
                warn!("email already registered");
                return Err(AuthError::EmailTaken);
            }
            Err(RepoError::NotFound) => {}
            Err(e) => return Err(AuthError::internal(e)),
        }

        let password_hash = self.hash(password).await?;

        let user = self
            .users
            .create(NewUser {
                name,
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepoError::Duplicate => {
                    warn!("email registered concurrently");
                    AuthError::EmailTaken
                }
                other => AuthError::internal(other),
            })?;

        info!(user_id = %user.id, "user registered");
        Ok(UserResponse::from(&user))
    }

    /// Exchange credentials for a token. Unknown email and wrong password fail identically.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: String) -> Result<String, AuthError> {
        let user = match self.users.get_by_email(email).await {
            Ok(u) => u,
            Err(RepoError::NotFound) => {
                let decoy = self.decoy_hash().await?;
                self.verify(password, decoy).await?;
                warn!("login unknown email");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(AuthError::internal(e)),
        };

        if !self.verify(password, user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .tokens
            .issue(user.id, &user.email)
            .map_err(AuthError::internal)?;

        info!(user_id = %user.id, "user logged in");
        Ok(token)
    }

    #[instrument(skip(self))]
    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserResponse, AuthError> {
        match self.users.get_by_id(user_id).await {
            Ok(user) => Ok(UserResponse::from(&user)),
            Err(RepoError::NotFound) => Err(AuthError::NotFound),
            Err(e) => Err(AuthError::internal(e)),
        }
    }

    /// Resolve a bearer token to the identity it was issued for.
    pub fn authenticate(&self, token: &str) -> Result<TokenIdentity, AuthError> {
        Ok(self.tokens.validate(token)?)
    }

    async fn decoy_hash(&self) -> Result<String, AuthError> {
        self.decoy_hash
            .get_or_try_init(|| self.hash(DECOY_PASSWORD.to_owned()))
            .await
            .cloned()
    }

    async fn hash(&self, password: String) -> Result<String, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .context("hash task panicked")
            .and_then(|r| r)
            .map_err(AuthError::internal)
    }

    async fn verify(&self, password: String, hash: String) -> Result<bool, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .context("verify task panicked")
            .and_then(|r| r)
            .map_err(AuthError::internal)
    }
}
