use std::sync::Arc;

use crate::application::credentials::CredentialVerifier;
use crate::application::token_service::{TokenBundle, TokenPayload, TokenService};
use crate::errors::AppError;
use ordernest_types::domain::user::{NewUser, User};
use ordernest_types::ports::order_repository::RepoError;
use ordernest_types::ports::user_repository::UserRepository;

const INVALID_CREDENTIALS: &str = "invalid credentials";

pub struct AuthService<R: UserRepository> {
    repo: R,
    credentials: CredentialVerifier,
    tokens: Arc<TokenService>,
}

impl<R: UserRepository> AuthService<R> {
    pub fn new(repo: R, credentials: CredentialVerifier, tokens: Arc<TokenService>) -> Self {
        Self {
            repo,
            credentials,
            tokens,
        }
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<User, AppError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AppError::BadRequest(
                "username and password are required".into(),
            ));
        }

        let credentials = self.credentials;
        let plaintext = password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || credentials.hash(&plaintext))
            .await
            .map_err(anyhow::Error::from)?
            .map_err(anyhow::Error::from)?;

        let user = self
            .repo
            .create_user(NewUser {
                username: username.to_owned(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepoError::Conflict(_) => AppError::BadRequest("username already taken".into()),
                other => {
                    tracing::error!(error = %other, "user repository create failed");
                    AppError::Internal(anyhow::anyhow!(other.to_string()))
                }
            })?;
        tracing::info!(user_id = user.id, "user registered");
        Ok(user)
    }

    /// Unknown usernames and wrong passwords fail identically.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenBundle, AppError> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::BadRequest(INVALID_CREDENTIALS.into()));
        }

        let user = match self.repo.get_by_username(username).await {
            Ok(user) => user,
            Err(RepoError::NotFound) => {
                tracing::info!("login rejected: unknown user");
                return Err(AppError::BadRequest(INVALID_CREDENTIALS.into()));
            }
            Err(e) => {
                tracing::error!(error = %e, "user lookup failed");
                return Err(AppError::Internal(anyhow::anyhow!(e.to_string())));
            }
        };

        let credentials = self.credentials;
        let stored = user.password_hash.clone();
        let plaintext = password.to_owned();
        let matches = tokio::task::spawn_blocking(move || credentials.verify(&stored, &plaintext))
            .await
            .map_err(anyhow::Error::from)?;
        if !matches {
            tracing::info!(user_id = user.id, "login rejected: password mismatch");
            return Err(AppError::BadRequest(INVALID_CREDENTIALS.into()));
        }

        let payload = TokenPayload {
            aud: user.id.to_string(),
            name: user.username,
        };
        let bundle = self.tokens.generate(&payload).map_err(|e| {
            tracing::error!(error = %e, "token generation failed");
            AppError::Internal(e.into())
        })?;
        tracing::info!(user_id = user.id, jti = %bundle.jti, "login succeeded");
        Ok(bundle)
    }

    /// Creates the account unless the username already exists.
    pub async fn ensure_user(&self, username: &str, password: &str) -> Result<(), AppError> {
        match self.register(username, password).await {
            Ok(_) => Ok(()),
            Err(AppError::BadRequest(reason)) => {
                if self.repo.get_by_username(username).await.is_ok() {
                    Ok(())
                } else {
                    Err(AppError::BadRequest(reason))
                }
            }
            Err(e) => Err(e),
        }
    }
}
