use argon2::{
    password_hash::{Encoding, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{DateTime, Duration, Utc};
use log::info;
use rand::rngs::OsRng;
use std::sync::Arc;
use thiserror::Error;

use crate::{Claims, Database, DatabaseError, NewUser, TokenError, TokenSigner, UserData};

pub struct Auth {
    db: Arc<dyn Database>,
    argon: Argon2<'static>,
    signer: TokenSigner,
}

/// How tokens are signed and for how long they last
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub secret_key: String,
    pub token_lifetime: Duration,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Username or password is incorrect
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// The presented token can't be trusted
    #[error(transparent)]
    Token(#[from] TokenError),
    /// Something else went wrong with the database
    #[error(transparent)]
    Db(DatabaseError),
    #[error("HashError: {0}")]
    HashError(String),
    /// A token could not be issued
    #[error("Could not issue token: {0}")]
    Issue(TokenError),
}

/// A freshly issued bearer token
#[derive(Debug)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserData,
}

impl Auth {
    pub fn new(db: &Arc<dyn Database>, settings: AuthSettings) -> Self {
        Self {
            db: db.clone(),
            argon: Argon2::default(),
            signer: TokenSigner::new(settings.secret_key, settings.token_lifetime),
        }
    }

    /// Logs in a user, returning a signed token
    pub async fn login(&self, credentials: Credentials) -> Result<IssuedToken, AuthError> {
        let user = self
            .db
            .user_by_username(&credentials.username)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound {
                    resource: _,
                    identifier: _,
                } => AuthError::InvalidCredentials,
                err => AuthError::Db(err),
            })?;

        let stored_password = PasswordHash::parse(&user.password, Encoding::default())
            .map_err(|e| AuthError::HashError(e.to_string()))?;

        self.argon
            .verify_password(credentials.password.as_bytes(), &stored_password)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let (token, claims) = self
            .signer
            .issue(user.id, &user.username, Utc::now())
            .map_err(AuthError::Issue)?;
        info!("Issued token for {}", user.username);

        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at(),
            user,
        })
    }

    /// Creates a user that can log in
    pub async fn register(&self, credentials: Credentials) -> Result<UserData, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hashed_password = self
            .argon
            .hash_password(credentials.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let user = self
            .db
            .create_user(NewUser {
                username: credentials.username,
                password: hashed_password,
            })
            .await
            .map_err(AuthError::Db)?;

        info!("Registered user {}", user.username);
        Ok(user)
    }

    /// Returns the claims of a token if its signature and expiry check out
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        Ok(self.signer.verify(token, Utc::now())?)
    }
}

#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}
