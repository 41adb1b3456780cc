use std::sync::Arc;

use super::error::ServiceError;
use super::jwt::{hash_token, token_matches, CredentialError, CredentialPair, JwtService};
use super::lifecycle::MediaLifecycle;
use super::media::MediaUpload;
use super::store::UserStore;
use crate::models::{User, UserUpdate};
use crate::utils::{hash_password, verify_password, Password};

/// Validated registration fields.
#[derive(Debug)]
pub struct NewAccount {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: Password,
}

/// Credential issue, verification and rotation on top of the user store.
///
/// Each identity has at most one active refresh token; issuing a new pair
/// overwrites the stored digest, which revokes the previous refresh token.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt: JwtService,
    lifecycle: MediaLifecycle,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt: JwtService, lifecycle: MediaLifecycle) -> Self {
        Self {
            users,
            jwt,
            lifecycle,
        }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    pub async fn register(
        &self,
        account: NewAccount,
        avatar: MediaUpload,
        cover_image: Option<MediaUpload>,
    ) -> Result<User, ServiceError> {
        if self
            .users
            .find_user_by_username_or_email(Some(&account.username), Some(&account.email))
            .await?
            .is_some()
        {
            return Err(ServiceError::UserAlreadyExists);
        }

        let password_hash = hash_password(&account.password)?;

        let has_cover = cover_image.is_some();
        let uploads = std::iter::once(avatar).chain(cover_image).collect();

        let users = self.users.clone();
        let user = self
            .lifecycle
            .create(uploads, move |uploaded| async move {
                let mut assets = uploaded.into_iter().map(|u| u.asset);
                let avatar = assets.next();
                let cover_image = if has_cover { assets.next() } else { None };

                let user = User::new(
                    &account.username,
                    &account.email,
                    account.full_name,
                    password_hash,
                    avatar,
                    cover_image,
                );
                users.insert_user(&user).await?;
                Ok(user)
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Unknown identity and wrong password are indistinguishable to callers.
    pub async fn login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        password: &Password,
    ) -> Result<(User, CredentialPair), ServiceError> {
        let Some(user) = self
            .users
            .find_user_by_username_or_email(username, email)
            .await?
        else {
            metrics::counter!("auth_login_failures_total").increment(1);
            return Err(ServiceError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            metrics::counter!("auth_login_failures_total").increment(1);
            tracing::warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        let pair = self.issue_credentials(&user.id).await?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok((user, pair))
    }

    /// Sign a fresh pair and record the refresh digest as the single active
    /// one for this identity.
    pub async fn issue_credentials(&self, user_id: &str) -> Result<CredentialPair, ServiceError> {
        let user = self
            .users
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::IssuanceFailed)?;

        let pair = CredentialPair {
            access_token: self.jwt.generate_access_token(&user).map_err(|e| {
                tracing::error!(error = %e, "Access token signing failed");
                ServiceError::IssuanceFailed
            })?,
            refresh_token: self.jwt.generate_refresh_token(&user.id).map_err(|e| {
                tracing::error!(error = %e, "Refresh token signing failed");
                ServiceError::IssuanceFailed
            })?,
        };

        let stored = self
            .users
            .set_refresh_token_hash(&user.id, Some(&hash_token(&pair.refresh_token)))
            .await?;
        if !stored {
            return Err(ServiceError::IssuanceFailed);
        }

        Ok(pair)
    }

    /// Resolve the identity behind an access token.
    pub async fn authenticate(&self, access_token: Option<&str>) -> Result<User, ServiceError> {
        let token = access_token
            .filter(|t| !t.is_empty())
            .ok_or(ServiceError::MissingCredential)?;
        let claims = self.jwt.validate_access_token(token)?;

        self.users
            .find_user_by_id(&claims.sub)
            .await?
            .ok_or(ServiceError::Credential(CredentialError::StaleOrRevoked))
    }

    /// Signature, then expiry, then match against the stored digest.
    pub async fn verify_refresh(&self, refresh_token: &str) -> Result<User, ServiceError> {
        let claims = self.jwt.validate_refresh_token(refresh_token)?;
        let stale = ServiceError::Credential(CredentialError::StaleOrRevoked);

        let Some(user) = self.users.find_user_by_id(&claims.sub).await? else {
            return Err(stale);
        };

        match user.refresh_token_hash.as_deref() {
            Some(stored) if token_matches(refresh_token, stored) => Ok(user),
            _ => {
                tracing::warn!(user_id = %user.id, "Refresh token is not the active one");
                Err(stale)
            }
        }
    }

    /// Exchange the active refresh token for a new pair. The presented
    /// token stops working once this returns.
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<CredentialPair, ServiceError> {
        let token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or(ServiceError::MissingCredential)?;

        let user = self.verify_refresh(token).await?;
        let pair = self.issue_credentials(&user.id).await?;

        metrics::counter!("auth_refresh_rotations_total").increment(1);
        tracing::info!(user_id = %user.id, "Refresh token rotated");
        Ok(pair)
    }

    pub async fn logout(&self, user_id: &str) -> Result<(), ServiceError> {
        self.users.set_refresh_token_hash(user_id, None).await?;
        tracing::info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    /// Does not revoke the active refresh token.
    pub async fn change_password(
        &self,
        user_id: &str,
        old_password: &Password,
        new_password: &Password,
    ) -> Result<(), ServiceError> {
        let user = self
            .users
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        if !verify_password(old_password, &user.password_hash)? {
            tracing::warn!(user_id = %user_id, "Password change rejected: wrong old password");
            return Err(ServiceError::InvalidCredentials);
        }

        let update = UserUpdate {
            password_hash: Some(hash_password(new_password)?),
            ..Default::default()
        };
        self.users
            .update_user(user_id, update)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}
