//! Authentication middleware and extractors.
//!
//! Provides extractors that resolve the request's [`Identity`] once, instead
//! of re-checking authentication flags inside every handler.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CurrentUser, Identity, SessionKey, session_keys};

/// Extractor that requires a logged-in user.
///
/// Rejects with `AuthenticationRequired` (401) when the session holds no
/// user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = session_from_parts(parts)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await?
            .ok_or(AppError::AuthenticationRequired)?;

        Ok(Self(user))
    }
}

/// Extractor resolving the request to its stable [`Identity`].
///
/// Authenticated sessions resolve to `Identity::User`; anonymous requests
/// get (or lazily create and persist) a session key and resolve to
/// `Identity::Anonymous`. Session-store failures propagate as fatal.
pub struct ResolvedIdentity(pub Identity);

impl<S> FromRequestParts<S> for ResolvedIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = session_from_parts(parts)?;

        if let Some(user) = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await?
        {
            return Ok(Self(Identity::User(user.id)));
        }

        let key = match session
            .get::<SessionKey>(session_keys::SESSION_KEY)
            .await?
        {
            Some(key) => key,
            None => {
                let key = SessionKey::generate();
                session.insert(session_keys::SESSION_KEY, &key).await?;
                key
            }
        };

        Ok(Self(Identity::Anonymous(key)))
    }
}

fn session_from_parts(parts: &Parts) -> Result<Session, AppError> {
    parts
        .extensions
        .get::<Session>()
        .cloned()
        .ok_or_else(|| AppError::Internal("session layer missing".to_owned()))
}

/// Helper to set the current user in the session (login).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
