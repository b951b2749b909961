use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use log::warn;
use uuid::Uuid;

use crate::{auth::middleware::TokenSubject, error::AppError, state::AppState};

/// The caller, resolved from the token subject to a live user record.
///
/// Intended for routes behind `AuthMiddleware`, which validates the bearer token and
/// leaves the username in the request extensions. The username is then looked up
/// again so the handler gets the owner id, not just the token's claim. A subject
/// with no matching user is rejected like any other bad token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let subject = req.extensions().get::<TokenSubject>().cloned();
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move { resolve(subject, state).await.map_err(ActixError::from) })
    }
}

async fn resolve(
    subject: Option<TokenSubject>,
    state: Option<web::Data<AppState>>,
) -> Result<AuthenticatedUser, AppError> {
    let TokenSubject(username) = subject.ok_or_else(|| {
        AppError::Unauthorized(
            "No token subject in request. Ensure AuthMiddleware is active.".to_string(),
        )
    })?;
    let state =
        state.ok_or_else(|| AppError::InternalServerError("AppState is not registered".into()))?;

    match state.identity.resolve(&username).await? {
        Some(user) => Ok(AuthenticatedUser {
            id: user.id,
            username: user.username,
        }),
        None => {
            warn!("token subject {} has no user record", username);
            Err(AppError::Unauthorized("Unknown token subject".into()))
        }
    }
}
