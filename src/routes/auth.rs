use crate::{
    auth::{AuthResponse, CredentialsRequest, RegisterResponse},
    error::AppError,
    state::AppState,
};
use actix_web::{post, web, HttpResponse, Responder};
use log::info;
use validator::Validate;

/// Register a new user
///
/// Creates the account and returns its id. Does not log the user in.
///
/// ## Responses:
/// - `201 Created`: `{ "user_id": ... }`
/// - `409 Conflict`: the username is taken.
/// - `422 Unprocessable Entity`: username or password fails validation.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    credentials: web::Json<CredentialsRequest>,
) -> Result<impl Responder, AppError> {
    credentials.validate()?;

    let user_id = state
        .identity
        .sign_up(&credentials.username, &credentials.password)
        .await?;

    Ok(HttpResponse::Created().json(RegisterResponse { user_id }))
}

/// Login user
///
/// Checks the credentials and returns a bearer token whose subject is the username.
///
/// ## Responses:
/// - `200 OK`: `{ "access_token": ... }`
/// - `401 Unauthorized`: unknown user or wrong password (indistinguishable).
/// - `422 Unprocessable Entity`: username or password fails validation.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    credentials: web::Json<CredentialsRequest>,
) -> Result<impl Responder, AppError> {
    credentials.validate()?;

    let username = state
        .identity
        .sign_in(&credentials.username, &credentials.password)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;

    let access_token = state.tokens.issue(&username)?;
    info!("issued token for {}", username);

    Ok(HttpResponse::Ok().json(AuthResponse { access_token }))
}
