use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse,
            ResetPasswordRequest, SignupRequest, UpdatePasswordRequest, UserResponse,
        },
        extractors::CurrentUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::User,
        reset::ResetToken,
    },
    error::{is_unique_violation, ApiError},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/users/signup", post(signup))
        .route("/api/v1/users/login", post(login))
        .route("/api/v1/users/forgot-password", post(forgot_password))
        .route("/api/v1/users/reset-password/:token", patch(reset_password))
        .route("/api/v1/users/update-password", patch(update_password))
        .route("/api/v1/users/me", get(me))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.validate()?;

    let hash = hash_password(&payload.password)?;
    let role = payload.role.unwrap_or_default();

    let user = User::create(&state.db, payload.name.trim(), &payload.email, &hash, role)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                warn!(email = %payload.email, "signup with registered email");
                ApiError::Validation("email already registered".into())
            } else {
                e.into()
            }
        })?;

    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user signed up");
    Ok((StatusCode::CREATED, Json(AuthResponse::new(token, user))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(ApiError::BadRequest(
            "please provide email and password".into(),
        ));
    };
    let email = email.trim().to_lowercase();

    // Unknown email and wrong password get the same answer, so the response
    // cannot be used to probe which addresses are registered.
    let user = User::find_by_email_with_secrets(&state.db, &email).await?;
    let verified = match &user {
        Some(user) => match user.password_hash.as_deref() {
            Some(hash) => verify_password(&password, hash)?,
            None => false,
        },
        None => false,
    };
    let Some(user) = user.filter(|_| verified) else {
        warn!(email = %email, "failed login");
        return Err(ApiError::Unauthorized("incorrect email or password".into()));
    };

    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(AuthResponse::new(token, user)))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();
    let sent = MessageResponse {
        status: "success",
        message: "if that account exists, a reset token has been sent to it",
    };

    // Same body whether or not the email is registered.
    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        info!("forgot-password for unknown email");
        return Ok(Json(sent));
    };

    let reset = ResetToken::generate();
    User::set_reset_token(&state.db, user.id, &reset.hashed, reset.expires_at).await?;

    let reset_url = format!(
        "{}/api/v1/users/reset-password/{}",
        state.config.public_url, reset.plain
    );
    let body = format!(
        "Forgot your password? Submit a PATCH request with your new password and \
         password confirmation to: {reset_url}\n\
         If you didn't forget your password, please ignore this email."
    );

    if let Err(e) = state
        .mailer
        .send(
            &user.email,
            "Your password reset token (valid for 10 minutes)",
            &body,
        )
        .await
    {
        error!(error = %e, user_id = %user.id, "reset email failed, clearing token");
        User::clear_reset_token(&state.db, user.id).await?;
        return Err(ApiError::Internal(anyhow::anyhow!(
            "failed to send password reset email: {e}"
        )));
    }

    info!(user_id = %user.id, "reset token emailed");
    Ok(Json(sent))
}

// The plaintext token must not end up in the request span.
#[instrument(skip(state, payload, token))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let hashed = ResetToken::hash(&token);
    let user = User::find_by_reset_token(&state.db, &hashed, OffsetDateTime::now_utc())
        .await?
        .ok_or_else(|| {
            warn!("reset attempt with invalid or expired token");
            ApiError::BadRequest("token is invalid or has expired".into())
        })?;

    crate::auth::dto::validate_new_password(&payload.password, &payload.password_confirm)?;

    let hash = hash_password(&payload.password)?;
    User::update_password(&state.db, user.id, &hash).await?;

    // Auto-login after a successful reset.
    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, "password reset");
    Ok(Json(AuthResponse::new(token, user)))
}

#[instrument(skip(state, payload, current))]
pub async fn update_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let CurrentUser(user) = current;

    let with_secrets = User::find_by_id_with_secrets(&state.db, user.id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("user no longer exists".into()))?;
    let stored_hash = with_secrets
        .password_hash
        .as_deref()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("user row missing password hash")))?;

    if !verify_password(&payload.password_current, stored_hash)? {
        warn!(user_id = %user.id, "update-password with wrong current password");
        return Err(ApiError::Unauthorized(
            "your current password is wrong".into(),
        ));
    }

    crate::auth::dto::validate_new_password(&payload.password, &payload.password_confirm)?;

    let hash = hash_password(&payload.password)?;
    User::update_password(&state.db, user.id, &hash).await?;

    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, "password updated");
    Ok(Json(AuthResponse::new(token, user)))
}

#[instrument(skip_all)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::new(user))
}
