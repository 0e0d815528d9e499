//! Authentication handlers: sign-in, logout, password reset, profile, and
//! session management.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use gridbase_postgres::model::{NewPasswordResetToken, NewSession, NewUser, UpdateUser};
use gridbase_postgres::query::{
    PasswordResetTokenRepository, SessionRepository, UserRepository,
};
use ipnet::IpNet;
use jiff::{SignedDuration, Timestamp};

use crate::extract::{
    AuthSession, BearerToken, ClientMeta, Json, Path, PgPool, ValidateJson, token_digest,
};
use crate::handler::request::{
    ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SessionPathParams,
    UpdateProfileRequest,
};
use crate::handler::response::{
    ErrorResponse, LoginResponse, MessageResponse, SessionInfo, UserProfile,
};
use crate::handler::{ErrorKind, Result};
use crate::service::auth::MIN_PASSWORD_LENGTH;
use crate::service::{
    AuthHasher, MailMessage, MailerService, PasswordStrength, RESET_TOKEN_LIFETIME,
    SESSION_LIFETIME, ServiceConfig, ServiceState, auth,
};

/// Tracing target for authentication handlers.
const TRACING_TARGET: &str = "gridbase_server::handler::auth";

/// Fixed response for forgot-password, identical whether or not the email
/// exists, so the endpoint cannot be used as an account oracle.
const FORGOT_PASSWORD_MESSAGE: &str =
    "If that email address is registered, a reset link has been sent.";

/// Signs a user in, creating the account on first sign-in.
#[tracing::instrument(skip_all, fields(email = %request.email))]
async fn login(
    PgPool(mut conn): PgPool,
    State(hasher): State<AuthHasher>,
    State(password_strength): State<PasswordStrength>,
    client: ClientMeta,
    ValidateJson(request): ValidateJson<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>)> {
    let user = match conn.find_user_by_email(&request.email).await? {
        Some(user) => {
            let valid = user
                .password_hash
                .as_deref()
                .is_some_and(|hash| hasher.verify_password(&request.password, hash));
            if !valid {
                return Err(ErrorKind::InvalidCredentials.into_error());
            }
            user
        }
        None => {
            // First sign-in creates the account.
            if !password_strength.meets_minimum_length(&request.password) {
                return Err(ErrorKind::PasswordTooShort.into_error());
            }

            let score = password_strength.score(&request.password, &[&request.email]);
            if score < 2 {
                tracing::debug!(
                    target: TRACING_TARGET,
                    score,
                    "weak password accepted on account creation"
                );
            }

            let display_name = request
                .display_name
                .clone()
                .unwrap_or_else(|| default_display_name(&request.email));
            let password_hash = hasher.hash_password(&request.password).map_err(|e| {
                ErrorKind::InternalServerError.with_context(e.to_string()).into_static()
            })?;

            let user = conn
                .create_user(NewUser {
                    email_address: request.email.clone(),
                    display_name,
                    password_hash: Some(password_hash),
                })
                .await?;

            tracing::info!(
                target: TRACING_TARGET,
                user_id = %user.id,
                "account created on first sign-in"
            );
            user
        }
    };

    let token = auth::generate_token();
    let expires_at = Timestamp::now()
        + SignedDuration::from_secs(SESSION_LIFETIME.as_secs() as i64);

    let session = conn
        .create_session(NewSession {
            user_id: user.id,
            token_digest: token.digest,
            ip_address: client.ip.map(IpNet::from),
            user_agent: client.user_agent,
            expires_at: jiff_diesel::Timestamp::from(expires_at),
        })
        .await?;

    tracing::info!(
        target: TRACING_TARGET,
        user_id = %user.id,
        session_id = %session.id,
        "session issued"
    );

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            token: token.raw,
            user: user.into(),
        }),
    ))
}

fn login_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Sign in")
        .description("Signs in with email and password; the first sign-in creates the account.")
        .response::<200, Json<LoginResponse>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
}

/// Destroys the presented session.
///
/// Idempotent: succeeds whether or not the token still resolves, so a
/// repeated logout is not an error.
#[tracing::instrument(skip_all)]
async fn logout(
    PgPool(mut conn): PgPool,
    BearerToken(token): BearerToken,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    if let Some(token) = token {
        let digest = token_digest(&token);
        if let Some(session) = conn.find_live_session_by_digest(&digest).await? {
            conn.delete_session(session.id).await?;
            tracing::info!(
                target: TRACING_TARGET,
                session_id = %session.id,
                "session destroyed"
            );
        }
    }

    Ok((StatusCode::OK, Json(MessageResponse::new("Signed out."))))
}

fn logout_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Sign out")
        .description("Destroys the presented session. Safe to repeat.")
        .response::<200, Json<MessageResponse>>()
}

/// Starts a password reset.
///
/// Responds identically whether or not the account exists.
#[tracing::instrument(skip_all)]
async fn forgot_password(
    PgPool(mut conn): PgPool,
    State(mailer): State<MailerService>,
    State(config): State<ServiceConfig>,
    ValidateJson(request): ValidateJson<ForgotPasswordRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    if let Some(user) = conn.find_user_by_email(&request.email).await? {
        let token = auth::generate_token();
        let expires_at = Timestamp::now()
            + SignedDuration::from_secs(RESET_TOKEN_LIFETIME.as_secs() as i64);

        conn.create_reset_token(NewPasswordResetToken {
            user_id: user.id,
            token_digest: token.digest,
            expires_at: jiff_diesel::Timestamp::from(expires_at),
        })
        .await?;

        let message = MailMessage {
            to: user.email_address.clone(),
            subject: "Reset your password".to_string(),
            body: config.password_reset_link(&token.raw),
        };

        // Mail failures are logged, not surfaced: the response must not
        // differ from the unknown-address case.
        if let Err(err) = mailer.send(&message).await {
            tracing::error!(
                target: TRACING_TARGET,
                user_id = %user.id,
                error = %err,
                "failed to send reset mail"
            );
        }
    }

    Ok((
        StatusCode::OK,
        Json(MessageResponse::new(FORGOT_PASSWORD_MESSAGE)),
    ))
}

fn forgot_password_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Request a password reset")
        .description("Sends a reset link when the address is registered. The response never reveals whether it is.")
        .response::<200, Json<MessageResponse>>()
        .response::<400, Json<ErrorResponse>>()
}

/// Completes a password reset.
///
/// Consumes the single-use token, sets the new password, and destroys all
/// of the account's sessions.
#[tracing::instrument(skip_all)]
async fn reset_password(
    PgPool(mut conn): PgPool,
    State(hasher): State<AuthHasher>,
    ValidateJson(request): ValidateJson<ResetPasswordRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    if request.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ErrorKind::PasswordTooShort.into_error());
    }

    let digest = token_digest(&request.token);
    let Some(token) = conn.find_reset_token_by_digest(&digest).await? else {
        return Err(ErrorKind::InvalidToken.into_error());
    };

    if token.used_at.is_some() {
        return Err(ErrorKind::UsedToken.into_error());
    }
    if !token.is_redeemable_at(Timestamp::now()) {
        return Err(ErrorKind::ExpiredToken.into_error());
    }

    let password_hash = hasher.hash_password(&request.password).map_err(|e| {
        ErrorKind::InternalServerError.with_context(e.to_string()).into_static()
    })?;

    conn.update_user(
        token.user_id,
        UpdateUser {
            display_name: None,
            password_hash: Some(password_hash),
        },
    )
    .await?;
    conn.mark_reset_token_used(token.id).await?;

    // Password reset destroys every session of the account.
    let revoked = conn.delete_sessions_for_user(token.user_id).await?;

    tracing::info!(
        target: TRACING_TARGET,
        user_id = %token.user_id,
        revoked_sessions = revoked,
        "password reset completed"
    );

    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Password updated. Please sign in again.")),
    ))
}

fn reset_password_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Complete a password reset")
        .description("Consumes a reset token and sets a new password.")
        .response::<200, Json<MessageResponse>>()
        .response::<400, Json<ErrorResponse>>()
}

/// Returns the caller's profile.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id))]
async fn me(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
) -> Result<(StatusCode, Json<UserProfile>)> {
    let user = conn
        .find_user_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ErrorKind::Unauthorized.into_error())?;

    Ok((StatusCode::OK, Json(user.into())))
}

fn me_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get profile")
        .response::<200, Json<UserProfile>>()
        .response::<401, Json<ErrorResponse>>()
}

/// Updates the caller's display name or password.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id))]
async fn update_me(
    PgPool(mut conn): PgPool,
    State(hasher): State<AuthHasher>,
    AuthSession(auth): AuthSession,
    ValidateJson(request): ValidateJson<UpdateProfileRequest>,
) -> Result<(StatusCode, Json<UserProfile>)> {
    let password_hash = match request.password {
        Some(password) => {
            if password.chars().count() < MIN_PASSWORD_LENGTH {
                return Err(ErrorKind::PasswordTooShort.into_error());
            }
            Some(hasher.hash_password(&password).map_err(|e| {
                ErrorKind::InternalServerError.with_context(e.to_string()).into_static()
            })?)
        }
        None => None,
    };

    if request.display_name.is_none() && password_hash.is_none() {
        return Err(ErrorKind::InvalidRequest
            .with_message("Nothing to update")
            .into_static());
    }

    let user = conn
        .update_user(
            auth.user_id,
            UpdateUser {
                display_name: request.display_name,
                password_hash,
            },
        )
        .await?;

    Ok((StatusCode::OK, Json(user.into())))
}

fn update_me_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update profile")
        .response::<200, Json<UserProfile>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
}

/// Lists the caller's live sessions.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id))]
async fn list_sessions(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
) -> Result<(StatusCode, Json<Vec<SessionInfo>>)> {
    let sessions = conn.list_sessions_for_user(auth.user_id).await?;
    let sessions: Vec<SessionInfo> = sessions.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(sessions)))
}

fn list_sessions_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List sessions")
        .response::<200, Json<Vec<SessionInfo>>>()
        .response::<401, Json<ErrorResponse>>()
}

/// Revokes one of the caller's sessions.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id))]
async fn revoke_session(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<SessionPathParams>,
) -> Result<StatusCode> {
    let owned = conn
        .list_sessions_for_user(auth.user_id)
        .await?
        .into_iter()
        .any(|session| session.id == path_params.session_id);
    if !owned {
        return Err(ErrorKind::NotFound.with_message("Session not found").into_static());
    }

    conn.delete_session(path_params.session_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

fn revoke_session_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Revoke session")
        .response::<204, ()>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Derives a display name from an email's local part.
fn default_display_name(email: &str) -> String {
    email
        .split('@')
        .next()
        .filter(|local| !local.is_empty())
        .unwrap_or("user")
        .to_string()
}

/// Returns routes for authentication and session management.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/auth/login", post_with(login, login_docs))
        .api_route("/auth/logout", post_with(logout, logout_docs))
        .api_route(
            "/auth/forgot-password",
            post_with(forgot_password, forgot_password_docs),
        )
        .api_route(
            "/auth/reset-password",
            post_with(reset_password, reset_password_docs),
        )
        .api_route(
            "/auth/me",
            get_with(me, me_docs).patch_with(update_me, update_me_docs),
        )
        .api_route("/auth/sessions", get_with(list_sessions, list_sessions_docs))
        .api_route(
            "/auth/sessions/{session_id}",
            delete_with(revoke_session, revoke_session_docs),
        )
        .with_path_items(|item| item.tag("Authentication"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_local_part() {
        assert_eq!(default_display_name("ana@example.com"), "ana");
        assert_eq!(default_display_name("@example.com"), "user");
    }
}
