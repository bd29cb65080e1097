use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
    },
    error::ApiError,
    state::AppState,
    users::dto::{
        LoginRequest, MessageResponse, ProfileResponse, RegisterRequest, TokenResponse,
        UpdatePasswordRequest, UpdateProfileRequest, UpdatedProfileResponse, UsersResponse,
    },
    users::repo::User,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/registerUser", post(register))
        .route("/loginUser", post(login))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/getProfile", get(get_profile))
        .route("/updateProfile", put(update_profile))
        .route("/deleteProfile", delete(delete_profile))
        .route("/getAllUsers", get(get_all_users))
        .route("/updatePassword", post(update_password))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// A field counts as present when it exists in the body and is non-empty.
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|v| !v.is_empty())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let (name, email, password) = match (
        present(&payload.name),
        present(&payload.email),
        present(&payload.password),
    ) {
        (Some(n), Some(e), Some(p)) => (n, e, p),
        _ => {
            warn!("register with missing fields");
            return Err(ApiError::Validation("Enter all details".into()));
        }
    };

    if !is_valid_email(email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::Validation("Enter a valid email".into()));
    }

    if password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::Validation(
            "Password length should be atleast of 8 characters".into(),
        ));
    }

    if User::find_by_email(&state.db, email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict("Email already exists".into()));
    }

    let hash = hash_password(password)?;
    let user = User::create(&state.db, name, email, &hash).await?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.email)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            success: true,
            message: "User registered successfully".into(),
            token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let (email, password) = match (present(&payload.email), present(&payload.password)) {
        (Some(e), Some(p)) => (e, p),
        _ => {
            warn!("login with missing fields");
            return Err(ApiError::Validation("Enter all details".into()));
        }
    };

    if !is_valid_email(email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::Validation("Enter a valid email".into()));
    }

    if password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::Validation(
            "Password length should be atleast of 8 characters".into(),
        ));
    }

    let user = match User::find_by_email(&state.db, email).await? {
        Some(u) => u,
        None => {
            warn!(email = %email, "login unknown email");
            return Err(ApiError::Credentials(
                "User not found, Give correct email or password".into(),
            ));
        }
    };

    if !verify_password(password, &user.password)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Credentials(
            "Incorrect password, please try again".into(),
        ));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.email)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(TokenResponse {
        success: true,
        message: "Welcome Again".into(),
        token,
    }))
}

#[instrument(skip(state, auth))]
pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = User::find_by_id(&state.db, auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No such user exists".to_string()))?;

    Ok(Json(ProfileResponse {
        success: true,
        user: user.into(),
    }))
}

#[instrument(skip(state, auth, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UpdatedProfileResponse>, ApiError> {
    let (name, gender, mobile) = match (
        present(&payload.name),
        present(&payload.gender),
        present(&payload.mobile),
    ) {
        (Some(n), Some(g), Some(m)) => (n, g, m),
        _ => {
            warn!(user_id = %auth.id, "profile update with missing fields");
            return Err(ApiError::Incomplete("Provide all the details".into()));
        }
    };

    let updated = User::update_profile(&state.db, auth.id, name, gender, mobile).await?;

    info!(user_id = %auth.id, "profile updated");
    Ok(Json(UpdatedProfileResponse {
        success: true,
        message: "User Profile updated successfully".into(),
        updated_user: updated.map(Into::into),
    }))
}

#[instrument(skip(state, auth))]
pub async fn delete_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    if !User::delete(&state.db, auth.id).await? {
        warn!(user_id = %auth.id, "delete for missing user");
        return Err(ApiError::NotFound("No such user exists".into()));
    }

    info!(user_id = %auth.id, "profile deleted");
    Ok(Json(MessageResponse {
        success: true,
        message: "Profile deleted successfully".into(),
    }))
}

// Any valid token may list every user; there is no elevated-role check.
#[instrument(skip(state, _auth))]
pub async fn get_all_users(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<UsersResponse>, ApiError> {
    let users = User::list_all(&state.db).await?;

    Ok(Json(UsersResponse {
        success: true,
        users: users.into_iter().map(Into::into).collect(),
    }))
}

#[instrument(skip(state, auth, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let password = present(&payload.password)
        .ok_or_else(|| ApiError::Incomplete("Password is required".to_string()))?;

    if password.len() < 8 {
        warn!(user_id = %auth.id, "password too short");
        return Err(ApiError::Validation(
            "Password length should be atleast of 8 characters".into(),
        ));
    }

    let user = User::find_by_id(&state.db, auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No such user exists".to_string()))?;

    let hash = hash_password(password)?;
    User::update_password(&state.db, user.id, &hash).await?;

    info!(user_id = %user.id, "password updated");
    Ok(Json(MessageResponse {
        success: true,
        message: "Password updated successfully".into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    fn fake_auth() -> AuthUser {
        AuthUser {
            id: ObjectId::new(),
            email: "ann@x.com".into(),
        }
    }

    #[test]
    fn email_regex_accepts_and_rejects() {
        assert!(is_valid_email("ann@x.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn present_treats_empty_as_missing() {
        assert_eq!(present(&None), None);
        assert_eq!(present(&Some(String::new())), None);
        assert_eq!(present(&Some("x".into())), Some("x"));
    }

    // Validation precedence runs before any database access, so these
    // handler calls complete without a running mongod.

    #[tokio::test]
    async fn register_rejects_missing_fields_first() {
        let state = AppState::fake().await;
        let err = register(
            State(state),
            Json(RegisterRequest {
                name: None,
                email: Some("bad".into()),
                password: Some("short".into()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(err.to_string(), "Enter all details");
    }

    #[tokio::test]
    async fn register_checks_email_format_before_length() {
        let state = AppState::fake().await;
        let err = register(
            State(state),
            Json(RegisterRequest {
                name: Some("Ann".into()),
                email: Some("not-an-email".into()),
                password: Some("short".into()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Enter a valid email");
    }

    #[tokio::test]
    async fn register_rejects_short_password() {
        let state = AppState::fake().await;
        let err = register(
            State(state),
            Json(RegisterRequest {
                name: Some("Ann".into()),
                email: Some("ann@x.com".into()),
                password: Some("2short".into()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Password length should be atleast of 8 characters"
        );
    }

    #[tokio::test]
    async fn login_rejects_missing_and_malformed_input() {
        let state = AppState::fake().await;
        let err = login(
            State(state.clone()),
            Json(LoginRequest {
                email: Some("ann@x.com".into()),
                password: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Enter all details");

        let err = login(
            State(state),
            Json(LoginRequest {
                email: Some("nope".into()),
                password: Some("longenough1".into()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Enter a valid email");
    }

    #[tokio::test]
    async fn update_password_requires_presence_then_length() {
        let state = AppState::fake().await;
        let err = update_password(
            State(state.clone()),
            fake_auth(),
            Json(UpdatePasswordRequest { password: None }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Incomplete(_)));
        assert_eq!(err.to_string(), "Password is required");

        let err = update_password(
            State(state),
            fake_auth(),
            Json(UpdatePasswordRequest {
                password: Some("2short".into()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "Password length should be atleast of 8 characters"
        );
    }

    #[tokio::test]
    async fn update_profile_reports_missing_fields_in_body() {
        let state = AppState::fake().await;
        let err = update_profile(
            State(state),
            fake_auth(),
            Json(UpdateProfileRequest {
                name: Some("Ann".into()),
                gender: None,
                mobile: Some("555".into()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Incomplete(_)));
        assert_eq!(err.to_string(), "Provide all the details");
    }
}
