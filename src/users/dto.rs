use serde::{Deserialize, Serialize};

use crate::users::repo::User;

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub mobile: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub password: Option<String>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub gender: String,
    pub mobile: String,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id.to_hex(),
            name: u.name,
            email: u.email,
            gender: u.gender,
            mobile: u.mobile,
        }
    }
}

/// Envelope returned after register and login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: PublicUser,
}

/// `updatedUser` is null when the account vanished between token issuance
/// and the update; the operation still reports success.
#[derive(Debug, Serialize)]
pub struct UpdatedProfileResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "updatedUser")]
    pub updated_user: Option<PublicUser>,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<PublicUser>,
}

/// Envelope for operations that only report an outcome.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}
