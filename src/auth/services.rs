use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    claims::Role,
    dto::{AuthResponse, PublicUser},
    jwt::JwtKeys,
    password::{hash_password_blocking, verify_password_blocking, DUMMY_HASH},
    repo_types::{NewUser, User},
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn issue(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let keys = JwtKeys::from(&state.config.jwt);
    let access_token = keys.sign(user.id, user.role)?;
    Ok(AuthResponse {
        access_token,
        user: PublicUser::from(user),
    })
}

/// Create a USER account and sign a token for it.
pub async fn register(state: &AppState, email: &str, password: &str) -> AppResult<AuthResponse> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(AppError::validation("email must be an email"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    // The store enforces uniqueness; this early check just skips hashing.
    if state.users.find_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::conflict("Email already exists"));
    }

    let password_hash = hash_password_blocking(password.to_owned()).await?;
    let user = state
        .users
        .create(NewUser {
            email,
            password_hash,
            role: Role::User,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    issue(state, user)
}

/// Unknown email and wrong password both yield `InvalidCredentials`.
pub async fn login(state: &AppState, email: &str, password: &str) -> AppResult<AuthResponse> {
    let email = normalize_email(email);

    let Some(user) = state.users.find_by_email(&email).await? else {
        let _ = verify_password_blocking(password.to_owned(), DUMMY_HASH.to_owned()).await;
        warn!(%email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password_blocking(password.to_owned(), user.password_hash.clone()).await? {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    issue(state, user)
}

pub async fn current_user(state: &AppState, user_id: Uuid) -> AppResult<PublicUser> {
    state
        .users
        .find_by_id(user_id)
        .await?
        .map(PublicUser::from)
        .ok_or(AppError::Unauthorized)
}
