use crate::{
    auth::{
        generate_token, hash_password, verify_password, AuthResponse, AuthenticatedUserId,
        LoginRequest, SignupRequest, TOKEN_TTL_MINUTES,
    },
    error::AppError,
    models::{User, UserResponse},
};
use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use validator::Validate;

/// Sign up a new user
///
/// Creates an account, hashes the password before storage, and returns an
/// authentication token alongside the public user record. The email must not
/// already be registered.
#[post("/signup")]
pub async fn signup(
    pool: web::Data<PgPool>,
    signup_data: web::Json<SignupRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    signup_data.validate()?;

    // Check if email already exists
    let existing_user = sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE email = $1")
        .bind(&signup_data.email)
        .fetch_optional(&**pool)
        .await?;

    if existing_user.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    // Hash password; the plaintext is never persisted
    let password_hash = hash_password(&signup_data.password)?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3)
         RETURNING id, name, email, password_hash, created_at",
    )
    .bind(&signup_data.name)
    .bind(&signup_data.email)
    .bind(&password_hash)
    .fetch_one(&**pool)
    .await?;

    let token = generate_token(user.id)?;

    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        expires_at: Utc::now() + Duration::minutes(TOKEN_TTL_MINUTES),
        user: UserResponse::from(user),
    }))
}

/// Login user
///
/// Authenticates a user and returns an authentication token. An unknown email
/// and a wrong password produce the same error, so the response does not
/// reveal whether an address is registered.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    login_data.validate()?;

    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, password_hash, created_at FROM users WHERE email = $1",
    )
    .bind(&login_data.email)
    .fetch_optional(&**pool)
    .await?;

    match user {
        Some(user) => {
            if verify_password(&login_data.password, &user.password_hash)? {
                let token = generate_token(user.id)?;
                Ok(HttpResponse::Ok().json(AuthResponse {
                    token,
                    expires_at: Utc::now() + Duration::minutes(TOKEN_TTL_MINUTES),
                    user: UserResponse::from(user),
                }))
            } else {
                Err(AppError::Unauthorized("Invalid email or password".into()))
            }
        }
        None => Err(AppError::Unauthorized("Invalid email or password".into())),
    }
}

/// Current user
///
/// Resolves the bearer token to the public user record. A token whose subject
/// no longer matches a user row is treated as unauthorized.
#[get("/me")]
pub async fn me(
    pool: web::Data<PgPool>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let profile = sqlx::query_as::<_, UserResponse>(
        "SELECT id, name, email, created_at FROM users WHERE id = $1",
    )
    .bind(user.0)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    Ok(HttpResponse::Ok().json(profile))
}
