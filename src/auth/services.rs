use lazy_static::lazy_static;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse},
        jwt::{JwtKeys, TokenError},
        password::{hash_password, verify_password},
        repo::UserRepo,
        repo_types::{Identity, NewUser, User},
    },
    config::AdminSeed,
    error::{AppError, AuthFailure},
};

const MIN_PASSWORD_LEN: usize = 6;

lazy_static! {
    /// Checked on the unknown-username branch of login so both failures cost
    /// one Argon2 verification.
    static ref DUMMY_HASH: Option<String> = hash_password("not-a-real-account").ok();
}

impl From<TokenError> for AuthFailure {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AuthFailure::TokenExpired,
            TokenError::Malformed => AuthFailure::TokenMalformed,
            TokenError::Rejected => AuthFailure::Failed,
        }
    }
}

#[instrument(skip(users, keys, req))]
pub async fn login(
    users: &dyn UserRepo,
    keys: &JwtKeys,
    req: LoginRequest,
) -> Result<LoginResponse, AppError> {
    let (username, password) = match (req.username, req.password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
        _ => {
            warn!("login without username or password");
            return Err(AppError::BadRequest(
                "Vui lòng cung cấp username và password".into(),
            ));
        }
    };

    let Some(user) = users.find_by_username(&username).await? else {
        warn!(%username, "login unknown username");
        if let Some(hash) = DUMMY_HASH.as_deref() {
            let _ = verify_password(&password, hash);
        }
        return Err(AuthFailure::InvalidCredentials.into());
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(%username, user_id = %user.id, "login invalid password");
        return Err(AuthFailure::InvalidCredentials.into());
    }

    let token = keys.issue(user.id, &user.username)?;
    info!(user_id = %user.id, %username, "user logged in");
    Ok(LoginResponse {
        message: "Đăng nhập thành công!".into(),
        token,
        user: Identity::from(&user),
    })
}

/// Turns an `Authorization` header value into a live identity.
pub async fn resolve_identity(
    users: &dyn UserRepo,
    keys: &JwtKeys,
    authorization: Option<&str>,
) -> Result<Identity, AppError> {
    let header = authorization
        .filter(|h| h.starts_with("Bearer"))
        .ok_or(AuthFailure::MissingCredentials)?;
    let token = header.split(' ').nth(1).unwrap_or_default();

    let claims = keys.verify(token).map_err(|e| {
        warn!(error = %e, "token verification failed");
        AuthFailure::from(e)
    })?;

    match users.find_identity(claims.user_id).await {
        Ok(Some(identity)) => Ok(identity),
        Ok(None) => {
            warn!(user_id = %claims.user_id, "token for missing user");
            Err(AuthFailure::UserGone.into())
        }
        Err(e) => {
            error!(error = %e, user_id = %claims.user_id, "identity lookup failed");
            Err(AuthFailure::Failed.into())
        }
    }
}

/// The only place a password gets hashed.
#[instrument(skip(users, password))]
pub async fn create_user(
    users: &dyn UserRepo,
    username: &str,
    password: &str,
    name: Option<&str>,
) -> Result<User, AppError> {
    let username = username.trim();
    let mut problems = Vec::new();
    if username.is_empty() {
        problems.push("Vui lòng nhập username".to_string());
    }
    if password.is_empty() {
        problems.push("Vui lòng nhập mật khẩu".to_string());
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        problems.push("Mật khẩu phải có ít nhất 6 ký tự".to_string());
    }
    if !problems.is_empty() {
        return Err(AppError::ValidationFailed(problems));
    }

    let password_hash = hash_password(password)?;
    let user = users
        .insert(NewUser {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash,
            name: name.map(str::trim).map(str::to_owned),
        })
        .await?;
    info!(user_id = %user.id, username = %user.username, "user created");
    Ok(user)
}

#[derive(Debug)]
pub enum SeedOutcome {
    Created(User),
    AlreadyExists,
}

#[instrument(skip(users, seed), fields(username = %seed.username.trim()))]
pub async fn seed_admin(users: &dyn UserRepo, seed: &AdminSeed) -> Result<SeedOutcome, AppError> {
    // same normalization create_user applies, so the lookup matches the stored row
    let username = seed.username.trim();
    if users.find_by_username(username).await?.is_some() {
        info!("admin account already exists");
        return Ok(SeedOutcome::AlreadyExists);
    }
    let user = create_user(users, username, &seed.password, Some(&seed.name)).await?;
    Ok(SeedOutcome::Created(user))
}
