use crate::{
    auth::{hash_password, verify_password, LoginRequest, RegisterRequest, TokenResponse, UnitOfWork},
    error::{AppError, EMAIL_TAKEN},
    models::{User, UserRecord},
    state::AppState,
};
use actix_web::{post, web, HttpResponse, Responder};
use chrono::Utc;
use validator::Validate;

/// Register a new user
///
/// Creates the account and returns it without the password hash.
/// An email that is already registered is rejected with 400.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;
    let RegisterRequest { email, password } = register_data.into_inner();

    // Hash before opening the session so no store handle waits on bcrypt.
    let cost = state.bcrypt_cost;
    let password_hash = web::block(move || hash_password(&password, cost)).await??;

    let mut uow = UnitOfWork::begin(&state).await?;
    if uow.users().find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(EMAIL_TAKEN.into()));
    }

    let record = uow
        .users()
        .create(&UserRecord::new(email, password_hash, Utc::now()))
        .await?;
    uow.commit().await?;

    log::info!("registered user {}", record.id);
    Ok(HttpResponse::Ok().json(User::from(record)))
}

/// Login user
///
/// Exchanges an email and password for a bearer token. Unknown emails and
/// wrong passwords get the same 401.
#[post("/token")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
    mut uow: UnitOfWork,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;
    let LoginRequest { email, password } = login_data.into_inner();

    let user = uow.users().find_by_email(&email).await?;
    // Nothing to write; release the session before hashing.
    drop(uow);

    let user = match user {
        Some(user) => user,
        None => return Err(incorrect_credentials()),
    };

    let hashed = user.password_hash.clone();
    if !web::block(move || verify_password(&password, &hashed)).await?? {
        log::debug!("wrong password for user {}", user.id);
        return Err(incorrect_credentials());
    }

    let token = state.tokens.issue(user.id, state.tokens.default_ttl())?;
    log::info!("issued access token for user {}", user.id);

    Ok(HttpResponse::Ok().json(TokenResponse::bearer(token)))
}

fn incorrect_credentials() -> AppError {
    AppError::Unauthorized("Incorrect email or password".into())
}
