use actix_web::{HttpResponse, web};
use tracing::{debug, error, info, instrument};

use crate::{
    auth::password::{hash_password, verify_password},
    error::{ApiError, StoreError},
    model::user::{DEFAULT_ROLE, NewUser, User},
    models::{LoginReqDto, LoginResponse, MessageResponse, SignupReqDto},
    store::{Stores, UserStore},
    utils::username_index::UsernameIndex,
};

/// Registers a user. The username pre-check goes through the index; a signup that loses a
/// race past the pre-check is still rejected by the store with the same conflict.
pub async fn signup(
    users: &dyn UserStore,
    index: &UsernameIndex,
    username: &str,
    password: &str,
    role: Option<String>,
) -> Result<User, ApiError> {
    if !index.is_available(username, users).await? {
        info!("Signup rejected: username taken");
        return Err(ApiError::username_taken());
    }

    let password_hash = hash_password(password).map_err(|e| {
        error!(error = %e, "Password hashing failed");
        ApiError::Internal
    })?;

    let created = users
        .create(NewUser {
            username: username.to_string(),
            password_hash,
            role: role.unwrap_or_else(|| DEFAULT_ROLE.to_string()),
        })
        .await;

    match created {
        Ok(user) => {
            index.mark_taken(&user.username).await;
            Ok(user)
        }
        Err(StoreError::Duplicate) => {
            // the index missed this name; remember it so the next attempt short-circuits
            index.mark_taken(username).await;
            info!("Signup rejected by store: username taken");
            Err(ApiError::username_taken())
        }
        Err(e) => Err(e.into()),
    }
}

/// Exact username lookup plus password check. Unknown user and wrong password give the
/// same error.
pub async fn login(users: &dyn UserStore, username: &str, password: &str) -> Result<User, ApiError> {
    let user = users.find_by_username(username).await?.ok_or_else(|| {
        info!("Invalid credentials: user not found");
        ApiError::invalid_credentials()
    })?;

    debug!(user_id = user.id, "Verifying password");
    if !verify_password(password, &user.password) {
        info!("Invalid credentials: password mismatch");
        return Err(ApiError::invalid_credentials());
    }

    Ok(user)
}

/// User login
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid credentials", body = MessageResponse, example = json!({
            "success": false,
            "message": "Invalid credentials"
        }))
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(stores, payload),
    fields(username = %payload.username)
)]
pub async fn handle_login(
    stores: web::Data<Stores>,
    payload: web::Json<LoginReqDto>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    let user = login(stores.users.as_ref(), &payload.username, &payload.password).await?;

    info!("Login successful");
    Ok(HttpResponse::Ok().json(LoginResponse {
        success: true,
        role: user.role,
        username: user.username,
    }))
}

/// User registration
#[utoipa::path(
    post,
    path = "/api/signup",
    request_body = SignupReqDto,
    responses(
        (status = 200, description = "User created", body = MessageResponse, example = json!({
            "success": true,
            "message": "User created successfully"
        })),
        (status = 400, description = "Username already exists", body = MessageResponse, example = json!({
            "success": false,
            "message": "Username already exists"
        }))
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_signup",
    skip(stores, index, payload),
    fields(username = %payload.username)
)]
pub async fn handle_signup(
    stores: web::Data<Stores>,
    index: web::Data<UsernameIndex>,
    payload: web::Json<SignupReqDto>,
) -> Result<HttpResponse, ApiError> {
    let SignupReqDto {
        username,
        password,
        role,
    } = payload.into_inner();

    let user = signup(stores.users.as_ref(), index.get_ref(), &username, &password, role).await?;

    info!(user_id = user.id, role = %user.role, "User created");
    Ok(HttpResponse::Ok().json(MessageResponse::ok("User created successfully")))
}
