//! Registration, login and current-user routes

use async_trait::async_trait;
use axum::{
    Json,
    extract::{FromRequest, Multipart, Request, State, multipart::MultipartError},
    http::{StatusCode, header::CONTENT_TYPE},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::{LoginRequest, NewUser, RegisterRequest, UserResponse},
    password,
    state::AppState,
    uploads::{self, ImageUpload},
    validation,
};

/// Registration input, from either a JSON body or a multipart form
#[derive(Debug, Default)]
pub struct RegisterForm {
    pub username: Option<String>,
    pub login: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub image: Option<ImageUpload>,
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::bad_request(format!("Invalid multipart body: {}", err.body_text()))
    }
}

impl RegisterForm {
    async fn from_multipart(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = RegisterForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();

            if name == "profileImage" {
                let declared = field
                    .content_type()
                    .map(uploads::normalize_mime)
                    .filter(|mime| mime != "application/octet-stream");
                let guessed = field.file_name().and_then(uploads::mime_from_file_name);
                let bytes = field.bytes().await.map_err(multipart_error)?;

                if !bytes.is_empty() {
                    form.image = Some(ImageUpload {
                        bytes: bytes.to_vec(),
                        mime_type: declared.or(guessed).unwrap_or_default(),
                    });
                }
                continue;
            }

            let slot = match name.as_str() {
                "username" => &mut form.username,
                "login" => &mut form.login,
                "email" => &mut form.email,
                "password" => &mut form.password,
                _ => continue,
            };
            *slot = Some(field.text().await.map_err(multipart_error)?);
        }

        Ok(form)
    }

    fn from_json(body: RegisterRequest) -> ApiResult<Self> {
        let image = body
            .profile_image
            .filter(|value| !value.trim().is_empty())
            .map(|value| uploads::parse_data_url(&value))
            .transpose()?;

        Ok(RegisterForm {
            username: body.username,
            login: body.login,
            email: body.email,
            password: body.password,
            image,
        })
    }
}

#[async_trait]
impl<S> FromRequest<S> for RegisterForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            Self::from_multipart(multipart).await
        } else {
            let Json(body) = Json::<RegisterRequest>::from_request(req, state).await?;
            Self::from_json(body)
        }
    }
}

/// Trimmed value, or `None` when absent or blank
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    form: RegisterForm,
) -> ApiResult<impl IntoResponse> {
    let (Some(username), Some(email), Some(password)) = (
        present(form.username),
        present(form.email),
        form.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request(
            "username, email and password are required",
        ));
    };
    let login = present(form.login).unwrap_or_else(|| username.clone());

    validation::validate_username(&username).map_err(ApiError::BadRequest)?;
    validation::validate_login(&login).map_err(ApiError::BadRequest)?;
    validation::validate_email(&email).map_err(ApiError::BadRequest)?;
    validation::validate_password(&password).map_err(ApiError::BadRequest)?;
    if let Some(image) = &form.image {
        state.image_store.check(image)?;
    }

    let email = validation::normalize_email(&email);
    if state.user_repository.email_exists(&email).await? {
        return Err(ApiError::Conflict("Email already in use".to_string()));
    }

    let password_hash = password::hash_password(password).await?;

    let image = match form.image {
        Some(upload) => Some(state.image_store.store(upload).await?),
        None => None,
    };

    let new_user = NewUser {
        username,
        login,
        email,
        password_hash,
        image,
    };

    let user = match state.user_repository.create(&new_user).await {
        Ok(user) => user,
        Err(e) => {
            if let Some(image) = &new_user.image {
                state.image_store.discard(image).await;
            }
            if e.is_unique_violation() {
                return Err(ApiError::Conflict("Email already in use".to_string()));
            }
            return Err(e.into());
        }
    };

    info!("Registered user {} ({})", user.id, user.username);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": UserResponse::from(&user),
        })),
    ))
}

/// Response for user login
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let (Some(email), Some(password)) = (
        present(payload.email),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };

    let email = validation::normalize_email(&email);

    if !state.login_limiter.is_allowed(&email).await {
        warn!("Login for {} blocked by rate limiter", email);
        return Err(ApiError::TooManyRequests);
    }

    let Some(user) = state.user_repository.find_by_email(&email).await? else {
        password::verify_dummy(password).await?;
        state.login_limiter.record_failure(&email).await;
        warn!("Failed login attempt for {}", email);
        return Err(ApiError::InvalidCredentials);
    };

    if !password::verify_password(password, user.password.clone()).await? {
        state.login_limiter.record_failure(&email).await;
        warn!("Failed login attempt for {}", email);
        return Err(ApiError::InvalidCredentials);
    }

    state.login_limiter.reset(&email).await;

    let token = state.jwt_service.issue(&user)?;

    info!("User {} logged in", user.id);

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.expiry(),
        user: UserResponse::from(&user),
    }))
}

/// Current user endpoint
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<impl IntoResponse> {
    let user = state
        .user_repository
        .find_by_id(auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({ "user": UserResponse::from(&user) })))
}
