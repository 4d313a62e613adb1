//! HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{HeaderMap, HeaderName, header};
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::config::AccountConfig;
use crate::application::{
    Authenticated, ChangePasswordInput, ChangePasswordUseCase, CreateUserInput,
    CreateUserUseCase, DeleteUserUseCase, ForgotPasswordUseCase, GetUserUseCase,
    ListUsersUseCase, LoginInput, LoginUseCase, LogoutUseCase, PageQuery, RegisterInput,
    RegisterUseCase, ResendVerificationUseCase, ResetPasswordInput, ResetPasswordUseCase,
    SecondFactorInput, SecondFactorLoginUseCase, TwoFactorUseCase, UpdateUserInput,
    UpdateUserUseCase, VerifyEmailUseCase,
};
use crate::domain::repository::{AccountStore, EmailQueue};
use crate::domain::value_object::user_id::UserId;
use crate::error::AccountResult;
use crate::presentation::dto::{
    ChangePasswordRequest, CreateUserRequest, Disable2faRequest, EmptyResponse, Enable2faRequest,
    ForgotPasswordRequest, ListUsersQuery, Login2faRequest, LoginRequest, RegisterRequest,
    ResetPasswordRequest, TwoFactorSetupResponse, UpdateUserRequest, UserListResponse,
    UserResponse, VerifyEmailRequest,
};
use crate::presentation::middleware::RequestClient;

/// Shared state for account handlers
pub struct AccountAppState<R, Q> {
    pub repo: Arc<R>,
    pub queue: Arc<Q>,
    pub config: Arc<AccountConfig>,
}

impl<R, Q> Clone for AccountAppState<R, Q> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            queue: self.queue.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Register / Login / Logout
// ============================================================================

/// POST /register
pub async fn register<R, Q>(
    State(state): State<AccountAppState<R, Q>>,
    RequestClient(client): RequestClient,
    Json(req): Json<RegisterRequest>,
) -> AccountResult<impl IntoResponse>
where
    R: AccountStore,
    Q: EmailQueue + Sync + 'static,
{
    let use_case = RegisterUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.queue.clone(),
        state.config.clone(),
    );

    let input = RegisterInput {
        email: req.email,
        password: req.password,
    };
    let output = use_case.execute(input, &client).await?;

    Ok((
        set_session_cookie(&state.config, &output.session_token),
        Json(UserResponse::from(&output.user)),
    ))
}

/// POST /login
///
/// Users with 2FA receive a cookie for a pending session only.
pub async fn login<R, Q>(
    State(state): State<AccountAppState<R, Q>>,
    RequestClient(client): RequestClient,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> AccountResult<impl IntoResponse>
where
    R: AccountStore,
    Q: EmailQueue + Sync + 'static,
{
    let current = session_cookie(&state.config, &headers);
    let use_case = LoginUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    let input = LoginInput {
        email: req.email,
        password: req.password,
    };
    let output = use_case.execute(input, current.as_deref(), &client).await?;

    Ok((
        set_session_cookie(&state.config, &output.session_token),
        Json(UserResponse::from(&output.user)),
    ))
}

/// POST /login_2fa
pub async fn login_2fa<R, Q>(
    State(state): State<AccountAppState<R, Q>>,
    RequestClient(client): RequestClient,
    headers: HeaderMap,
    Json(req): Json<Login2faRequest>,
) -> AccountResult<impl IntoResponse>
where
    R: AccountStore,
    Q: EmailQueue + Sync + 'static,
{
    let current = session_cookie(&state.config, &headers);
    let use_case =
        SecondFactorLoginUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    let input = SecondFactorInput {
        email: req.email,
        totp_code: req.totp_code,
    };
    let output = use_case.execute(input, current.as_deref(), &client).await?;

    Ok((
        set_session_cookie(&state.config, &output.session_token),
        Json(UserResponse::from(&output.user)),
    ))
}

/// POST /logout
pub async fn logout<R, Q>(
    State(state): State<AccountAppState<R, Q>>,
    Extension(auth): Extension<Authenticated>,
) -> AccountResult<impl IntoResponse>
where
    R: AccountStore,
    Q: EmailQueue + Sync + 'static,
{
    LogoutUseCase::new(state.repo.clone())
        .execute(&auth.session)
        .await?;

    Ok((clear_session_cookie(&state.config), Json(EmptyResponse {})))
}

// ============================================================================
// Passwords
// ============================================================================

/// POST /change_password
pub async fn change_password<R, Q>(
    State(state): State<AccountAppState<R, Q>>,
    Extension(auth): Extension<Authenticated>,
    Json(req): Json<ChangePasswordRequest>,
) -> AccountResult<Json<UserResponse>>
where
    R: AccountStore,
    Q: EmailQueue + Sync + 'static,
{
    let use_case = ChangePasswordUseCase::new(state.repo.clone(), state.config.clone());

    let input = ChangePasswordInput {
        current_password: req.current_password,
        new_password: req.new_password,
    };
    let user = use_case.execute(auth.user, input).await?;

    Ok(Json(UserResponse::from(&user)))
}

/// POST /forgot_password
///
/// Answers `{}` whether or not the email is known.
pub async fn forgot_password<R, Q>(
    State(state): State<AccountAppState<R, Q>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> AccountResult<Json<EmptyResponse>>
where
    R: AccountStore,
    Q: EmailQueue + Sync + 'static,
{
    ForgotPasswordUseCase::new(state.repo.clone(), state.queue.clone())
        .execute(req.email)
        .await?;

    Ok(Json(EmptyResponse {}))
}

/// POST /reset_password
pub async fn reset_password<R, Q>(
    State(state): State<AccountAppState<R, Q>>,
    Json(req): Json<ResetPasswordRequest>,
) -> AccountResult<Json<EmptyResponse>>
where
    R: AccountStore,
    Q: EmailQueue + Sync + 'static,
{
    let input = ResetPasswordInput {
        email: req.email,
        reset_token: req.reset_token,
        new_password: req.new_password,
    };

    ResetPasswordUseCase::new(state.repo.clone(), state.config.clone())
        .execute(input)
        .await?;

    Ok(Json(EmptyResponse {}))
}

// ============================================================================
// Email Verification
// ============================================================================

/// POST /verify_email
pub async fn verify_email<R, Q>(
    State(state): State<AccountAppState<R, Q>>,
    Json(req): Json<VerifyEmailRequest>,
) -> AccountResult<Json<UserResponse>>
where
    R: AccountStore,
    Q: EmailQueue + Sync + 'static,
{
    let user = VerifyEmailUseCase::new(state.repo.clone())
        .execute(req.email, &req.verification_token)
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// POST /resend_email_verification
pub async fn resend_email_verification<R, Q>(
    State(state): State<AccountAppState<R, Q>>,
    Extension(auth): Extension<Authenticated>,
) -> AccountResult<Json<EmptyResponse>>
where
    R: AccountStore,
    Q: EmailQueue + Sync + 'static,
{
    ResendVerificationUseCase::new(state.repo.clone(), state.queue.clone())
        .execute(auth.user)
        .await?;

    Ok(Json(EmptyResponse {}))
}

// ============================================================================
// Two-factor
// ============================================================================

/// GET /generate_2fa_secret
pub async fn generate_2fa_secret<R, Q>(
    State(state): State<AccountAppState<R, Q>>,
    Extension(auth): Extension<Authenticated>,
) -> AccountResult<Json<TwoFactorSetupResponse>>
where
    R: AccountStore,
    Q: EmailQueue + Sync + 'static,
{
    let setup = TwoFactorUseCase::new(state.repo.clone(), state.config.clone())
        .generate(&auth.user)?;

    Ok(Json(setup.into()))
}

/// POST /enable_2fa
pub async fn enable_2fa<R, Q>(
    State(state): State<AccountAppState<R, Q>>,
    Extension(auth): Extension<Authenticated>,
    Json(req): Json<Enable2faRequest>,
) -> AccountResult<Json<UserResponse>>
where
    R: AccountStore,
    Q: EmailQueue + Sync + 'static,
{
    let user = TwoFactorUseCase::new(state.repo.clone(), state.config.clone())
        .enable(auth.user, &req.totp_secret, &req.totp_code)
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// POST /disable_2fa
pub async fn disable_2fa<R, Q>(
    State(state): State<AccountAppState<R, Q>>,
    Extension(auth): Extension<Authenticated>,
    Json(req): Json<Disable2faRequest>,
) -> AccountResult<Json<UserResponse>>
where
    R: AccountStore,
    Q: EmailQueue + Sync + 'static,
{
    let user = TwoFactorUseCase::new(state.repo.clone(), state.config.clone())
        .disable(auth.user, &req.totp_code)
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

// ============================================================================
// Users
// ============================================================================

/// GET /users
pub async fn list_users<R, Q>(
    State(state): State<AccountAppState<R, Q>>,
    Query(query): Query<ListUsersQuery>,
) -> AccountResult<Json<UserListResponse>>
where
    R: AccountStore,
    Q: EmailQueue + Sync + 'static,
{
    let listing = ListUsersUseCase::new(state.repo.clone())
        .execute(PageQuery {
            page: query.page,
            per_page: query.per_page,
        })
        .await?;

    Ok(Json(listing.into()))
}

/// GET /whoami
pub async fn whoami(Extension(auth): Extension<Authenticated>) -> Json<UserResponse> {
    Json(UserResponse::from(&auth.user))
}

/// DELETE /delete_account
pub async fn delete_account<R, Q>(
    State(state): State<AccountAppState<R, Q>>,
    Extension(auth): Extension<Authenticated>,
) -> AccountResult<impl IntoResponse>
where
    R: AccountStore,
    Q: EmailQueue + Sync + 'static,
{
    DeleteUserUseCase::new(state.repo.clone())
        .delete_account(&auth.user)
        .await?;

    Ok((clear_session_cookie(&state.config), Json(EmptyResponse {})))
}

/// POST /users (admin)
pub async fn create_user<R, Q>(
    State(state): State<AccountAppState<R, Q>>,
    Extension(auth): Extension<Authenticated>,
    Json(req): Json<CreateUserRequest>,
) -> AccountResult<Json<UserResponse>>
where
    R: AccountStore,
    Q: EmailQueue + Sync + 'static,
{
    let use_case =
        CreateUserUseCase::new(state.repo.clone(), state.queue.clone(), state.config.clone());

    let input = CreateUserInput {
        email: req.email,
        password: req.password,
        is_admin: req.is_admin,
    };
    let user = use_case.execute(&auth.user, input).await?;

    Ok(Json(UserResponse::from(&user)))
}

/// GET /user/{id} (admin)
pub async fn get_user<R, Q>(
    State(state): State<AccountAppState<R, Q>>,
    Path(user_id): Path<Uuid>,
) -> AccountResult<Json<UserResponse>>
where
    R: AccountStore,
    Q: EmailQueue + Sync + 'static,
{
    let user = GetUserUseCase::new(state.repo.clone())
        .execute(&UserId::from_uuid(user_id))
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// PUT /user/{id} (admin)
pub async fn update_user<R, Q>(
    State(state): State<AccountAppState<R, Q>>,
    Extension(auth): Extension<Authenticated>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> AccountResult<Json<UserResponse>>
where
    R: AccountStore,
    Q: EmailQueue + Sync + 'static,
{
    let use_case = UpdateUserUseCase::new(state.repo.clone(), state.queue.clone());

    let input = UpdateUserInput {
        email: req.email,
        is_admin: req.is_admin,
    };
    let user = use_case
        .execute(&auth.user, &UserId::from_uuid(user_id), input)
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// DELETE /user/{id} (admin)
pub async fn delete_user<R, Q>(
    State(state): State<AccountAppState<R, Q>>,
    Extension(auth): Extension<Authenticated>,
    Path(user_id): Path<Uuid>,
) -> AccountResult<Json<EmptyResponse>>
where
    R: AccountStore,
    Q: EmailQueue + Sync + 'static,
{
    DeleteUserUseCase::new(state.repo.clone())
        .delete_by_id(&auth.user, &UserId::from_uuid(user_id))
        .await?;

    Ok(Json(EmptyResponse {}))
}

// ============================================================================
// Helper Functions
// ============================================================================

fn session_cookie(config: &AccountConfig, headers: &HeaderMap) -> Option<String> {
    platform::cookie::extract_cookie(headers, &config.session_cookie_name)
}

fn set_session_cookie(config: &AccountConfig, token: &str) -> [(HeaderName, String); 1] {
    [(header::SET_COOKIE, config.cookie_config().build_set_cookie(token))]
}

fn clear_session_cookie(config: &AccountConfig) -> [(HeaderName, String); 1] {
    [(header::SET_COOKIE, config.cookie_config().build_delete_cookie())]
}
