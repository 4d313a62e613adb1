//! Account Middleware
//!
//! Route-level capability checks, plus the client-details extractor used by
//! the handlers that open sessions.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use platform::client::ClientInfo;

use crate::application::{Authenticated, CheckSessionUseCase};
use crate::domain::repository::{AccountStore, EmailQueue};
use crate::error::{AccountError, AccountResult};
use crate::presentation::handlers::AccountAppState;

/// Middleware that requires an authenticated session
///
/// Inserts [`Authenticated`] into the request extensions. A session still
/// waiting for its second factor is rejected like no session at all.
pub async fn require_authenticated<R, Q>(
    State(state): State<AccountAppState<R, Q>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AccountError>
where
    R: AccountStore,
    Q: EmailQueue + Sync + 'static,
{
    let token = platform::cookie::extract_cookie(req.headers(), &state.config.session_cookie_name);
    let auth = authenticate(&state, token.as_deref()).await?;
    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}

/// Middleware that requires an authenticated administrator
pub async fn require_admin<R, Q>(
    State(state): State<AccountAppState<R, Q>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AccountError>
where
    R: AccountStore,
    Q: EmailQueue + Sync + 'static,
{
    let token = platform::cookie::extract_cookie(req.headers(), &state.config.session_cookie_name);
    let auth = authenticate(&state, token.as_deref()).await?;
    if !auth.user.is_admin {
        tracing::debug!(user_id = %auth.user.user_id, "Admin route refused");
        return Err(AccountError::MustBeAdmin);
    }

    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}

async fn authenticate<R, Q>(
    state: &AccountAppState<R, Q>,
    token: Option<&str>,
) -> AccountResult<Authenticated>
where
    R: AccountStore,
    Q: EmailQueue + Sync + 'static,
{
    let use_case =
        CheckSessionUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());
    use_case.authenticate(token).await
}

/// Client IP and User-Agent of the current request
///
/// The peer address is used when the server was started with connect info;
/// `X-Forwarded-For` takes precedence either way.
#[derive(Debug, Clone)]
pub struct RequestClient(pub ClientInfo);

impl<S> FromRequestParts<S> for RequestClient
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let direct_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());

        Ok(Self(ClientInfo::from_headers(&parts.headers, direct_ip)))
    }
}
