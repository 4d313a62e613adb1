//! Account Router

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::application::config::AccountConfig;
use crate::domain::repository::{AccountStore, EmailQueue};
use crate::presentation::handlers::{self, AccountAppState};
use crate::presentation::middleware::{require_admin, require_authenticated};

/// Create the account router for any store and email queue
///
/// Routes are relative; the binary nests them under `/api`.
pub fn account_router<R, Q>(repo: R, queue: Q, config: AccountConfig) -> Router
where
    R: AccountStore,
    Q: EmailQueue + Sync + 'static,
{
    let state = AccountAppState {
        repo: Arc::new(repo),
        queue: Arc::new(queue),
        config: Arc::new(config),
    };

    let public = Router::new()
        .route("/register", post(handlers::register::<R, Q>))
        .route("/login", post(handlers::login::<R, Q>))
        .route("/login_2fa", post(handlers::login_2fa::<R, Q>))
        .route("/forgot_password", post(handlers::forgot_password::<R, Q>))
        .route("/reset_password", post(handlers::reset_password::<R, Q>))
        .route("/verify_email", post(handlers::verify_email::<R, Q>));

    let authenticated = Router::new()
        .route("/logout", post(handlers::logout::<R, Q>))
        .route("/change_password", post(handlers::change_password::<R, Q>))
        .route(
            "/resend_email_verification",
            post(handlers::resend_email_verification::<R, Q>),
        )
        .route(
            "/generate_2fa_secret",
            get(handlers::generate_2fa_secret::<R, Q>),
        )
        .route("/enable_2fa", post(handlers::enable_2fa::<R, Q>))
        .route("/disable_2fa", post(handlers::disable_2fa::<R, Q>))
        .route("/users", get(handlers::list_users::<R, Q>))
        .route("/whoami", get(handlers::whoami))
        .route("/delete_account", delete(handlers::delete_account::<R, Q>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_authenticated::<R, Q>,
        ));

    let admin = Router::new()
        .route("/users", post(handlers::create_user::<R, Q>))
        .route(
            "/user/{id}",
            get(handlers::get_user::<R, Q>)
                .put(handlers::update_user::<R, Q>)
                .delete(handlers::delete_user::<R, Q>),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin::<R, Q>,
        ));

    Router::new()
        .merge(public)
        .merge(authenticated)
        .merge(admin)
        .with_state(state)
}
