//! Auth Router

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::presentation::handlers;
use crate::presentation::middleware::{ADMIN_ONLY, require_bearer, require_role};
use crate::presentation::state::{AuthAppState, AuthBackend};

/// `/auth/*` and `/users/*`. The binary nests this under `/api`.
pub fn api_router<B: AuthBackend>(state: AuthAppState<B>) -> Router {
    Router::new()
        .nest("/auth", auth_routes::<B>())
        .nest("/users", user_routes::<B>(state.clone()))
        .with_state(state)
}

fn auth_routes<B: AuthBackend>() -> Router<AuthAppState<B>> {
    Router::new()
        .route("/register", post(handlers::register::<B>))
        .route("/login", post(handlers::login::<B>))
        .route("/logout", post(handlers::logout::<B>))
        .route("/refresh", post(handlers::refresh::<B>))
        .route("/verify", get(handlers::verify::<B>))
        .route("/google", get(handlers::google::<B>))
        .route("/google/callback", get(handlers::google_callback::<B>))
}

fn user_routes<B: AuthBackend>(state: AuthAppState<B>) -> Router<AuthAppState<B>> {
    let admin = Router::new()
        .route("/{id}", delete(handlers::delete_user::<B>))
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            require_role(ADMIN_ONLY, req, next)
        }));

    Router::new()
        .route("/me", get(handlers::me::<B>))
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(state, require_bearer::<B>))
}
