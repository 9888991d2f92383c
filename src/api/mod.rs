use axum::{
    Router,
    http::{HeaderName, HeaderValue, StatusCode, header},
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::constants;
use crate::db::Store;
use crate::services::{AuthService, LogMailer, Mailer, SeaOrmAuthService};

pub mod auth;
pub mod context;
mod error;
pub mod guards;
mod health;
mod observability;
mod tokens;
mod types;
mod users;

pub use error::ApiError;
pub use guards::Guard;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub start_time: Instant,
}

pub async fn create_app_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer::new(config.mailer.sender.clone()));
    create_app_state_with_mailer(config, mailer).await
}

pub async fn create_app_state_with_mailer(
    config: Config,
    mailer: Arc<dyn Mailer>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::connect(&config.database).await?;
    let config = Arc::new(config);

    let auth_service = Arc::new(SeaOrmAuthService::new(
        store.clone(),
        config.clone(),
        mailer,
    ));

    Ok(Arc::new(AppState {
        config,
        store,
        auth_service,
        start_time: Instant::now(),
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_seconds);

    let v1 = Router::new()
        .merge(create_public_router())
        .merge(create_account_router(&state))
        .route(
            "/users/{id}/permissions",
            post(users::grant_permissions).route_layer(middleware::from_fn_with_state(
                Guard::permission(&state, constants::permissions::GRANT),
                guards::enforce,
            )),
        )
        .route(
            "/tokens/authentication",
            post(tokens::create_authentication_token).merge(
                delete(tokens::delete_authentication_tokens).route_layer(
                    middleware::from_fn_with_state(Guard::authenticated(&state), guards::enforce),
                ),
            ),
        )
        .route_layer(middleware::from_fn(observability::record_route))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ))
        .with_state(state);

    let request_id = HeaderName::from_static(observability::REQUEST_ID_HEADER);

    Router::new()
        .nest("/v1", v1)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(CatchPanicLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(observability::RequestSpan)
                .on_response(observability::RequestFinished),
        )
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(SetResponseHeaderLayer::appending(
            header::VARY,
            HeaderValue::from_static("Authorization"),
        ))
}

fn create_public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/healthcheck", get(health::healthcheck))
        .route("/users", post(users::register_user))
        .route("/users/activated", put(users::activate_user))
        .route("/users/password", put(users::update_user_password))
        .route("/tokens/activation", post(tokens::create_activation_token))
        .route(
            "/tokens/password-reset",
            post(tokens::create_password_reset_token),
        )
}

/// Routes for the caller's own account; activated users only.
fn create_account_router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/me", get(users::show_current_user))
        .route("/users/me/permissions", get(users::list_current_permissions))
        .route_layer(middleware::from_fn_with_state(
            Guard::activated(state),
            guards::enforce,
        ))
}
