use crate::database;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub mod auth;
pub mod error;
pub mod recipes;
pub mod tags;
pub mod users;
pub mod wire;

pub use error::ApiError;

/// Shared per-request context. Diesel connections are synchronous, so the
/// single sqlite connection sits behind a mutex; the storage engine
/// serializes conflicting writes anyway.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<database::Connection>>,
    media_dir: PathBuf,
}

impl AppState {
    pub fn new(conn: database::Connection, media_dir: PathBuf) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            media_dir,
        }
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, database::Connection> {
        // A handler that panics mid-request must not poison the connection
        // for every request after it.
        self.db
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_origin(Any)
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/users/", post(users::register))
        .route("/api/users/me/", get(users::me))
        .route("/api/users/set_password/", post(users::set_password))
        .route("/api/users/subscriptions/", get(users::subscriptions))
        .route("/api/users/{id}/", get(users::get_user))
        .route(
            "/api/users/{id}/subscribe/",
            post(users::subscribe).delete(users::unsubscribe),
        )
        .route("/api/auth/token/login/", post(auth::login))
        .route("/api/auth/token/logout/", post(auth::logout))
        .route("/api/tags/", get(tags::list_tags))
        .route("/api/tags/{id}/", get(tags::get_tag))
        .route("/api/ingredients/", get(tags::list_ingredients))
        .route("/api/ingredients/{id}/", get(tags::get_ingredient))
        .route(
            "/api/recipes/",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        .route(
            "/api/recipes/download_shopping_cart/",
            get(recipes::download_shopping_cart),
        )
        .route(
            "/api/recipes/{id}/",
            get(recipes::get_recipe)
                .patch(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
        .route(
            "/api/recipes/{id}/favorite/",
            post(recipes::add_favorite).delete(recipes::remove_favorite),
        )
        .route(
            "/api/recipes/{id}/shopping_cart/",
            post(recipes::add_to_cart).delete(recipes::remove_from_cart),
        )
        .layer(cors)
        .with_state(state)
}

pub async fn serve(address: &str, state: AppState) -> crate::Result<()> {
    let app = router(state);
    let listener = TcpListener::bind(address).await?;
    log::info!("listening on {address}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
        log::info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
        log::info!("received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
