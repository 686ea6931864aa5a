//! Application startup and lifecycle management.

use crate::config::QaConfig;
use crate::handlers;
use crate::services::database::Database;
use crate::services::jwt::JwtService;
use crate::services::metrics::init_metrics;
use axum::http::{HeaderValue, Method};
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::rate_limit::{
    create_ip_rate_limiter, create_unkeyed_rate_limiter, ip_rate_limit_middleware,
    rate_limit_middleware, IpRateLimiter, UnkeyedRateLimiter,
};
use service_core::middleware::security_headers::security_headers_middleware;
use service_core::middleware::tracing::request_id_middleware;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: QaConfig,
    pub db: Arc<Database>,
    pub jwt: Arc<JwtService>,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
    login_limiter: UnkeyedRateLimiter,
    ip_limiter: IpRateLimiter,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: QaConfig) -> Result<Self, AppError> {
        Self::build_internal(config, true).await
    }

    /// Build the application without running migrations.
    /// Use this in tests when migrations are already applied by the test harness.
    pub async fn build_without_migrations(config: QaConfig) -> Result<Self, AppError> {
        Self::build_internal(config, false).await
    }

    async fn build_internal(config: QaConfig, run_migrations: bool) -> Result<Self, AppError> {
        init_metrics();

        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        if run_migrations {
            db.run_migrations().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;
        }

        let jwt = JwtService::new(&config.jwt)?;

        let login_limiter = create_unkeyed_rate_limiter(
            config.rate_limit.login_attempts,
            config.rate_limit.login_window_seconds,
        );
        let ip_limiter = create_ip_rate_limiter(
            config.rate_limit.global_ip_limit,
            config.rate_limit.global_ip_window_seconds,
        );

        let state = AppState {
            config: config.clone(),
            db: Arc::new(db),
            jwt: Arc::new(jwt),
        };

        let addr = config.common.bind_addr()?;
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "qa-service listener bound");

        Ok(Self {
            port,
            listener,
            state,
            login_limiter,
            ip_limiter,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        let router = build_router(self.state, self.login_limiter, self.ip_limiter)?;

        axum::serve(
            self.listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
    }
}

fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer, AppError> {
    let origins = allowed_origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid CORS origin: {}", e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]))
}

fn build_router(
    state: AppState,
    login_limiter: UnkeyedRateLimiter,
    ip_limiter: IpRateLimiter,
) -> std::io::Result<Router> {
    let cors = cors_layer(&state.config.security.allowed_origins)
        .map_err(|e| std::io::Error::other(format!("Failed to build CORS layer: {}", e)))?;

    // Login gets its own tighter limiter on top of the global IP limiter.
    let auth_routes = Router::new()
        .route("/users", post(handlers::users::register))
        .route("/users/login", post(handlers::users::login))
        .layer(middleware::from_fn_with_state(
            login_limiter,
            rate_limit_middleware,
        ));

    let api = Router::new()
        .merge(auth_routes)
        .route("/users/me", get(handlers::users::me).put(handlers::users::update_me))
        .route("/users/me/password", put(handlers::users::change_password))
        .route(
            "/users/:id",
            get(handlers::users::get_user)
                .patch(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route(
            "/users/username/:username",
            get(handlers::users::get_user_by_username),
        )
        .route("/users/email/:email", get(handlers::users::get_user_by_email))
        .route("/users/search/:query", get(handlers::users::search_users))
        .route(
            "/users/:id/follow",
            post(handlers::users::follow_user).delete(handlers::users::unfollow_user),
        )
        .route("/users/:id/followers", get(handlers::users::get_followers))
        .route("/users/:id/following", get(handlers::users::get_following))
        .route("/users/:id/badges", get(handlers::users::get_user_badges))
        .route(
            "/users/:id/questions",
            get(handlers::questions::get_questions_by_user),
        )
        .route(
            "/users/:id/answers",
            get(handlers::answers::get_answers_by_user),
        )
        .route(
            "/categories",
            get(handlers::taxonomy::list_categories).post(handlers::taxonomy::create_category),
        )
        .route(
            "/categories/:id",
            get(handlers::taxonomy::get_category)
                .put(handlers::taxonomy::update_category)
                .delete(handlers::taxonomy::delete_category),
        )
        .route(
            "/categories/:id/questions",
            get(handlers::questions::get_questions_by_category),
        )
        .route(
            "/tags",
            get(handlers::taxonomy::list_tags).post(handlers::taxonomy::create_tag),
        )
        .route(
            "/tags/:id",
            get(handlers::taxonomy::get_tag)
                .put(handlers::taxonomy::update_tag)
                .delete(handlers::taxonomy::delete_tag),
        )
        .route(
            "/tags/:id/questions",
            get(handlers::questions::get_questions_by_tag),
        )
        .route(
            "/questions",
            get(handlers::questions::list_questions).post(handlers::questions::create_question),
        )
        .route(
            "/questions/:id",
            get(handlers::questions::get_question)
                .put(handlers::questions::update_question)
                .delete(handlers::questions::delete_question),
        )
        .route(
            "/questions/by-title/:fragment",
            get(handlers::questions::get_questions_by_title),
        )
        .route(
            "/questions/:id/answers",
            get(handlers::answers::get_answers_by_question)
                .post(handlers::answers::create_answer),
        )
        .route(
            "/questions/:id/vote",
            post(handlers::votes::vote_question)
                .delete(handlers::votes::retract_question_vote),
        )
        .route(
            "/questions/:id/votes",
            get(handlers::votes::get_question_votes),
        )
        .route(
            "/questions/:id/votes/me",
            get(handlers::votes::get_my_question_vote),
        )
        .route(
            "/answers/:id",
            get(handlers::answers::get_answer)
                .put(handlers::answers::update_answer)
                .delete(handlers::answers::delete_answer),
        )
        .route("/answers/:id/accept", post(handlers::answers::accept_answer))
        .route(
            "/answers/:id/vote",
            post(handlers::votes::vote_answer).delete(handlers::votes::retract_answer_vote),
        )
        .route("/answers/:id/votes", get(handlers::votes::get_answer_votes))
        .route(
            "/answers/:id/votes/me",
            get(handlers::votes::get_my_answer_vote),
        )
        .route(
            "/badges",
            get(handlers::badges::list_badges).post(handlers::badges::create_badge),
        )
        .route(
            "/badges/:id",
            get(handlers::badges::get_badge)
                .put(handlers::badges::update_badge)
                .delete(handlers::badges::delete_badge),
        )
        .route(
            "/notifications",
            get(handlers::notifications::list_notifications),
        )
        .route(
            "/notifications/unread-count",
            get(handlers::notifications::unread_count),
        )
        .route(
            "/notifications/read-all",
            put(handlers::notifications::mark_all_read),
        )
        .route(
            "/notifications/:id/read",
            put(handlers::notifications::mark_read),
        )
        .route(
            "/notifications/:id",
            delete(handlers::notifications::delete_notification),
        )
        .route("/search/:query", get(handlers::search::search));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics))
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(
            ip_limiter,
            ip_rate_limit_middleware,
        ))
        .layer(cors)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
