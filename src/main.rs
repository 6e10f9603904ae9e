//! Kanban task board API server.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `SESSION_STORE`: `in_memory` (default) | `redis`
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required when `STORAGE_MODE=postgres`)
//! - `REDIS_URL`: Redis connection URL (required when `SESSION_STORE=redis`)
//! - `JWT_SECRET`: token signing secret, at least 32 bytes (required)
//! - `JWT_TTL_SECONDS`: session lifetime (default: `86400`)
//! - `HOST`: Server host address (default: `0.0.0.0`)
//! - `PORT`: Server port (default: `8000`)
//! - `CORS_ORIGIN`: browser origin allowed to send the session cookie
//! - `COOKIE_SECURE`: mark the session cookie `Secure` (default: `false`)
//! - `BODY_LIMIT_BYTES`: maximum request body size (default: 100 MiB)
//! - `RUST_LOG`: Logging level (e.g., `debug`, `info`, `kanban_api=debug`)
//! - `LOG_FORMAT`: `json` for JSON log lines, anything else for text
//! - `WORKER_THREADS`: Number of tokio worker threads (default: logical CPU count)

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use kanban_api::api::{AppConfig, AppState, create_router};
use kanban_api::auth::TokenService;
use kanban_api::config::{AuthConfig, ServerConfig};
use kanban_api::infrastructure::{RepositoryConfig, RepositoryFactory};

/// Result of parsing `WORKER_THREADS` environment variable.
struct WorkerThreadsResult {
    threads: Option<usize>,
    warning_emitted: bool,
}

fn parse_worker_threads() -> WorkerThreadsResult {
    let unset = WorkerThreadsResult {
        threads: None,
        warning_emitted: false,
    };
    let Ok(value) = std::env::var("WORKER_THREADS") else {
        return unset;
    };

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return unset;
    }

    match trimmed.parse::<usize>() {
        Ok(0) => {
            eprintln!("Warning: WORKER_THREADS=0 is invalid (must be > 0), using default");
            WorkerThreadsResult {
                threads: None,
                warning_emitted: true,
            }
        }
        Ok(n) => {
            let max_threads = std::thread::available_parallelism()
                .map(|parallelism| parallelism.get().saturating_mul(4))
                .unwrap_or(64);
            if n > max_threads {
                eprintln!(
                    "Warning: WORKER_THREADS={n} exceeds recommended limit ({max_threads}), capping to {max_threads}"
                );
                WorkerThreadsResult {
                    threads: Some(max_threads),
                    warning_emitted: true,
                }
            } else {
                WorkerThreadsResult {
                    threads: Some(n),
                    warning_emitted: false,
                }
            }
        }
        Err(error) => {
            eprintln!(
                "Warning: WORKER_THREADS='{trimmed}' is not a valid number ({error}), using default"
            );
            WorkerThreadsResult {
                threads: None,
                warning_emitted: true,
            }
        }
    }
}

fn main() {
    dotenvy::dotenv().ok();

    let result = parse_worker_threads();
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();

    if let Some(threads) = result.threads {
        builder.worker_threads(threads);
        if !result.warning_emitted {
            eprintln!("Tokio worker_threads set to: {threads}");
        }
    }

    let runtime = match builder.build() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("Failed to create tokio runtime: {error}");
            std::process::exit(1);
        }
    };
    runtime.block_on(async_main());
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kanban_api=debug,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Unwraps a start-up step or exits with the error logged.
fn or_exit<T, E: std::fmt::Display>(result: Result<T, E>, context: &str) -> T {
    match result {
        Ok(value) => value,
        Err(error) => {
            tracing::error!(%error, "{context}");
            std::process::exit(1);
        }
    }
}

async fn async_main() {
    init_tracing();

    tracing::info!("Starting Kanban API");

    let repository_config = or_exit(RepositoryConfig::from_env(), "Configuration error");
    tracing::info!(
        storage_mode = ?repository_config.storage_mode,
        session_store_mode = ?repository_config.session_store_mode,
        "Repository configuration loaded"
    );

    let server_config = or_exit(ServerConfig::from_env(), "Server configuration error");
    let auth_config = or_exit(AuthConfig::from_env(), "Authentication configuration error");
    let tokens = or_exit(
        TokenService::new(auth_config.jwt_secret, auth_config.token_ttl),
        "Failed to initialize token service",
    );

    let repositories = or_exit(
        RepositoryFactory::new(repository_config).create().await,
        "Failed to initialize repositories",
    );
    tracing::info!("Repositories initialized successfully");

    let application_state = AppState::with_config(
        repositories,
        tokens,
        AppConfig {
            cookie_secure: server_config.cookie_secure,
        },
    );
    let application = create_router(application_state, &server_config);

    let address = or_exit(server_config.socket_address(), "Invalid server address");
    let listener = or_exit(
        TcpListener::bind(address).await,
        "Failed to bind server address",
    );

    match listener.local_addr() {
        Ok(address) => tracing::info!("Listening on {}", address),
        Err(error) => tracing::warn!(%error, "Could not determine local address"),
    }

    if let Err(error) = axum::serve(listener, application)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(%error, "Server error");
        std::process::exit(1);
    }

    tracing::info!("Server shutdown complete");
}

/// Completes when SIGINT or, on Unix, SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
