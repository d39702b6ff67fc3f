// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server implementation module
//!
//! This module provides the main server struct and implementation for the bank API server,
//! including server lifecycle management, router configuration, and coordinated graceful
//! shutdown using `CancellationToken`.

use std::{future::IntoFuture, net::SocketAddr, sync::Arc, time::Duration};

use archivist::{AccountArchivist, CustomerArchivist, EventArchivist, InMemoryArchivist};
use axum::{
    Router,
    http::{HeaderName, StatusCode},
};
use hyper::Request;
use pipeline::LOG_TOKEN_HEADER;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, warn};

use crate::{
    config::ServerConfig,
    error::{ServerError, ServerResult},
    routes::create_routes,
    state::ServerState,
};

// Server constants
const LOG_TOKEN: HeaderName = HeaderName::from_static(LOG_TOKEN_HEADER);
const DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_FORCE_SHUTDOWN_TIMEOUT_SECONDS: u64 = 5;

/// Configuration for server shutdown behavior
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Maximum time to wait for graceful shutdown before forcing termination
    pub graceful_timeout: Duration,
    /// Maximum time to wait for the aborted server task after forcing termination
    pub force_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            graceful_timeout: Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS),
            force_timeout: Duration::from_secs(DEFAULT_FORCE_SHUTDOWN_TIMEOUT_SECONDS),
        }
    }
}

/// Requests running past `duration` are answered with `408 Request Timeout`
fn timeout_layer(duration: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, duration)
}

/// Main server struct
#[derive(Debug)]
pub struct Server {
    /// Server configuration
    config: ServerConfig,
    /// Application router
    router: Router,
    /// Server state
    state: ServerState,
    /// Cancellation token for coordinated shutdown
    cancellation_token: CancellationToken,
    /// Configuration for coordinated shutdown
    graceful_shutdown_config: ShutdownConfig,
}

impl Server {
    /// Create new server instance backed by the seeded in-memory archivist
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the seed data cannot be stored or a resource
    /// cannot be built.
    pub fn new(config: ServerConfig, shutdown_config: ShutdownConfig) -> ServerResult<Self> {
        let archivist = Arc::new(InMemoryArchivist::seeded(
            config.instrumentation.archivist_limit_ms.value(),
        )?);
        let customers: Arc<dyn CustomerArchivist> = archivist.clone();
        let accounts: Arc<dyn AccountArchivist> = archivist.clone();
        let events: Arc<dyn EventArchivist> = archivist;
        Self::with_archivists(config, shutdown_config, customers, accounts, events)
    }

    /// Create server with custom archivists for dependency injection
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Pipeline` if a resource cannot be built.
    pub fn with_archivists(
        config: ServerConfig,
        graceful_shutdown_config: ShutdownConfig,
        customers: Arc<dyn CustomerArchivist>,
        accounts: Arc<dyn AccountArchivist>,
        events: Arc<dyn EventArchivist>,
    ) -> ServerResult<Self> {
        let cancellation_token = CancellationToken::new();
        let state = ServerState::new(
            config.clone(),
            customers,
            accounts,
            events,
            cancellation_token.child_token(),
        )?;
        let router = Self::create_router(state.clone());

        Ok(Self {
            config,
            router,
            state,
            cancellation_token,
            graceful_shutdown_config,
        })
    }

    /// Create application router with middleware
    ///
    /// Requests without an `X-Log-Token` get a fresh UUID, so the tracing
    /// span, the resource pipeline and the response all carry the same token.
    fn create_router(state: ServerState) -> Router {
        let timeout_duration = state.config().timeout_seconds.value();

        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(LOG_TOKEN, MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                    if let Some(log_token) = req.headers().get(LOG_TOKEN) {
                        info_span!(
                            "http_request",
                            ?log_token,
                            method = %req.method(),
                            uri = %req.uri()
                        )
                    } else {
                        error!("failed to extract log token from request");
                        info_span!("http_request", log_token = "unknown")
                    }
                }),
            )
            .layer(PropagateRequestIdLayer::new(LOG_TOKEN))
            .layer(CorsLayer::permissive())
            .layer(timeout_layer(timeout_duration));

        create_routes().layer(middleware).with_state(state)
    }

    /// Run the server with coordinated graceful shutdown
    ///
    /// Once cancelled, in-flight requests get the graceful timeout to finish
    /// before the server task is aborted.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address,
    /// or `ServerError::Startup` if the server fails to start.
    pub async fn run(self) -> ServerResult<()> {
        let (listener, actual_addr) = self.bind().await?;

        info!(
            address = %actual_addr,
            environment = %self.config.environment,
            "Bank API server starting",
        );

        let cancellation_token = self.cancellation_token.clone();
        let shutdown_token = cancellation_token.clone();
        tokio::spawn(async move {
            info!("spawning the graceful shutdown task");
            Self::shutdown_signal_handler(shutdown_token).await;
        });

        let serve_token = cancellation_token.clone();
        let mut server = tokio::spawn(
            axum::serve(listener, self.router)
                .with_graceful_shutdown(async move {
                    serve_token.cancelled().await;
                    info!("Bank API server draining connections");
                })
                .into_future(),
        );

        tokio::select! {
            joined = &mut server => return Self::server_outcome(joined),
            () = cancellation_token.cancelled() => {}
        }

        let ShutdownConfig {
            graceful_timeout,
            force_timeout,
        } = self.graceful_shutdown_config;
        if let Ok(joined) = tokio::time::timeout(graceful_timeout, &mut server).await {
            info!("Bank API server shut down gracefully");
            return Self::server_outcome(joined);
        }

        warn!(
            timeout_seconds = graceful_timeout.as_secs(),
            "Graceful shutdown timed out, aborting server task"
        );
        server.abort();
        if tokio::time::timeout(force_timeout, server).await.is_err() {
            error!("Server task did not stop after abort");
        }
        Ok(())
    }

    /// Bind the configured address, reporting the address actually bound
    async fn bind(&self) -> ServerResult<(TcpListener, SocketAddr)> {
        let address = self.config.socket_addr();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind { address, source })?;
        let bound = listener
            .local_addr()
            .map_err(|source| ServerError::Startup { source })?;
        Ok((listener, bound))
    }

    fn server_outcome(
        joined: Result<std::io::Result<()>, tokio::task::JoinError>,
    ) -> ServerResult<()> {
        match joined? {
            Ok(()) => Ok(()),
            Err(e) => {
                error!(error = ?e, "Server error during shutdown");
                Err(ServerError::Shutdown { source: e })
            }
        }
    }

    /// Handle shutdown signals and trigger coordinated cancellation
    ///
    /// This function listens for SIGINT (Ctrl+C) and SIGTERM signals,
    /// and cancels the provided cancellation token when received.
    ///
    /// # Arguments
    ///
    /// * `cancellation_token` - Token to cancel when shutdown signal is received
    async fn shutdown_signal_handler(cancellation_token: CancellationToken) {
        let signal_received = async {
            #[cfg(unix)]
            #[allow(clippy::expect_used)]
            {
                use tokio::signal::unix::{SignalKind, signal};

                let mut sigterm =
                    signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
                let mut sigint =
                    signal(SignalKind::interrupt()).expect("Failed to register SIGINT handler");

                tokio::select! {
                    _ = sigterm.recv() => {
                        warn!("Received SIGTERM signal, initiating coordinated shutdown");
                        "SIGTERM"
                    },
                    _ = sigint.recv() => {
                        warn!("Received SIGINT signal, initiating coordinated shutdown");
                        "SIGINT"
                    },
                }
            }

            #[cfg(not(unix))]
            #[allow(clippy::expect_used)]
            {
                tokio::signal::ctrl_c()
                    .await
                    .expect("Failed to install CTRL+C signal handler");
                warn!("Received CTRL+C signal, initiating coordinated shutdown");
                "CTRL+C"
            }
        };

        tokio::select! {
            signal_name = signal_received => {
                warn!("Shutdown signal {} received, cancelling all operations...", signal_name);
                cancellation_token.cancel();
            },
            () = cancellation_token.cancelled() => {
                warn!("Cancellation token already cancelled, shutdown signal handler exiting");
            }
        }
    }

    /// Returns a clone of the cancellation token for coordinated shutdown
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Initiates graceful shutdown by cancelling the server's cancellation token
    pub fn shutdown(&self) {
        info!("programmatic shutdown requested");
        self.cancellation_token.cancel();
    }

    /// Run server for testing, returns the bound address
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address.
    pub async fn run_for_testing(self) -> ServerResult<(SocketAddr, CancellationToken)> {
        let (listener, actual_addr) = self.bind().await?;

        let token = self.cancellation_token.child_token();
        let task = token.child_token();
        let _server: JoinHandle<_> = tokio::spawn(async move {
            axum::serve(listener, self.router)
                .with_graceful_shutdown(async move { task.cancelled().await })
                .await
        });

        Ok((actual_addr, token))
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get server state for testing
    pub fn state(&self) -> &ServerState {
        &self.state
    }
}
