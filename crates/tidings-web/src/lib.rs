//! JSON HTTP API in front of [`tidings_feed::FeedResolver`].

mod error;
mod routes;

use std::future::Future;
use std::io;
use std::net::{AddrParseError, SocketAddr};
use std::str::FromStr as _;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use snafu::{ResultExt as _, Snafu, Whatever};
use tidings_feed::{DynFeedResolver, FeedConfigError};
use tidings_util_error::WhateverResult;
use tokio::net::{TcpListener, TcpSocket};
use tokio::signal;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use self::error::ApiError;
pub use self::routes::VIEWER_HEADER;

const LOG_TARGET: &str = "tidings::web";

#[derive(Clone, Debug)]
pub struct Opts {
    pub listen: String,
    pub cors_origin: Option<String>,
    pub reuseport: bool,
}

impl Opts {
    pub fn new(listen: String, cors_origin: Option<String>, reuseport: bool) -> Self {
        Self {
            listen,
            cors_origin,
            reuseport,
        }
    }

    pub fn cors_origin(&self, listen: SocketAddr) -> WhateverResult<HeaderValue> {
        self.cors_origin
            .clone()
            .unwrap_or_else(|| format!("http://{listen}"))
            .parse()
            .whatever_context("cors_origin does not parse as an http value")
    }
}

/// What every request handler gets to see
pub struct AppState {
    pub resolver: DynFeedResolver,
    /// Flips to `true` when the server starts shutting down
    pub shutdown: watch::Receiver<bool>,
}

pub type SharedState = Arc<AppState>;

#[derive(Debug, Snafu)]
pub enum WebServerError {
    #[snafu(transparent)]
    IO { source: io::Error },

    ListenAddr { source: AddrParseError },

    Cors { source: Whatever },

    Config { source: FeedConfigError },
}

pub type ServerResult<T> = std::result::Result<T, WebServerError>;

pub struct Server {
    listener: TcpListener,
    state: SharedState,
    shutdown_tx: watch::Sender<bool>,
    opts: Opts,
}

impl Server {
    pub async fn init(opts: Opts, resolver: DynFeedResolver) -> ServerResult<Server> {
        resolver.config().validate().context(ConfigSnafu)?;
        let listener = Self::get_listener(&opts).await?;

        let (shutdown_tx, shutdown) = watch::channel(false);
        let state = Arc::new(AppState { resolver, shutdown });

        info!(target: LOG_TARGET, "Listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            state,
            shutdown_tx,
            opts,
        })
    }

    pub async fn get_listener(opts: &Opts) -> ServerResult<TcpListener> {
        let socket = {
            let addr = SocketAddr::from_str(&opts.listen).context(ListenAddrSnafu)?;

            let socket = if addr.is_ipv4() {
                TcpSocket::new_v4()?
            } else {
                TcpSocket::new_v6()?
            };
            if opts.reuseport {
                #[cfg(unix)]
                socket.set_reuseport(true)?;
            }
            socket.set_nodelay(true)?;

            socket.bind(addr)?;

            socket
        };

        Ok(socket.listen(1024)?)
    }

    /// Serve until Ctrl-C or SIGTERM
    pub async fn run(self) -> ServerResult<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve until `signal` completes
    ///
    /// In-flight feed requests see the cancellation right away; the
    /// connections are then drained gracefully.
    pub async fn run_until(
        self,
        signal: impl Future<Output = ()> + Send + 'static,
    ) -> ServerResult<()> {
        let listen = self.addr()?;
        let router = routes::route_handler(self.state.clone())
            .layer(cors_layer(&self.opts, listen)?)
            .layer(TraceLayer::new_for_http());

        let shutdown_tx = self.shutdown_tx;
        info!(target: LOG_TARGET, %listen, "Starting server");
        axum::serve(self.listener, router.into_make_service())
            .with_graceful_shutdown(async move {
                signal.await;
                info!(target: LOG_TARGET, "Shutting down");
                let _ = shutdown_tx.send(true);
            })
            .await?;

        Ok(())
    }

    pub fn addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

fn cors_layer(opts: &Opts, listen: SocketAddr) -> ServerResult<CorsLayer> {
    Ok(CorsLayer::new()
        .allow_headers([ACCEPT, CONTENT_TYPE, HeaderName::from_static(VIEWER_HEADER)])
        .max_age(Duration::from_secs(86400))
        .allow_origin(opts.cors_origin(listen).context(CorsSnafu)?)
        .allow_methods([Method::GET, Method::OPTIONS, Method::HEAD]))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
