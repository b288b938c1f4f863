// src/server/mod.rs

//! Development server.
//!
//! Serves the output tree over HTTP and pushes reload notifications to
//! connected browsers over a websocket. HTML pages get a small client
//! script injected so no browser extension is needed.

pub mod assets;
pub mod reload;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::ServerSection;
use crate::errors::Result;

pub use reload::RELOAD_PATH;

/// Something that can tell browsers to reload.
pub trait Reloader: Send + Sync {
    /// Never blocks and never fails, even with nobody listening.
    fn reload(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    pub host: String,
    /// `0` picks a free port.
    pub port: u16,
    pub inject_reload_script: bool,
}

impl From<&ServerSection> for ServerOptions {
    fn from(section: &ServerSection) -> Self {
        Self {
            host: section.host.clone(),
            port: section.port,
            inject_reload_script: section.inject_reload_script,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ServerState {
    pub root: Arc<PathBuf>,
    pub reload_tx: broadcast::Sender<()>,
    pub inject_reload_script: bool,
}

/// A running dev server. Dropping it does not stop the server; call
/// [`DevServer::shutdown`].
#[derive(Debug)]
pub struct DevServer {
    addr: SocketAddr,
    reload_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

impl DevServer {
    /// Bind `host:port` and start serving `root` in the background.
    pub async fn start(root: impl Into<PathBuf>, options: ServerOptions) -> Result<Self> {
        let root = root.into();
        let listener = TcpListener::bind((options.host.as_str(), options.port))
            .await
            .with_context(|| format!("binding dev server to {}:{}", options.host, options.port))?;
        let addr = listener.local_addr()?;

        let (reload_tx, _) = broadcast::channel(16);
        let app = router(ServerState {
            root: Arc::new(root.clone()),
            reload_tx: reload_tx.clone(),
            inject_reload_script: options.inject_reload_script,
        });

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!(error = %e, "dev server stopped");
            }
        });

        info!(url = %format!("http://{addr}"), root = ?root, "dev server listening");

        Ok(Self {
            addr,
            reload_tx,
            handle,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn shutdown(self) {
        self.handle.abort();
    }
}

impl Reloader for DevServer {
    fn reload(&self) {
        match self.reload_tx.send(()) {
            Ok(clients) => debug!(clients, "reload broadcast"),
            Err(_) => debug!("reload requested with no connected clients"),
        }
    }
}

pub(crate) fn router(state: ServerState) -> Router {
    Router::new()
        .route(RELOAD_PATH, get(reload::reload_socket))
        .fallback(assets::serve_asset)
        .with_state(state)
}
