use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{api, config::ServiceConfig, types::PkceToken, warning};

pub fn router(config: ServiceConfig, state: Arc<Mutex<Option<PkceToken>>>) -> Router {
    Router::new()
        .route("/callback", get(api::callback))
        .layer(Extension(state))
        .layer(Extension(config))
}

/// Binds the callback server address so a busy port is reported before the
/// browser is opened.
pub async fn bind(config: &ServiceConfig) -> std::io::Result<TcpListener> {
    let addr = SocketAddr::from_str(&config.server_addr).map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid server address '{}': {}", config.server_addr, e),
        )
    })?;
    TcpListener::bind(addr).await
}

pub async fn serve(
    listener: TcpListener,
    config: ServiceConfig,
    state: Arc<Mutex<Option<PkceToken>>>,
) {
    if let Err(e) = axum::serve(listener, router(config, state)).await {
        warning!("Callback server stopped: {}", e);
    }
}
