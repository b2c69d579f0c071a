use log::*;
use tokio::net::TcpListener;

pub use error::{Error, Result};
pub use service::AppState;

mod controller;
mod error;
mod params;
pub mod router;
mod sse;

/// Binds the configured address and serves the router until the process exits.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let address = app_state.config.bind_address();
    let listener = TcpListener::bind(&address).await?;

    info!("Server starting... listening for connections on http://{address}");

    axum::serve(listener, router::define_routes(app_state)).await
}
