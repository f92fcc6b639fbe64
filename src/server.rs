//! Bind-then-run server wrapper. The listener is held between the two steps
//! so the advertised base URL always carries the real port, ephemeral or not.

use crate::config::HarnessConfig;
use crate::routes::harness_routes;
use crate::state::HarnessState;
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;

pub struct HarnessServer {
    listener: TcpListener,
    state: HarnessState,
    body_limit: usize,
    base_url: String,
}

impl HarnessServer {
    /// Bind the listener and derive the session state. `port` 0 binds an
    /// ephemeral port.
    pub async fn bind(config: &HarnessConfig) -> io::Result<HarnessServer> {
        let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
        let addr = listener.local_addr()?;
        let base_url = format!("http://localhost:{}/", addr.port());
        let state = HarnessState::new(&base_url);
        Ok(HarnessServer { listener, state, body_limit: config.body_limit, base_url })
    }

    /// Root URL clients should use, with a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until the process ends.
    pub async fn run(self) -> io::Result<()> {
        let app = harness_routes(self.state, self.body_limit);
        axum::serve(self.listener, app).await
    }
}
