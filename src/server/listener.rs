use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::{TcpListener, TcpSocket};
use tracing::info;

/// Binds `addr` and starts listening with the given backlog.
///
/// Must be called from within a tokio runtime.
pub fn bind(addr: &str, backlog: u32) -> anyhow::Result<TcpListener> {
    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("invalid listen address {addr}"))?;

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .context("socket failed")?;

    socket.set_reuseaddr(true).context("setsockopt failed")?;
    socket.bind(addr).context("bind failed")?;
    let listener = socket.listen(backlog).context("listen failed")?;

    info!(address = %listener.local_addr()?, backlog, "server started listening");
    Ok(listener)
}
