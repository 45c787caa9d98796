//! Accepts connections, parses one request from each and prints it.
//! No response is written.

use httpwire::config::Config;
use httpwire::http::reader::read_request;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let limits = cfg.server.read_limits();

    let listener = TcpListener::bind(cfg.server.listen_addr()).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    loop {
        let (mut socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::error!(error = %e, "Error accepting connection");
                continue;
            }
        };

        tokio::spawn(async move {
            match read_request(&mut socket, limits).await {
                Ok(request) => print!("{}", request),
                Err(e) => tracing::error!("Error reading from {}: {}", peer, e),
            }
        });
    }
}
