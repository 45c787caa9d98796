use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::ServerConfig;
use crate::http::connection::Connection;
use crate::http::handler::Handler;
use crate::http::reader::ReadLimits;

/// A running server: one accept loop plus one task per connection.
///
/// Dropping the server stops accepting as well; in-flight connections are
/// left to finish on their own.
pub struct Server {
    local_addr: SocketAddr,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    accept_task: Option<JoinHandle<()>>,
}

impl Server {
    /// Binds to the configured address and starts accepting in the background.
    pub async fn serve<H>(cfg: &ServerConfig, handler: H) -> anyhow::Result<Self>
    where
        H: Handler<TcpStream>,
    {
        let addr = cfg.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("error listening on {}", addr))?;
        let local_addr = listener.local_addr()?;
        info!("Listening on {}", local_addr);

        let closed = Arc::new(AtomicBool::new(false));
        let shutdown = Arc::new(Notify::new());

        let accept_task = tokio::spawn(accept_loop(
            listener,
            Arc::new(handler),
            cfg.read_limits(),
            Arc::clone(&closed),
            Arc::clone(&shutdown),
        ));

        Ok(Self {
            local_addr,
            closed,
            shutdown,
            accept_task: Some(accept_task),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stops accepting and waits for the accept loop to exit.
    pub async fn close(&mut self) -> anyhow::Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.shutdown.notify_one();

        if let Some(task) = self.accept_task.take() {
            task.await.context("accept loop panicked")?;
            info!("Server closed");
        }
        Ok(())
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.shutdown.notify_one();
        }
    }
}

async fn accept_loop<H>(
    listener: TcpListener,
    handler: Arc<H>,
    limits: ReadLimits,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
) where
    H: Handler<TcpStream>,
{
    loop {
        tokio::select! {
            _ = shutdown.notified() => break,

            res = listener.accept() => {
                let (socket, peer) = match res {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        if closed.load(Ordering::SeqCst) {
                            break;
                        }
                        tracing::error!(error = %e, "Error accepting connection");
                        continue;
                    }
                };
                info!("Accepted connection from {}", peer);

                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    let conn = Connection::new(socket, peer, limits);
                    if let Err(e) = conn.run(handler.as_ref()).await {
                        tracing::error!("Connection error from {}: {:#}", peer, e);
                    }
                });
            }
        }
    }
}
