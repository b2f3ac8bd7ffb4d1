//! HTTP server lifecycle: bind, serve the API router, stop on Ctrl-C.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;

/// Bind `addr` and serve `app` until Ctrl-C.
pub async fn serve(addr: SocketAddr, app: Router) -> std::io::Result<()> {
    serve_with_shutdown(addr, app, ctrl_c()).await
}

/// Bind `addr` and serve `app` until `shutdown` resolves.
///
/// In-flight requests are allowed to finish after the signal.
pub async fn serve_with_shutdown<F>(addr: SocketAddr, app: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(%local_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        // Without a signal handler, run until the process is killed.
        std::future::pending::<()>().await;
    }
    tracing::info!("API server received shutdown signal");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    use axum::routing::get;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn serves_until_shutdown_signal() {
        // Reserve a free port, then hand it to the server.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port);
        let app = Router::new().route("/", get(|| async { "up" }));
        let (tx, rx) = oneshot::channel::<()>();

        let server = tokio::spawn(serve_with_shutdown(addr, app, async move {
            let _ = rx.await;
        }));

        // Retry until the listener is up.
        let mut reply = None;
        for _ in 0..50 {
            if let Ok(mut stream) = tokio::net::TcpStream::connect(addr).await {
                use tokio::io::{AsyncReadExt, AsyncWriteExt};
                stream
                    .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
                    .await
                    .unwrap();
                let mut buf = Vec::new();
                stream.read_to_end(&mut buf).await.unwrap();
                reply = Some(String::from_utf8_lossy(&buf).to_string());
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let reply = reply.expect("server should accept connections");
        assert!(reply.starts_with("HTTP/1.1 200"));
        assert!(reply.ends_with("up"));

        tx.send(()).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server should stop")
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap();
        let app = Router::new();
        let result = serve_with_shutdown(addr, app, async {}).await;
        assert!(result.is_err());
    }
}
