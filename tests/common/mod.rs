//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use tcp_balancer::balancer::{Registry, Selector};
use tcp_balancer::config::{BackendConfig, ListenerConfig, Policy};
use tcp_balancer::proxy::Server;

/// Start a mock backend that echoes every byte back until the client
/// half-closes, then closes its side.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        loop {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => {
                                    if socket.write_all(&buf[..n]).await.is_err() {
                                        break;
                                    }
                                }
                            }
                        }
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a mock backend that greets every connection with a fixed tag,
/// drains the client until EOF, and closes. Returns the address and an
/// accept counter.
#[allow(dead_code)]
pub async fn start_tag_backend(tag: &'static [u8]) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepts);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(async move {
                        let _ = socket.write_all(tag).await;
                        let mut buf = [0u8; 4096];
                        loop {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => break,
                                Ok(_) => {}
                            }
                        }
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, accepts)
}

/// A port with nothing listening on it: connects are refused.
pub async fn dead_backend_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Spin up a balancer on an ephemeral port in front of the given backends.
/// Returns the balancer's address and the shared registry for assertions.
pub async fn spawn_balancer(
    backends: &[SocketAddr],
    policy: Policy,
    quarantine: Duration,
) -> (SocketAddr, Arc<Registry>) {
    let configs: Vec<BackendConfig> = backends
        .iter()
        .map(|addr| BackendConfig {
            host: addr.ip().to_string(),
            port: addr.port(),
        })
        .collect();

    let registry = Arc::new(Registry::new(&configs, quarantine));
    let selector = Arc::new(Selector::new(Arc::clone(&registry), policy));

    let listener_config = ListenerConfig {
        bind_address: "127.0.0.1:0".to_string(),
        max_connections: 64,
    };
    let server = Server::bind(&listener_config, Arc::clone(&registry), selector)
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();

    tokio::spawn(server.run());

    (addr, registry)
}
