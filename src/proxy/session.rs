//! One proxied client session.
//!
//! # Responsibilities
//! - Lazy connect: no backend is contacted until the client sends data
//! - Failover across the selector's candidate list at connect time
//! - Bidirectional byte relay with per-direction accounting
//! - Inflight bookkeeping via an RAII guard, restored exactly once
//!
//! # Design Decisions
//! - A mid-session backend failure never triggers failover; bytes already
//!   forwarded cannot be replayed, so the session simply ends
//! - Connection-reset and broken-pipe conditions during the relay are
//!   normal teardown, logged at debug
//! - No idle or maximum-duration timeout governs an established relay; the
//!   only timer in the system is the quarantine window

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::balancer::{Registry, Selector, SessionError};
use crate::proxy::relay::{pump, RELAY_BUFFER_SIZE};

/// Drive one accepted client connection to completion.
pub async fn serve(
    registry: Arc<Registry>,
    selector: Arc<Selector>,
    mut client: TcpStream,
    peer: SocketAddr,
) {
    let started = Instant::now();

    // Lazy connect: wait for the first chunk before touching any backend.
    let mut first = vec![0u8; RELAY_BUFFER_SIZE];
    let first_len = match client.read(&mut first).await {
        Ok(0) => {
            tracing::debug!(peer = %peer, "client closed before sending data");
            return;
        }
        Ok(n) => n,
        Err(e) => {
            tracing::debug!(peer = %peer, error = %e, "client read failed before first byte");
            return;
        }
    };

    let (index, mut backend) = match establish(&registry, &selector).await {
        Ok(connected) => connected,
        Err(SessionError::NoBackendAvailable) => {
            tracing::warn!(peer = %peer, "no backend available; closing client");
            return;
        }
        Err(e) => {
            tracing::warn!(peer = %peer, error = %e, "session aborted before commit");
            return;
        }
    };

    // Commit: the session now counts against the chosen backend.
    let guard = registry.track_session(index);
    tracing::info!(
        peer = %peer,
        backend = index,
        addr = %registry.backend(index).addr(),
        policy = %selector.policy(),
        inflight = ?registry.inflight_snapshot(),
        "backend selected"
    );

    let bytes_up = AtomicU64::new(0);
    let bytes_down = AtomicU64::new(0);

    let relay_result = relay(
        &mut client,
        &mut backend,
        &first[..first_len],
        &bytes_up,
        &bytes_down,
    )
    .await;

    if let Err(e) = &relay_result {
        if is_normal_teardown(e) {
            tracing::debug!(peer = %peer, backend = index, error = %e, "relay ended by peer");
        } else {
            tracing::warn!(peer = %peer, backend = index, error = %e, "relay error");
        }
    }

    drop(guard);
    tracing::info!(
        peer = %peer,
        backend = index,
        addr = %registry.backend(index).addr(),
        duration_ms = started.elapsed().as_millis() as u64,
        bytes_up = bytes_up.load(Ordering::Relaxed),
        bytes_down = bytes_down.load(Ordering::Relaxed),
        inflight = ?registry.inflight_snapshot(),
        "session complete"
    );
}

/// Try candidates in order until one connects.
///
/// Each failed attempt quarantines its backend inside `Registry::connect`;
/// exhaustion (or an empty candidate list) is terminal for the session.
async fn establish(
    registry: &Arc<Registry>,
    selector: &Selector,
) -> Result<(usize, TcpStream), SessionError> {
    for index in selector.candidates() {
        match registry.connect(index).await {
            Ok(stream) => return Ok((index, stream)),
            Err(SessionError::Connect { .. }) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(SessionError::NoBackendAvailable)
}

/// Forward the first chunk, then run both relay directions to completion.
async fn relay(
    client: &mut TcpStream,
    backend: &mut TcpStream,
    first: &[u8],
    bytes_up: &AtomicU64,
    bytes_down: &AtomicU64,
) -> Result<(), SessionError> {
    // The chunk that triggered the lazy connect goes out before the pumps
    // start, so no bytes are lost or reordered.
    backend.write_all(first).await?;
    bytes_up.fetch_add(first.len() as u64, Ordering::Relaxed);

    let (client_read, client_write) = client.split();
    let (backend_read, backend_write) = backend.split();

    let (up, down) = tokio::join!(
        pump(client_read, backend_write, bytes_up),
        pump(backend_read, client_write, bytes_down),
    );

    up?;
    down?;
    Ok(())
}

/// Reset/broken-pipe conditions are how TCP peers hang up on us; they end
/// the session but are not errors worth escalating.
fn is_normal_teardown(error: &SessionError) -> bool {
    match error {
        SessionError::Relay(e) => matches!(
            e.kind(),
            std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::BrokenPipe
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendConfig, Policy};
    use std::time::Duration;

    fn registry_for(ports: &[u16]) -> Arc<Registry> {
        let configs: Vec<BackendConfig> = ports
            .iter()
            .map(|&port| BackendConfig {
                host: "127.0.0.1".to_string(),
                port,
            })
            .collect();
        Arc::new(Registry::new(&configs, Duration::from_secs(10)))
    }

    #[tokio::test]
    async fn establish_fails_over_to_second_candidate() {
        // Port 1 refuses; the listener accepts.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let good_port = listener.local_addr().unwrap().port();

        let registry = registry_for(&[1, good_port]);
        let selector = Selector::new(Arc::clone(&registry), Policy::RoundRobin);

        let (index, _stream) = establish(&registry, &selector).await.unwrap();
        assert_eq!(index, 1);
        // The failed candidate was quarantined on the way.
        assert_eq!(registry.available_indices(), vec![1]);
    }

    #[tokio::test]
    async fn establish_exhaustion_is_no_backend_available() {
        let registry = registry_for(&[1]);
        let selector = Selector::new(Arc::clone(&registry), Policy::RoundRobin);

        let err = establish(&registry, &selector).await.unwrap_err();
        assert!(matches!(err, SessionError::NoBackendAvailable));

        // And once quarantined, selection is empty up front.
        let err = establish(&registry, &selector).await.unwrap_err();
        assert!(matches!(err, SessionError::NoBackendAvailable));
        assert_eq!(registry.inflight_snapshot(), vec![0]);
    }

    #[test]
    fn teardown_classification() {
        let reset = SessionError::Relay(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        ));
        assert!(is_normal_teardown(&reset));

        let other = SessionError::Relay(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "bad",
        ));
        assert!(!is_normal_teardown(&other));
        assert!(!is_normal_teardown(&SessionError::NoBackendAvailable));
    }
}
