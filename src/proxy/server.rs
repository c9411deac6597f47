//! Accept loop: one isolated session task per inbound connection.
//!
//! # Responsibilities
//! - Bind the configured listen address
//! - Cap concurrent sessions via slot permits
//! - Spawn one detached session task per accepted connection
//!
//! Sessions share only the registry and selector; everything else about a
//! session is owned by its task.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

use crate::balancer::{Registry, Selector};
use crate::config::ListenerConfig;
use crate::proxy::session;

/// Errors that prevent the balancer from serving at all.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address could not be parsed or bound.
    #[error("cannot listen on configured address: {0}")]
    Bind(#[source] std::io::Error),
}

/// The balancer's front door. Accepts connections and dispatches sessions
/// until process termination.
pub struct Server {
    listener: TcpListener,
    /// One permit per live session; an accept waits when the cap is
    /// reached and a finished session returns its slot.
    session_slots: Arc<Semaphore>,
    registry: Arc<Registry>,
    selector: Arc<Selector>,
}

impl Server {
    /// Bind the listen address and prepare the session cap.
    pub async fn bind(
        config: &ListenerConfig,
        registry: Arc<Registry>,
        selector: Arc<Selector>,
    ) -> Result<Self, ServerError> {
        let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
            ServerError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;

        let listener = TcpListener::bind(addr).await.map_err(ServerError::Bind)?;

        tracing::info!(
            address = %listener.local_addr().map_err(ServerError::Bind)?,
            max_sessions = config.max_connections,
            "balancer listening"
        );

        Ok(Self {
            listener,
            session_slots: Arc::new(Semaphore::new(config.max_connections)),
            registry,
            selector,
        })
    }

    /// The address the balancer is actually listening on.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Session slots not currently held by a live session.
    pub fn open_slots(&self) -> usize {
        self.session_slots.available_permits()
    }

    /// Accept and dispatch until process termination. Accept failures are
    /// logged and the loop continues; there is no drain on shutdown.
    pub async fn run(self) {
        loop {
            // Take a slot before accepting so a full balancer stops
            // pulling new connections off the backlog.
            let slot = self
                .session_slots
                .clone()
                .acquire_owned()
                .await
                .expect("session slot semaphore closed");

            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    tracing::debug!(
                        peer = %peer,
                        open_slots = self.session_slots.available_permits(),
                        "session accepted"
                    );
                    let registry = Arc::clone(&self.registry);
                    let selector = Arc::clone(&self.selector);
                    tokio::spawn(async move {
                        session::serve(registry, selector, stream, peer).await;
                        // Slot held for the session's whole lifetime, so
                        // the cap tracks live sessions even on panic.
                        drop(slot);
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
