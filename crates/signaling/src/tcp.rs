//! TCP-Listener – Bindet Socket, akzeptiert Verbindungen
//!
//! Der `SignalingServer` bindet einen TCP-Socket und startet fuer jede
//! eingehende Verbindung einen eigenen tokio-Task mit einer
//! `ClientConnection`.
//!
//! Binden und Starten sind getrennt, damit Aufrufer Port 0 binden und
//! die tatsaechliche Adresse abfragen koennen.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::connection::ClientConnection;
use crate::server_state::SignalingState;

/// TCP-Signaling-Server
///
/// Akzeptiert Verbindungen in einer Loop; jede Verbindung laeuft als
/// eigener tokio-Task.
pub struct SignalingServer {
    state: Arc<SignalingState>,
    listener: TcpListener,
}

impl SignalingServer {
    /// Bindet den TCP-Socket
    pub async fn binden(
        state: Arc<SignalingState>,
        bind_addr: SocketAddr,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(bind_addr).await?;
        Ok(Self { state, listener })
    }

    /// Gibt die tatsaechlich gebundene Adresse zurueck
    pub fn lokale_adresse(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Akzeptiert Verbindungen bis `shutdown_rx` ein `true`-Signal empfaengt
    pub async fn starten(
        self,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) -> std::io::Result<()> {
        let lokale_addr = self.lokale_adresse()?;
        tracing::info!(
            adresse = %lokale_addr,
            "TCP Signaling-Server gestartet"
        );

        loop {
            tokio::select! {
                // Neue eingehende Verbindung
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            // Client-Limit pruefen
                            let verbunden = self.state.broadcaster.client_anzahl() as u32;
                            if verbunden >= self.state.config.max_clients {
                                tracing::warn!(
                                    peer = %peer_addr,
                                    max = self.state.config.max_clients,
                                    "Server voll – Verbindung abgelehnt"
                                );
                                drop(stream);
                                continue;
                            }

                            tracing::debug!(peer = %peer_addr, "Verbindung akzeptiert");

                            let verbindung = ClientConnection::neu(
                                Arc::clone(&self.state),
                                peer_addr,
                            );
                            let shutdown_rx_clone = shutdown_rx.clone();

                            tokio::spawn(async move {
                                verbindung.verarbeiten(stream, shutdown_rx_clone).await;
                            });
                        }
                        Err(e) => {
                            tracing::error!(fehler = %e, "TCP-Accept-Fehler");
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        }
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Signaling-Server: Shutdown-Signal empfangen");
                        break;
                    }
                }
            }
        }

        tracing::info!("TCP Signaling-Server gestoppt");
        Ok(())
    }
}
