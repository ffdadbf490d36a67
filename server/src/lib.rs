//! treffpunkt-server – Bibliotheks-Root
//!
//! Deklariert die Server-Module und verdrahtet den Signaling-Service
//! mit Konfiguration und Shutdown-Behandlung.

pub mod config;

use anyhow::Result;
use config::ServerConfig;
use std::net::SocketAddr;
use treffpunkt_signaling::{SignalingConfig, SignalingServer, SignalingState};

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet den Signaling-Service und laeuft bis zum Shutdown-Signal
    pub async fn starten(self) -> Result<()> {
        let bind_addr: SocketAddr = self.config.tcp_bind_adresse().parse().map_err(|e| {
            anyhow::anyhow!(
                "Ungueltige Bind-Adresse '{}': {e}",
                self.config.tcp_bind_adresse()
            )
        })?;

        let signaling_config = SignalingConfig {
            server_name: self.config.server.name.clone(),
            max_clients: self.config.server.max_clients,
            keepalive_sek: self.config.netzwerk.keepalive_sek,
            verbindungs_timeout_sek: self.config.netzwerk.verbindungs_timeout_sek,
        };
        let state = SignalingState::neu(signaling_config);

        let server = SignalingServer::binden(state, bind_addr).await?;
        tracing::info!(
            server_name = %self.config.server.name,
            adresse = %server.lokale_adresse()?,
            "Server startet"
        );

        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        let server_task = tokio::spawn(server.starten(shutdown_rx));

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");

        shutdown_tx.send(true)?;
        server_task.await??;

        Ok(())
    }
}
