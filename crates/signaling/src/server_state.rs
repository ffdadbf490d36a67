//! Gemeinsamer Server-Zustand fuer den Signaling-Service
//!
//! Haelt Registry, Broadcaster und Verzeichnis als geteilte Handles,
//! die sicher zwischen tokio-Tasks geteilt werden koennen.

use std::sync::Arc;

use crate::broadcast::EventBroadcaster;
use crate::directory::DirectoryBroadcaster;
use crate::registry::RoomRegistry;

/// Konfiguration fuer den Signaling-Service
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Anzeigename des Servers
    pub server_name: String,
    /// Maximale gleichzeitige Verbindungen
    pub max_clients: u32,
    /// Keepalive-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Timeout fuer inaktive Verbindungen in Sekunden
    pub verbindungs_timeout_sek: u64,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            server_name: "Treffpunkt Server".to_string(),
            max_clients: 512,
            keepalive_sek: 30,
            verbindungs_timeout_sek: 90,
        }
    }
}

/// Gemeinsamer Server-Zustand (thread-safe, Arc-geteilt)
///
/// Registry, Broadcaster und Verzeichnis teilen sich intern den Zustand;
/// Clone eines Handles gibt eine Referenz auf denselben inneren Zustand.
pub struct SignalingState {
    /// Server-Konfiguration
    pub config: Arc<SignalingConfig>,
    /// Raum-Registry (welche Raeume, wer hostet, wer ist Gast)
    pub registry: RoomRegistry,
    /// Send-Queues aller verbundenen Clients
    pub broadcaster: EventBroadcaster,
    /// Raum-Verzeichnis-Pushes
    pub verzeichnis: DirectoryBroadcaster,
}

impl SignalingState {
    /// Erstellt einen neuen SignalingState
    pub fn neu(config: SignalingConfig) -> Arc<Self> {
        let registry = RoomRegistry::neu();
        let broadcaster = EventBroadcaster::neu();
        let verzeichnis = DirectoryBroadcaster::neu(registry.clone(), broadcaster.clone());
        Arc::new(Self {
            config: Arc::new(config),
            registry,
            broadcaster,
            verzeichnis,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treffpunkt_core::types::{ClientId, RoomId};

    #[test]
    fn standard_config() {
        let config = SignalingConfig::default();
        assert_eq!(config.max_clients, 512);
        assert_eq!(config.keepalive_sek, 30);
    }

    #[test]
    fn verzeichnis_teilt_registry_zustand() {
        let state = SignalingState::neu(SignalingConfig::default());
        state
            .registry
            .erstellen(RoomId::from("a"), None, None, ClientId::new());
        // Das Verzeichnis sieht denselben Registry-Zustand
        assert_eq!(state.registry.snapshot().len(), 1);
    }
}
