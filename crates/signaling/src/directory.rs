//! Verzeichnis-Broadcaster – Raum-Liste an alle Verbindungen pushen
//!
//! Nach jeder Mutation die Raum-Existenz oder Host-Praesenz aendert
//! (create, stop_host, Host-Trennung, erfolgreicher Join, Leave) geht der
//! aktuelle Registry-Snapshot als `rooms_list` an JEDE verbundene
//! Verbindung, nicht nur an Raum-Mitglieder. Kein Debouncing: jedes
//! ausloesende Ereignis erzeugt genau einen Broadcast.

use treffpunkt_core::types::ClientId;
use treffpunkt_protocol::signal::{RoomsList, SignalMessage};

use crate::broadcast::EventBroadcaster;
use crate::registry::RoomRegistry;

/// Pusht das Raum-Verzeichnis an verbundene Clients
///
/// Duenne Komposition aus Registry (Snapshot) und Broadcaster (Zustellung).
/// Clone teilt den inneren Zustand beider.
#[derive(Clone)]
pub struct DirectoryBroadcaster {
    registry: RoomRegistry,
    broadcaster: EventBroadcaster,
}

impl DirectoryBroadcaster {
    /// Erstellt einen neuen DirectoryBroadcaster
    pub fn neu(registry: RoomRegistry, broadcaster: EventBroadcaster) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    /// Baut die aktuelle `rooms_list`-Nachricht
    fn verzeichnis(&self) -> SignalMessage {
        SignalMessage::RoomsList(RoomsList {
            rooms: self.registry.snapshot(),
        })
    }

    /// Sendet das Verzeichnis an alle verbundenen Clients
    ///
    /// Gibt die Anzahl der erreichten Clients zurueck.
    pub fn an_alle_senden(&self) -> usize {
        let anzahl = self.broadcaster.an_alle_senden(self.verzeichnis());
        tracing::trace!(clients = anzahl, "Raum-Verzeichnis verteilt");
        anzahl
    }

    /// Sendet das Verzeichnis an einen einzelnen Client (initialer Push)
    pub fn an_client_senden(&self, client_id: &ClientId) -> bool {
        self.broadcaster
            .an_client_senden(client_id, self.verzeichnis())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
