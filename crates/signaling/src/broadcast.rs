//! Event-Broadcaster – Send-Queues aller verbundenen Clients
//!
//! Der EventBroadcaster verwaltet pro Verbindung eine gepufferte
//! Send-Queue und stellt Methoden bereit, um Nachrichten gezielt oder an
//! alle zu senden. Alle Sends sind fire-and-forget: eine volle oder
//! geschlossene Queue verwirft die Nachricht, nie bricht deswegen die
//! ausloesende Operation ab.
//!
//! `client_entfernen` schliesst den Kanal eines Clients: bereits
//! eingereihte Nachrichten werden noch zugestellt, danach endet die
//! Verbindungsschleife des Clients.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use treffpunkt_core::types::ClientId;
use treffpunkt_protocol::signal::SignalMessage;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Groesse der Send-Queue pro Client
const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue eines verbundenen Clients
#[derive(Clone, Debug)]
struct ClientSender {
    client_id: ClientId,
    tx: mpsc::Sender<SignalMessage>,
}

impl ClientSender {
    /// Sendet eine Nachricht nicht-blockierend an den Client
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    fn senden(&self, nachricht: SignalMessage) -> bool {
        match self.tx.try_send(nachricht) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(client = %self.client_id, "Send-Queue voll – Nachricht verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(client = %self.client_id, "Send-Queue geschlossen (Client getrennt)");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventBroadcaster
// ---------------------------------------------------------------------------

/// Zentraler Event-Broadcaster fuer alle verbundenen Clients
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct EventBroadcaster {
    inner: Arc<DashMap<ClientId, ClientSender>>,
}

impl EventBroadcaster {
    /// Erstellt einen neuen EventBroadcaster
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    /// Registriert einen neuen Client und gibt seine Empfangs-Queue zurueck
    ///
    /// Die `ClientConnection` liest aus dieser Queue und sendet via TCP.
    /// Der Broadcaster haelt den einzigen Sender; faellt der Eintrag weg,
    /// laeuft die Queue leer und die Verbindung endet.
    pub fn client_registrieren(&self, client_id: ClientId) -> mpsc::Receiver<SignalMessage> {
        let (tx, rx) = mpsc::channel(SEND_QUEUE_GROESSE);
        self.inner.insert(client_id, ClientSender { client_id, tx });
        tracing::debug!(client = %client_id, "Client im Broadcaster registriert");
        rx
    }

    /// Entfernt einen Client und schliesst damit seinen Kanal
    pub fn client_entfernen(&self, client_id: &ClientId) {
        if self.inner.remove(client_id).is_some() {
            tracing::debug!(client = %client_id, "Client aus Broadcaster entfernt");
        }
    }

    /// Sendet eine Nachricht an einen einzelnen Client
    ///
    /// Gibt `true` zurueck wenn der Client gefunden und die Nachricht
    /// eingereiht wurde.
    pub fn an_client_senden(&self, client_id: &ClientId, nachricht: SignalMessage) -> bool {
        match self.inner.get(client_id) {
            Some(sender) => sender.senden(nachricht),
            None => {
                tracing::debug!(client = %client_id, "Senden an unbekannten Client");
                false
            }
        }
    }

    /// Sendet eine Nachricht an alle verbundenen Clients
    ///
    /// Gibt die Anzahl der erfolgreichen Sendungen zurueck.
    pub fn an_alle_senden(&self, nachricht: SignalMessage) -> usize {
        let mut gesendet = 0;
        self.inner.iter().for_each(|eintrag| {
            if eintrag.value().senden(nachricht.clone()) {
                gesendet += 1;
            }
        });
        gesendet
    }

    /// Gibt die Anzahl der registrierten Clients zurueck
    pub fn client_anzahl(&self) -> usize {
        self.inner.len()
    }

    /// Prueft ob ein Client registriert ist
    pub fn ist_registriert(&self, client_id: &ClientId) -> bool {
        self.inner.contains_key(client_id)
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
