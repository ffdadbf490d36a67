//! Message-Dispatcher – Routet SignalMessages an die richtigen Handler
//!
//! Der Dispatcher empfaengt geparste Nachrichten von einer
//! ClientConnection, bestimmt den Handler anhand des Nachrichtentyps und
//! gibt die direkte Antwort an den Absender zurueck. Verbindungsabbrueche
//! laufen als implizites Leave bzw. StopHost durch dieselben Handler.
//!
//! ## Rollen
//! Jede Verbindung durchlaeuft `Unbelegt -> {Host, Gast} -> Unbelegt`.
//! Der Rollen-Zustand gehoert der Verbindung und wird nur hier
//! uebergefuehrt; fuer Host-Autoritaet ist immer die Registry massgeblich.

use std::net::SocketAddr;
use std::sync::Arc;
use treffpunkt_core::types::{ClientId, RoomId};
use treffpunkt_protocol::signal::{LeaveMessage, SignalMessage, StopHostMessage};

use crate::handlers::{relay_handler, room_handler};
use crate::server_state::SignalingState;

// ---------------------------------------------------------------------------
// Verbindungszustand
// ---------------------------------------------------------------------------

/// Rolle einer Verbindung im Signaling-Protokoll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rolle {
    /// Weder Host noch Gast
    #[default]
    Unbelegt,
    /// Hostet einen Raum
    Host,
    /// Gast in einem Raum
    Gast,
}

/// Rolle und Raum-Zugehoerigkeit einer Verbindung
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionState {
    pub rolle: Rolle,
    pub raum: Option<RoomId>,
}

/// Dispatcher-Kontext – Informationen ueber die aktuelle Verbindung
pub struct DispatcherContext {
    /// Server-vergebene Verbindungs-ID
    pub client_id: ClientId,
    /// Peer-Adresse fuer Logging
    pub peer_addr: SocketAddr,
    /// Anzeigename (von Gaesten beim Join mitgeschickt)
    pub anzeige_name: Option<String>,
    /// Rolle und Raum-Zugehoerigkeit
    pub zustand: ConnectionState,
}

impl DispatcherContext {
    /// Erstellt einen frischen Kontext fuer eine neue Verbindung
    pub fn neu(client_id: ClientId, peer_addr: SocketAddr) -> Self {
        Self {
            client_id,
            peer_addr,
            anzeige_name: None,
            zustand: ConnectionState::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// MessageDispatcher
// ---------------------------------------------------------------------------

/// Zentraler Message-Dispatcher
///
/// Routet eingehende SignalMessages an die entsprechenden Handler und
/// gibt die direkte Antwort zurueck.
pub struct MessageDispatcher {
    state: Arc<SignalingState>,
}

impl MessageDispatcher {
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<SignalingState>) -> Self {
        Self { state }
    }

    /// Verarbeitet eine eingehende SignalMessage und gibt die Antwort zurueck
    ///
    /// Gibt `None` zurueck wenn keine direkte Antwort an den Absender
    /// gehoert (Weiterleitungen und stillschweigend verworfene
    /// Nachrichten).
    pub fn dispatch(
        &self,
        nachricht: SignalMessage,
        ctx: &mut DispatcherContext,
    ) -> Option<SignalMessage> {
        match nachricht {
            // ---------------------------------------------------------------
            // Raum-Verwaltung
            // ---------------------------------------------------------------
            SignalMessage::CreateRoom(req) => {
                room_handler::handle_create_room(req, ctx, &self.state)
            }
            SignalMessage::JoinRequest(req) => {
                room_handler::handle_join_request(req, ctx, &self.state)
            }
            SignalMessage::Leave(req) => room_handler::handle_leave(req, ctx, &self.state),
            SignalMessage::StopHost(req) => room_handler::handle_stop_host(req, ctx, &self.state),

            // ---------------------------------------------------------------
            // Aushandlung (Weiterleitungen)
            // ---------------------------------------------------------------
            SignalMessage::Offer(req) => relay_handler::handle_offer(req, ctx, &self.state),
            SignalMessage::Answer(req) => relay_handler::handle_answer(req, ctx, &self.state),
            SignalMessage::Ice(req) => relay_handler::handle_ice(req, ctx, &self.state),

            // ---------------------------------------------------------------
            // Keepalive
            // ---------------------------------------------------------------
            SignalMessage::Ping(ping) => {
                let server_ts = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_millis() as u64;
                Some(SignalMessage::pong(ping.timestamp_ms, server_ts))
            }
            SignalMessage::Pong(_) => {
                // Pong-Antworten vom Client werden nur geloggt (RTT-Messung)
                tracing::trace!(client = %ctx.client_id, "Pong empfangen (RTT-Messung)");
                None
            }

            // ---------------------------------------------------------------
            // Server->Client Nachrichten vom Client: stillschweigend ignorieren
            // ---------------------------------------------------------------
            SignalMessage::CreateRoomOk(_)
            | SignalMessage::JoinAccepted(_)
            | SignalMessage::JoinRejected(_)
            | SignalMessage::ClientWaiting(_)
            | SignalMessage::ClientLeft(_)
            | SignalMessage::RoomClosed(_)
            | SignalMessage::RoomsList(_)
            | SignalMessage::Error(_) => {
                tracing::trace!(
                    client = %ctx.client_id,
                    "Server->Client-Nachricht vom Client – ignoriert"
                );
                None
            }
        }
    }

    /// Bereinigt alle Ressourcen einer Verbindung beim Trennen
    ///
    /// Ein Host-Abbruch wirkt wie `stop_host`, ein Gast-Abbruch wie
    /// `leave`; beide laufen durch dieselben Handler wie die expliziten
    /// Nachrichten. Danach wird die Send-Queue der Verbindung entfernt.
    pub fn verbindung_getrennt(&self, ctx: &mut DispatcherContext) {
        match (ctx.zustand.rolle, ctx.zustand.raum.clone()) {
            (Rolle::Host, Some(raum)) => {
                room_handler::handle_stop_host(StopHostMessage { room_id: raum }, ctx, &self.state);
            }
            (Rolle::Gast, Some(raum)) => {
                room_handler::handle_leave(
                    LeaveMessage {
                        room_id: raum,
                        client_id: None,
                    },
                    ctx,
                    &self.state,
                );
            }
            _ => {}
        }

        self.state.broadcaster.client_entfernen(&ctx.client_id);
        tracing::debug!(client = %ctx.client_id, peer = %ctx.peer_addr, "Client-Ressourcen bereinigt");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
