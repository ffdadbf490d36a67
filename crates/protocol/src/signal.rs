//! Signaling-Protokoll
//!
//! Definiert alle Nachrichten die ueber die TCP-Verbindung zwischen
//! Client und Server ausgetauscht werden.
//!
//! ## Design
//! - Jede Nachricht ist ein eigenstaendiges JSON-Objekt mit `type`-Feld
//! - Tagged Enum fuer typsichere Nachrichtentypen
//! - SDP-Bodies und ICE-Kandidaten sind `serde_json::Value`: der Server
//!   leitet sie weiter ohne sie zu interpretieren

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use treffpunkt_core::types::{ClientId, RoomId};
use uuid::Uuid;

/// Anzeigename fuer Gaeste die keinen eigenen Namen mitschicken
pub const STANDARD_GAST_NAME: &str = "guest";

// ---------------------------------------------------------------------------
// Ablehnungs- und Fehlergruende
// ---------------------------------------------------------------------------

/// Standardisierte Gruende fuer `join_rejected`- und `error`-Nachrichten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// Kein Raum mit dieser ID registriert
    NoSuchRoom,
    /// Der Raum hat aktuell keinen Host
    NoHost,
    /// Raum-Passwort fehlt oder falsch
    BadPassword,
}

// ---------------------------------------------------------------------------
// ICE-Zieladressierung
// ---------------------------------------------------------------------------

/// Ziel einer ICE-Nachricht: der Host des Raums oder ein bestimmter Gast
///
/// Auf dem Draht ist das Ziel der String `"host"` oder die UUID des Gasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceTarget {
    Host,
    Client(ClientId),
}

impl Serialize for IceTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            IceTarget::Host => serializer.serialize_str("host"),
            IceTarget::Client(id) => serializer.collect_str(&id.inner()),
        }
    }
}

impl<'de> Deserialize<'de> for IceTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "host" {
            return Ok(IceTarget::Host);
        }
        Uuid::parse_str(&s)
            .map(|uuid| IceTarget::Client(ClientId(uuid)))
            .map_err(|_| D::Error::custom("target muss \"host\" oder eine Client-UUID sein"))
    }
}

// ---------------------------------------------------------------------------
// Raum-Verwaltung (Client -> Server)
// ---------------------------------------------------------------------------

/// Raum erstellen bzw. bestehenden Raum unter gleicher ID uebernehmen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub room_id: RoomId,
    /// Gemeinsames Raum-Passwort (None/leer = offener Raum)
    pub password: Option<String>,
    /// Anzeigename des Raums (None = Raum-ID)
    pub name: Option<String>,
}

/// Einem bestehenden Raum als Gast beitreten
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    pub room_id: RoomId,
    pub password: Option<String>,
    /// Anzeigename des Gasts
    pub name: Option<String>,
}

/// Raum als Gast verlassen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveMessage {
    pub room_id: RoomId,
    /// Selbstauskunft aelterer Clients; der Server verwendet immer die
    /// Identitaet der sendenden Verbindung
    pub client_id: Option<ClientId>,
}

/// Hosting beenden: alle Gaeste trennen, Raum loeschen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopHostMessage {
    pub room_id: RoomId,
}

// ---------------------------------------------------------------------------
// Verbindungs-Aushandlung (weitergeleitet, nicht interpretiert)
// ---------------------------------------------------------------------------

/// SDP-Offer eines Gasts an den Host
///
/// `client_id`/`client_name` werden vom Server mit der Identitaet der
/// sendenden Verbindung belegt; eingehende Werte werden ignoriert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferMessage {
    pub room_id: RoomId,
    pub sdp: serde_json::Value,
    pub client_id: Option<ClientId>,
    pub client_name: Option<String>,
}

/// SDP-Answer des Hosts an einen bestimmten Gast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerMessage {
    pub room_id: RoomId,
    pub sdp: serde_json::Value,
    /// Ziel-Gast (eingehend) bzw. Absender-Kontext (ausgehend)
    pub client_id: Option<ClientId>,
}

/// ICE-Kandidat, adressiert an den Host oder einen Gast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceMessage {
    pub room_id: RoomId,
    pub target: IceTarget,
    pub candidate: serde_json::Value,
    /// In Richtung Host: Absender-Gast; in Richtung Gast: None
    pub client_id: Option<ClientId>,
}

// ---------------------------------------------------------------------------
// Server -> Client
// ---------------------------------------------------------------------------

/// Bestaetigung der Raum-Erstellung
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomOk {
    pub room_id: RoomId,
}

/// Beitritt akzeptiert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinAccepted {
    pub room_id: RoomId,
    pub host_id: ClientId,
}

/// Beitritt abgelehnt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRejected {
    pub reason: Reason,
}

/// Benachrichtigung an den Host: ein Gast wartet auf die Aushandlung
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientWaiting {
    pub client_id: ClientId,
    pub client_name: String,
}

/// Benachrichtigung an den Host: ein Gast hat den Raum verlassen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientLeft {
    pub client_id: ClientId,
}

/// Der Raum wurde geschlossen (Host weg oder verdraengt)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomClosed {
    pub room_id: RoomId,
}

/// Eintrag im Raum-Verzeichnis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomEntry {
    pub id: RoomId,
    pub name: String,
    pub has_host: bool,
}

/// Vollstaendiges Raum-Verzeichnis, an alle Verbindungen gepusht
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomsList {
    pub rooms: Vec<RoomEntry>,
}

/// Gezielte Fehler-Antwort an den Absender
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub reason: Reason,
}

// ---------------------------------------------------------------------------
// Keepalive
// ---------------------------------------------------------------------------

/// Ping (Client -> Server oder Server -> Client)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingMessage {
    /// Unix-Timestamp in Millisekunden fuer RTT-Messung
    pub timestamp_ms: u64,
}

/// Pong-Antwort (spiegelt Timestamp zurueck)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PongMessage {
    /// Originaler Timestamp aus dem Ping
    pub echo_timestamp_ms: u64,
    /// Server-eigener Timestamp
    pub server_timestamp_ms: u64,
}

// ---------------------------------------------------------------------------
// Haupt-Enum: SignalMessage
// ---------------------------------------------------------------------------

/// Alle moeglichen Signaling-Nachrichten (typsicher via Tagged Enum)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalMessage {
    // Raum-Verwaltung (Client -> Server)
    CreateRoom(CreateRoomRequest),
    JoinRequest(JoinRequest),
    Leave(LeaveMessage),
    StopHost(StopHostMessage),

    // Aushandlung (weitergeleitet)
    Offer(OfferMessage),
    Answer(AnswerMessage),
    Ice(IceMessage),

    // Server -> Client
    CreateRoomOk(CreateRoomOk),
    JoinAccepted(JoinAccepted),
    JoinRejected(JoinRejected),
    ClientWaiting(ClientWaiting),
    ClientLeft(ClientLeft),
    RoomClosed(RoomClosed),
    RoomsList(RoomsList),
    Error(ErrorMessage),

    // Keepalive
    Ping(PingMessage),
    Pong(PongMessage),
}

impl SignalMessage {
    /// Erstellt eine Ping-Nachricht
    pub fn ping(timestamp_ms: u64) -> Self {
        Self::Ping(PingMessage { timestamp_ms })
    }

    /// Erstellt eine Pong-Antwort
    pub fn pong(echo_timestamp_ms: u64, server_timestamp_ms: u64) -> Self {
        Self::Pong(PongMessage {
            echo_timestamp_ms,
            server_timestamp_ms,
        })
    }

    /// Erstellt eine Fehler-Antwort
    pub fn error(reason: Reason) -> Self {
        Self::Error(ErrorMessage { reason })
    }

    /// Erstellt eine Raum-geschlossen-Benachrichtigung
    pub fn room_closed(room_id: RoomId) -> Self {
        Self::RoomClosed(RoomClosed { room_id })
    }

    /// Serialisiert die Nachricht als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialisiert eine Nachricht aus JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Deserialisiert eine Nachricht aus rohen Frame-Bytes
    pub fn from_json_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
