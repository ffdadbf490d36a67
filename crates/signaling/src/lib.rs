//! treffpunkt-signaling – Rendezvous- und Relay-Service
//!
//! Dieser Crate implementiert den Signaling-Service fuer Treffpunkt:
//! Clients finden benannte Raeume, ein Teilnehmer hostet, der Server
//! vermittelt den Offer/Answer/ICE-Austausch zwischen Host und Gaesten.
//! Die ausgehandelte P2P-Verbindung selbst laeuft am Server vorbei.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (SignalingServer)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |  Rolle: Unbelegt -> {Host, Gast} -> Unbelegt
//!     |
//!     v
//! MessageDispatcher
//!     |
//!     +-- room_handler   (CreateRoom, JoinRequest, Leave, StopHost)
//!     +-- relay_handler  (Offer, Answer, Ice)
//!
//! RoomRegistry         – Welche Raeume existieren, wer hostet, wer ist Gast
//! EventBroadcaster     – Send-Queues aller verbundenen Clients
//! DirectoryBroadcaster – Raum-Verzeichnis an alle Verbindungen pushen
//! ```

pub mod broadcast;
pub mod connection;
pub mod directory;
pub mod dispatcher;
pub mod handlers;
pub mod registry;
pub mod server_state;
pub mod tcp;

// Bequeme Re-Exporte
pub use broadcast::EventBroadcaster;
pub use connection::ClientConnection;
pub use directory::DirectoryBroadcaster;
pub use dispatcher::MessageDispatcher;
pub use registry::RoomRegistry;
pub use server_state::{SignalingConfig, SignalingState};
pub use tcp::SignalingServer;
