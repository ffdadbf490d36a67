//! treffpunkt-protocol – Netzwerkprotokoll-Definitionen
//!
//! Dieses Crate definiert alle Signaling-Nachrichten sowie das
//! Frame-Format fuer die TCP-Verbindung zwischen Client und Server.

pub mod signal;
pub mod wire;

// Re-Exporte fuer bequemen Zugriff
pub use signal::{IceTarget, Reason, SignalMessage};
pub use wire::FrameCodec;
