//! treffpunkt-core – Gemeinsame Identifikationstypen
//!
//! Dieses Crate stellt die fundamentalen ID-Typen bereit, die von allen
//! anderen Treffpunkt-Crates gemeinsam genutzt werden.

pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use types::{ClientId, RoomId};
