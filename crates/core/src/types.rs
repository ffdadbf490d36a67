//! Gemeinsame Identifikationstypen fuer Treffpunkt
//!
//! Verbindungs-IDs verwenden das Newtype-Pattern ueber UUIDs, Raum-IDs
//! sind vom Aufrufer vergebene Strings. Beide Typen schliessen
//! Verwechslungen zur Compilezeit aus.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutige Verbindungs-ID, vom Server beim Connect vergeben
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Erstellt eine neue zufaellige ClientId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "client:{}", self.0)
    }
}

/// Raum-ID, vom erstellenden Client vergeben
///
/// Eindeutig solange der Raum existiert. `Ord` damit Raumlisten
/// deterministisch sortiert ausgegeben werden koennen.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct RoomId(pub String);

impl RoomId {
    /// Gibt die ID als String-Slice zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "raum:{}", self.0)
    }
}
