//! Message-Handler fuer den Signaling-Service
//!
//! Jede Handler-Funktion verarbeitet eine Nachrichten-Familie und gibt
//! optional die direkte Antwort an den Absender zurueck. Weiterleitungen
//! an andere Clients laufen ueber den EventBroadcaster.

pub mod relay_handler;
pub mod room_handler;
