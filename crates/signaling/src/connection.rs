//! Client-Connection – Verwaltet eine einzelne TCP-Verbindung
//!
//! Jede Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task. Beim Connect wird eine ClientId vergeben, die Verbindung
//! im Broadcaster registriert und das aktuelle Raum-Verzeichnis gepusht.
//!
//! ## Fehlerdisziplin
//! - Unbrauchbarer JSON-Payload: stillschweigend verworfen, Verbindung
//!   bleibt offen
//! - Framing- oder IO-Fehler: Verbindung wird beendet
//! - Geschlossene Send-Queue (z.B. nach `room_closed`): Verbindung wird
//!   beendet, eingereihte Nachrichten wurden zuvor noch zugestellt
//!
//! ## Keepalive
//! - Server sendet alle `keepalive_sek` einen Ping
//! - Verbindungen ohne Empfang laenger als `verbindungs_timeout_sek`
//!   werden getrennt

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use treffpunkt_core::types::ClientId;
use treffpunkt_protocol::signal::SignalMessage;
use treffpunkt_protocol::wire::FrameCodec;

use crate::dispatcher::{DispatcherContext, MessageDispatcher};
use crate::server_state::SignalingState;

/// Verarbeitet eine einzelne TCP-Verbindung
///
/// Liest Frames via `FrameCodec`, parst und dispatcht an den
/// `MessageDispatcher`, sendet Antworten und Broadcast-Nachrichten
/// zurueck. Laeuft in einem eigenen tokio-Task.
pub struct ClientConnection {
    state: Arc<SignalingState>,
    peer_addr: SocketAddr,
}

impl ClientConnection {
    /// Erstellt eine neue ClientConnection
    pub fn neu(state: Arc<SignalingState>, peer_addr: SocketAddr) -> Self {
        Self { state, peer_addr }
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Diese Methode laeuft bis die Verbindung getrennt wird, die
    /// Send-Queue geschlossen wird oder ein Shutdown-Signal eingeht.
    pub async fn verarbeiten(
        self,
        stream: TcpStream,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) {
        let peer_addr = self.peer_addr;
        let keepalive_intervall = Duration::from_secs(self.state.config.keepalive_sek);
        let timeout_dauer = Duration::from_secs(self.state.config.verbindungs_timeout_sek);

        let client_id = ClientId::new();
        tracing::info!(peer = %peer_addr, client = %client_id, "Neue Verbindung");

        // Framed-Stream mit FrameCodec einrichten
        let mut framed = Framed::new(stream, FrameCodec::new());

        // Empfangs-Queue beim Broadcaster registrieren; der Broadcaster
        // haelt den einzigen Sender
        let mut sende_rx = self.state.broadcaster.client_registrieren(client_id);

        // Initiales Raum-Verzeichnis an die frische Verbindung
        self.state.verzeichnis.an_client_senden(&client_id);

        let dispatcher = MessageDispatcher::neu(Arc::clone(&self.state));
        let mut ctx = DispatcherContext::neu(client_id, peer_addr);

        // Zeitpunkt des letzten empfangenen Frames
        let mut letzter_empfang = Instant::now();
        // Zeitpunkt des naechsten Ping
        let mut naechster_ping = Instant::now() + keepalive_intervall;

        loop {
            let jetzt = Instant::now();

            // Timeout-Pruefung
            if jetzt.duration_since(letzter_empfang) > timeout_dauer {
                tracing::warn!(peer = %peer_addr, client = %client_id, "Verbindungs-Timeout");
                break;
            }

            // Naechsten Ping-Zeitpunkt berechnen
            let ping_verzoegerung = if jetzt < naechster_ping {
                naechster_ping.duration_since(jetzt)
            } else {
                Duration::from_millis(1)
            };

            tokio::select! {
                // Eingehender Frame vom Client
                frame = framed.next() => {
                    match frame {
                        Some(Ok(bytes)) => {
                            letzter_empfang = Instant::now();

                            match SignalMessage::from_json_slice(&bytes) {
                                Ok(nachricht) => {
                                    if let Some(antwort) = dispatcher.dispatch(nachricht, &mut ctx) {
                                        if let Err(e) = framed.send(antwort).await {
                                            tracing::warn!(
                                                peer = %peer_addr,
                                                fehler = %e,
                                                "Senden fehlgeschlagen"
                                            );
                                            break;
                                        }
                                    }
                                }
                                Err(e) => {
                                    // Unbrauchbare Payloads (JSON-Fehler, unbekannter Typ):
                                    // keine Antwort, keine Zustandsaenderung
                                    tracing::trace!(
                                        peer = %peer_addr,
                                        fehler = %e,
                                        "Unbrauchbare Nachricht verworfen"
                                    );
                                }
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(
                                peer = %peer_addr,
                                fehler = %e,
                                "Frame-Lesefehler"
                            );
                            break;
                        }
                        None => {
                            // Verbindung geschlossen
                            tracing::info!(peer = %peer_addr, "Verbindung vom Client getrennt");
                            break;
                        }
                    }
                }

                // Ausgehende Nachricht aus dem Broadcaster
                ausgehend = sende_rx.recv() => {
                    match ausgehend {
                        Some(nachricht) => {
                            if let Err(e) = framed.send(nachricht).await {
                                tracing::warn!(
                                    peer = %peer_addr,
                                    fehler = %e,
                                    "Broadcast-Senden fehlgeschlagen"
                                );
                                break;
                            }
                        }
                        None => {
                            // Der Broadcaster hat den Eintrag entfernt (z.B. nach
                            // room_closed); alle eingereihten Nachrichten sind raus
                            tracing::debug!(
                                peer = %peer_addr,
                                client = %client_id,
                                "Send-Queue geschlossen – Verbindung wird beendet"
                            );
                            break;
                        }
                    }
                }

                // Keepalive-Ping
                _ = tokio::time::sleep(ping_verzoegerung) => {
                    if jetzt >= naechster_ping {
                        let ts = std::time::SystemTime::now()
                            .duration_since(std::time::UNIX_EPOCH)
                            .unwrap_or_default()
                            .as_millis() as u64;

                        if let Err(e) = framed.send(SignalMessage::ping(ts)).await {
                            tracing::warn!(
                                peer = %peer_addr,
                                fehler = %e,
                                "Ping-Senden fehlgeschlagen"
                            );
                            break;
                        }
                        naechster_ping = Instant::now() + keepalive_intervall;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(peer = %peer_addr, "Shutdown-Signal – Verbindung wird getrennt");
                        break;
                    }
                }
            }
        }

        // Cleanup beim Verbindungsende: Host-Abbruch wirkt wie stop_host,
        // Gast-Abbruch wie leave
        dispatcher.verbindung_getrennt(&mut ctx);

        tracing::info!(peer = %peer_addr, client = %client_id, "Verbindungs-Task beendet");
    }
}
