//! Raum-Handler – CreateRoom, JoinRequest, Leave, StopHost
//!
//! Alle Raum-Mutationen laufen ueber die Registry; gesendet wird erst
//! nachdem der Registry-Lock wieder frei ist. Nach jeder Mutation die
//! Raum-Existenz oder Host-Praesenz aendert geht ein Verzeichnis-Update
//! an alle Verbindungen.

use std::sync::Arc;
use treffpunkt_core::types::RoomId;
use treffpunkt_protocol::signal::{
    ClientLeft, ClientWaiting, CreateRoomOk, CreateRoomRequest, JoinAccepted, JoinRejected,
    JoinRequest, LeaveMessage, Reason, SignalMessage, StopHostMessage, STANDARD_GAST_NAME,
};

use crate::dispatcher::{ConnectionState, DispatcherContext, Rolle};
use crate::registry::BeitrittsFehler;
use crate::server_state::SignalingState;

/// Uebersetzt einen Registry-Beitrittsfehler in den Protokoll-Grund
fn ablehnungsgrund(fehler: BeitrittsFehler) -> Reason {
    match fehler {
        BeitrittsFehler::RaumFehlt => Reason::NoSuchRoom,
        BeitrittsFehler::KeinHost => Reason::NoHost,
        BeitrittsFehler::FalschesPasswort => Reason::BadPassword,
    }
}

/// Loest eine bestehende Raum-Zugehoerigkeit der Verbindung
///
/// Wer einen anderen Raum erstellt oder ihm beitritt, verlaesst vorher
/// seinen alten: als Host wirkt das wie `stop_host`, als Gast wie
/// `leave`. Die Zugehoerigkeit zum Ziel-Raum selbst bleibt unberuehrt.
fn bisherige_zugehoerigkeit_loesen(
    ziel: &RoomId,
    ctx: &mut DispatcherContext,
    state: &Arc<SignalingState>,
) {
    match (ctx.zustand.rolle, ctx.zustand.raum.clone()) {
        (Rolle::Host, Some(raum)) if raum != *ziel => {
            handle_stop_host(StopHostMessage { room_id: raum }, ctx, state);
        }
        (Rolle::Gast, Some(raum)) if raum != *ziel => {
            handle_leave(
                LeaveMessage {
                    room_id: raum,
                    client_id: None,
                },
                ctx,
                state,
            );
        }
        _ => {}
    }
}

/// Verarbeitet `create_room`
///
/// Eine belegte Raum-ID wird uebernommen: der alte Raum wird wie bei
/// `stop_host` geschlossen, seine Gaeste erhalten `room_closed` und
/// werden getrennt, ein verdraengter Host wird benachrichtigt.
pub fn handle_create_room(
    request: CreateRoomRequest,
    ctx: &mut DispatcherContext,
    state: &Arc<SignalingState>,
) -> Option<SignalMessage> {
    let raum_id = request.room_id;

    // Wer schon woanders Host oder Gast ist, verlaesst das vorher
    bisherige_zugehoerigkeit_loesen(&raum_id, ctx, state);

    let verdraengt = state.registry.erstellen(
        raum_id.clone(),
        request.name,
        request.password,
        ctx.client_id,
    );

    // Die sendende Verbindung kann als Gast des verdraengten Raums
    // auftauchen; sie wird nicht gegen sich selbst getrennt
    for gast in verdraengt.gaeste.iter().filter(|g| **g != ctx.client_id) {
        state
            .broadcaster
            .an_client_senden(gast, SignalMessage::room_closed(raum_id.clone()));
        state.broadcaster.client_entfernen(gast);
    }
    if let Some(alter_host) = verdraengt.alter_host {
        state
            .broadcaster
            .an_client_senden(&alter_host, SignalMessage::room_closed(raum_id.clone()));
        tracing::info!(
            raum = %raum_id,
            alter_host = %alter_host,
            neuer_host = %ctx.client_id,
            "Raum uebernommen, alter Host verdraengt"
        );
    }

    ctx.zustand = ConnectionState {
        rolle: Rolle::Host,
        raum: Some(raum_id.clone()),
    };

    tracing::info!(client = %ctx.client_id, raum = %raum_id, "Raum erstellt");
    state.verzeichnis.an_alle_senden();

    Some(SignalMessage::CreateRoomOk(CreateRoomOk { room_id: raum_id }))
}

/// Verarbeitet `join_request`
///
/// Bei Ablehnung (Raum fehlt, kein Host, falsches Passwort) bleibt der
/// Raum-Zustand unveraendert; der Absender bekommt den Grund gemeldet.
pub fn handle_join_request(
    request: JoinRequest,
    ctx: &mut DispatcherContext,
    state: &Arc<SignalingState>,
) -> Option<SignalMessage> {
    let raum_id = request.room_id;
    let name = request
        .name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| STANDARD_GAST_NAME.to_string());

    match state.registry.beitreten(
        &raum_id,
        ctx.client_id,
        &name,
        request.password.as_deref(),
    ) {
        Ok(host_id) => {
            // Erst nach erfolgreicher Aufnahme: eine Ablehnung darf
            // keinerlei Seiteneffekte haben, auch nicht auf den alten Raum
            bisherige_zugehoerigkeit_loesen(&raum_id, ctx, state);

            ctx.zustand = ConnectionState {
                rolle: Rolle::Gast,
                raum: Some(raum_id.clone()),
            };
            ctx.anzeige_name = Some(name.clone());

            state.broadcaster.an_client_senden(
                &host_id,
                SignalMessage::ClientWaiting(ClientWaiting {
                    client_id: ctx.client_id,
                    client_name: name,
                }),
            );

            tracing::info!(client = %ctx.client_id, raum = %raum_id, "Gast beigetreten");
            state.verzeichnis.an_alle_senden();

            Some(SignalMessage::JoinAccepted(JoinAccepted {
                room_id: raum_id,
                host_id,
            }))
        }
        Err(fehler) => {
            tracing::debug!(
                client = %ctx.client_id,
                raum = %raum_id,
                grund = %fehler,
                "Beitritt abgelehnt"
            );
            Some(SignalMessage::JoinRejected(JoinRejected {
                reason: ablehnungsgrund(fehler),
            }))
        }
    }
}

/// Verarbeitet `leave`
///
/// Der Verlassende ist immer die sendende Verbindung; eine eventuelle
/// Selbstauskunft in der Nachricht wird ignoriert. Ungueltige Leaves
/// (kein Raum, kein Gast-Eintrag) verpuffen stillschweigend.
pub fn handle_leave(
    request: LeaveMessage,
    ctx: &mut DispatcherContext,
    state: &Arc<SignalingState>,
) -> Option<SignalMessage> {
    let raum_id = request.room_id;

    match state.registry.verlassen(&raum_id, &ctx.client_id) {
        Some(host_id) => {
            state.broadcaster.an_client_senden(
                &host_id,
                SignalMessage::ClientLeft(ClientLeft {
                    client_id: ctx.client_id,
                }),
            );

            if ctx.zustand.raum.as_ref() == Some(&raum_id) {
                ctx.zustand = ConnectionState::default();
                ctx.anzeige_name = None;
            }

            tracing::info!(client = %ctx.client_id, raum = %raum_id, "Gast hat Raum verlassen");
            state.verzeichnis.an_alle_senden();
        }
        None => {
            tracing::debug!(
                client = %ctx.client_id,
                raum = %raum_id,
                "Leave ohne Gast-Eintrag – ignoriert"
            );
        }
    }

    None
}

/// Verarbeitet `stop_host`
///
/// Nur der aktuelle Host des Raums darf ihn schliessen. Jeder Gast
/// erhaelt genau ein `room_closed` und wird getrennt; danach existiert
/// der Raum nicht mehr und keine Weiterleitung fuer ihn gelingt.
pub fn handle_stop_host(
    request: StopHostMessage,
    ctx: &mut DispatcherContext,
    state: &Arc<SignalingState>,
) -> Option<SignalMessage> {
    let raum_id = request.room_id;

    match state.registry.host_beenden(&raum_id, &ctx.client_id) {
        Some(gaeste) => {
            for gast in &gaeste {
                state
                    .broadcaster
                    .an_client_senden(gast, SignalMessage::room_closed(raum_id.clone()));
                state.broadcaster.client_entfernen(gast);
            }

            if ctx.zustand.raum.as_ref() == Some(&raum_id) {
                ctx.zustand = ConnectionState::default();
            }

            tracing::info!(
                client = %ctx.client_id,
                raum = %raum_id,
                gaeste = gaeste.len(),
                "Hosting beendet, Raum geschlossen"
            );
            state.verzeichnis.an_alle_senden();
        }
        None => {
            tracing::debug!(
                client = %ctx.client_id,
                raum = %raum_id,
                "stop_host ohne Host-Autoritaet – ignoriert"
            );
        }
    }

    None
}
