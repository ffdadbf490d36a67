//! Relay-Handler – Offer, Answer, Ice
//!
//! Weiterleitungen sind fire-and-forget: ein seit der Anfrage getrenntes
//! Ziel laesst die Nachricht stillschweigend verpuffen, der Absender
//! erfaehrt davon nichts. Der Server interpretiert SDP und Kandidaten
//! nicht, er reicht sie nur durch.
//!
//! Absender-Identitaet (`client_id`/`client_name`) wird ausschliesslich
//! aus der sendenden Verbindung uebernommen, nie aus der Nachricht:
//! in Richtung Host traegt die Weiterleitung den Absender-Gast, in
//! Richtung Gast keinerlei Client-ID.

use std::sync::Arc;
use treffpunkt_protocol::signal::{
    AnswerMessage, IceMessage, IceTarget, OfferMessage, Reason, SignalMessage, STANDARD_GAST_NAME,
};

use crate::dispatcher::DispatcherContext;
use crate::server_state::SignalingState;

/// Verarbeitet `offer`
///
/// Weiterleitung an den Host des Raums, mit der Identitaet der sendenden
/// Verbindung. Ohne Host bekommt der Absender `error{no_host}`.
pub fn handle_offer(
    request: OfferMessage,
    ctx: &DispatcherContext,
    state: &Arc<SignalingState>,
) -> Option<SignalMessage> {
    let Some(host_id) = state.registry.host_von(&request.room_id) else {
        tracing::debug!(
            client = %ctx.client_id,
            raum = %request.room_id,
            "Offer fuer Raum ohne Host"
        );
        return Some(SignalMessage::error(Reason::NoHost));
    };

    let client_name = ctx
        .anzeige_name
        .clone()
        .unwrap_or_else(|| STANDARD_GAST_NAME.to_string());

    state.broadcaster.an_client_senden(
        &host_id,
        SignalMessage::Offer(OfferMessage {
            room_id: request.room_id,
            sdp: request.sdp,
            client_id: Some(ctx.client_id),
            client_name: Some(client_name),
        }),
    );

    None
}

/// Verarbeitet `answer`
///
/// Unveraenderte Weiterleitung an den adressierten Gast. Unbekannter
/// Raum oder Gast: stillschweigend verworfen.
pub fn handle_answer(
    request: AnswerMessage,
    ctx: &DispatcherContext,
    state: &Arc<SignalingState>,
) -> Option<SignalMessage> {
    let Some(ziel) = request.client_id else {
        tracing::debug!(client = %ctx.client_id, "Answer ohne Ziel-Gast – verworfen");
        return None;
    };

    if state.registry.ist_gast(&request.room_id, &ziel) {
        state
            .broadcaster
            .an_client_senden(&ziel, SignalMessage::Answer(request));
    } else {
        tracing::debug!(
            client = %ctx.client_id,
            raum = %request.room_id,
            ziel = %ziel,
            "Answer an unbekannten Gast – verworfen"
        );
    }

    None
}

/// Verarbeitet `ice`
///
/// `target == "host"`: Weiterleitung an den Host, mit Absender-Gast als
/// `client_id`. Sonst: Weiterleitung an den adressierten Gast, ohne
/// `client_id`. Fehlende Ziele: stillschweigend verworfen.
pub fn handle_ice(
    request: IceMessage,
    ctx: &DispatcherContext,
    state: &Arc<SignalingState>,
) -> Option<SignalMessage> {
    match request.target {
        IceTarget::Host => {
            let Some(host_id) = state.registry.host_von(&request.room_id) else {
                tracing::debug!(
                    client = %ctx.client_id,
                    raum = %request.room_id,
                    "ICE an Host eines unbekannten Raums – verworfen"
                );
                return None;
            };
            state.broadcaster.an_client_senden(
                &host_id,
                SignalMessage::Ice(IceMessage {
                    room_id: request.room_id,
                    target: IceTarget::Host,
                    candidate: request.candidate,
                    client_id: Some(ctx.client_id),
                }),
            );
        }
        IceTarget::Client(gast) => {
            if state.registry.ist_gast(&request.room_id, &gast) {
                state.broadcaster.an_client_senden(
                    &gast,
                    SignalMessage::Ice(IceMessage {
                        room_id: request.room_id,
                        target: IceTarget::Client(gast),
                        candidate: request.candidate,
                        client_id: None,
                    }),
                );
            } else {
                tracing::debug!(
                    client = %ctx.client_id,
                    raum = %request.room_id,
                    ziel = %gast,
                    "ICE an unbekannten Gast – verworfen"
                );
            }
        }
    }

    None
}
