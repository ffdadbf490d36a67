//! Raum-Registry – Prozessweite Tabelle aller aktiven Raeume
//!
//! Saemtliche Mutationen und der Verzeichnis-Snapshot serialisieren sich
//! ueber einen einzigen Lock; der Lock wird nur fuer In-Memory-Arbeit
//! gehalten, nie ueber I/O oder `.await` hinweg. Mutatoren geben die zu
//! benachrichtigenden Client-IDs zurueck, damit der Aufrufer erst nach
//! Freigabe des Locks sendet.
//!
//! ## Invarianten
//! - Ein Raum ohne Host existiert nicht: Host-Wegfall loescht den Raum
//!   im selben Lock-Schritt
//! - Raum-IDs sind jederzeit eindeutig
//! - `erstellen` auf eine belegte ID verdraengt den alten Raum vollstaendig

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use treffpunkt_core::types::{ClientId, RoomId};
use treffpunkt_protocol::signal::RoomEntry;

// ---------------------------------------------------------------------------
// Raum
// ---------------------------------------------------------------------------

/// Ein aktiver Raum: Host, Gaeste, optionales Passwort
#[derive(Debug, Clone)]
struct Room {
    /// Anzeigename (Standard: die Raum-ID)
    name: String,
    /// Gemeinsames Passwort; None oder leer = offener Raum
    passwort: Option<String>,
    /// Hostende Verbindung
    host: Option<ClientId>,
    /// Gaeste: Verbindungs-ID -> Anzeigename
    gaeste: HashMap<ClientId, String>,
}

impl Room {
    /// Prueft das angebotene Passwort (Klartext-Vergleich)
    fn passwort_ok(&self, angebot: Option<&str>) -> bool {
        match self.passwort.as_deref() {
            None | Some("") => true,
            Some(erwartet) => angebot == Some(erwartet),
        }
    }
}

// ---------------------------------------------------------------------------
// Ergebnistypen
// ---------------------------------------------------------------------------

/// Wen eine Raum-Ueberschreibung verdraengt hat
///
/// Die verdraengten Gaeste muessen `room_closed` erhalten und getrennt
/// werden; ein verdraengter Host (andere Verbindung) wird nur benachrichtigt.
#[derive(Debug, Default)]
pub struct Verdraengung {
    pub gaeste: Vec<ClientId>,
    pub alter_host: Option<ClientId>,
}

/// Warum ein Beitritt abgelehnt wurde
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BeitrittsFehler {
    #[error("Raum nicht gefunden")]
    RaumFehlt,
    #[error("Raum hat keinen Host")]
    KeinHost,
    #[error("Passwort fehlt oder falsch")]
    FalschesPasswort,
}

// ---------------------------------------------------------------------------
// RoomRegistry
// ---------------------------------------------------------------------------

/// Prozessweite Raum-Tabelle
///
/// Thread-safe via Arc + Mutex. Clone teilt den inneren Zustand.
/// `BTreeMap` haelt die Raeume nach ID sortiert, damit der Snapshot
/// deterministisch ist.
#[derive(Clone)]
pub struct RoomRegistry {
    inner: Arc<Mutex<BTreeMap<RoomId, Room>>>,
}

impl RoomRegistry {
    /// Erstellt eine neue, leere Registry
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Erstellt einen Raum bzw. uebernimmt eine belegte ID
    ///
    /// Eine belegte ID wird vollstaendig verdraengt: der alte Raum wird
    /// geloescht, seine Gaeste und sein Host landen in der Rueckgabe.
    pub fn erstellen(
        &self,
        id: RoomId,
        name: Option<String>,
        passwort: Option<String>,
        host: ClientId,
    ) -> Verdraengung {
        let mut raeume = self.inner.lock();

        let verdraengt = match raeume.remove(&id) {
            Some(alter_raum) => Verdraengung {
                gaeste: alter_raum.gaeste.keys().copied().collect(),
                alter_host: alter_raum.host.filter(|h| *h != host),
            },
            None => Verdraengung::default(),
        };

        let name = name.unwrap_or_else(|| id.0.clone());
        raeume.insert(
            id,
            Room {
                name,
                passwort,
                host: Some(host),
                gaeste: HashMap::new(),
            },
        );

        verdraengt
    }

    /// Registriert einen Gast in einem bestehenden Raum
    ///
    /// Gibt bei Erfolg die Host-ID zurueck. Bei Ablehnung bleibt der
    /// Raum-Zustand unveraendert.
    pub fn beitreten(
        &self,
        id: &RoomId,
        gast: ClientId,
        name: &str,
        passwort: Option<&str>,
    ) -> Result<ClientId, BeitrittsFehler> {
        let mut raeume = self.inner.lock();
        let raum = raeume.get_mut(id).ok_or(BeitrittsFehler::RaumFehlt)?;
        let host = raum.host.ok_or(BeitrittsFehler::KeinHost)?;

        if !raum.passwort_ok(passwort) {
            return Err(BeitrittsFehler::FalschesPasswort);
        }

        raum.gaeste.insert(gast, name.to_string());
        Ok(host)
    }

    /// Gibt den Host eines Raums zurueck
    pub fn host_von(&self, id: &RoomId) -> Option<ClientId> {
        self.inner.lock().get(id)?.host
    }

    /// Prueft ob ein Client aktuell Gast dieses Raums ist
    pub fn ist_gast(&self, id: &RoomId, client: &ClientId) -> bool {
        self.inner
            .lock()
            .get(id)
            .map(|raum| raum.gaeste.contains_key(client))
            .unwrap_or(false)
    }

    /// Entfernt einen Gast aus seinem Raum
    ///
    /// Gibt den Host zurueck falls der Gast tatsaechlich entfernt wurde
    /// (der Host muss `client_left` erhalten).
    pub fn verlassen(&self, id: &RoomId, gast: &ClientId) -> Option<ClientId> {
        let mut raeume = self.inner.lock();
        let raum = raeume.get_mut(id)?;
        raum.gaeste.remove(gast)?;
        raum.host
    }

    /// Beendet das Hosting und loescht den Raum
    ///
    /// Nur der aktuell eingetragene Host darf den Raum schliessen; damit
    /// kann ein verdraengter Host den Raum seines Nachfolgers nicht
    /// abreissen. Gibt die zu benachrichtigenden Gaeste zurueck, oder
    /// `None` wenn der Aufrufer nicht (mehr) der Host ist.
    pub fn host_beenden(&self, id: &RoomId, host: &ClientId) -> Option<Vec<ClientId>> {
        let mut raeume = self.inner.lock();
        match raeume.get(id) {
            Some(raum) if raum.host == Some(*host) => {}
            _ => return None,
        }
        let raum = raeume.remove(id)?;
        Some(raum.gaeste.keys().copied().collect())
    }

    /// Prueft ob ein Raum mit dieser ID existiert
    pub fn existiert(&self, id: &RoomId) -> bool {
        self.inner.lock().contains_key(id)
    }

    /// Gibt die Anzahl der aktiven Raeume zurueck
    pub fn raum_anzahl(&self) -> usize {
        self.inner.lock().len()
    }

    /// Verzeichnis-Snapshot: alle Raeume, nach ID sortiert
    pub fn snapshot(&self) -> Vec<RoomEntry> {
        self.inner
            .lock()
            .iter()
            .map(|(id, raum)| RoomEntry {
                id: id.clone(),
                name: raum.name.clone(),
                has_host: raum.host.is_some(),
            })
            .collect()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn raum_id(s: &str) -> RoomId {
        RoomId::from(s)
    }

    #[test]
    fn erstellen_und_beitreten() {
        let registry = RoomRegistry::neu();
        let host = ClientId::new();
        let gast = ClientId::new();

        registry.erstellen(raum_id("alpha"), Some("Alpha".into()), None, host);
        assert!(registry.existiert(&raum_id("alpha")));
        assert_eq!(registry.host_von(&raum_id("alpha")), Some(host));

        let gemeldeter_host = registry
            .beitreten(&raum_id("alpha"), gast, "gast1", None)
            .unwrap();
        assert_eq!(gemeldeter_host, host);
        assert!(registry.ist_gast(&raum_id("alpha"), &gast));
    }

    #[test]
    fn falsches_passwort_ohne_seiteneffekte() {
        let registry = RoomRegistry::neu();
        let host = ClientId::new();
        let gast = ClientId::new();

        registry.erstellen(raum_id("a"), None, Some("x".into()), host);

        let fehler = registry
            .beitreten(&raum_id("a"), gast, "gast", Some("y"))
            .unwrap_err();
        assert_eq!(fehler, BeitrittsFehler::FalschesPasswort);
        assert!(!registry.ist_gast(&raum_id("a"), &gast));

        // Mit richtigem Passwort klappt es
        assert!(registry
            .beitreten(&raum_id("a"), gast, "gast", Some("x"))
            .is_ok());
    }

    #[test]
    fn offener_raum_akzeptiert_beliebiges_passwort() {
        let registry = RoomRegistry::neu();
        let host = ClientId::new();

        registry.erstellen(raum_id("offen"), None, None, host);
        assert!(registry
            .beitreten(&raum_id("offen"), ClientId::new(), "a", Some("egal"))
            .is_ok());

        // Leeres Passwort zaehlt ebenfalls als offener Raum
        registry.erstellen(raum_id("leer"), None, Some(String::new()), host);
        assert!(registry
            .beitreten(&raum_id("leer"), ClientId::new(), "b", None)
            .is_ok());
    }

    #[test]
    fn beitreten_unbekannter_raum() {
        let registry = RoomRegistry::neu();
        let fehler = registry
            .beitreten(&raum_id("fehlt"), ClientId::new(), "gast", None)
            .unwrap_err();
        assert_eq!(fehler, BeitrittsFehler::RaumFehlt);
    }

    #[test]
    fn verlassen_meldet_host() {
        let registry = RoomRegistry::neu();
        let host = ClientId::new();
        let gast = ClientId::new();

        registry.erstellen(raum_id("a"), None, None, host);
        registry.beitreten(&raum_id("a"), gast, "gast", None).unwrap();

        assert_eq!(registry.verlassen(&raum_id("a"), &gast), Some(host));
        assert!(!registry.ist_gast(&raum_id("a"), &gast));
        // Der Raum bleibt bestehen, nur der Gast ist weg
        assert!(registry.existiert(&raum_id("a")));

        // Nochmaliges Verlassen ist wirkungslos
        assert_eq!(registry.verlassen(&raum_id("a"), &gast), None);
    }

    #[test]
    fn host_beenden_loescht_raum_und_liefert_gaeste() {
        let registry = RoomRegistry::neu();
        let host = ClientId::new();
        let gast1 = ClientId::new();
        let gast2 = ClientId::new();

        registry.erstellen(raum_id("a"), None, None, host);
        registry.beitreten(&raum_id("a"), gast1, "g1", None).unwrap();
        registry.beitreten(&raum_id("a"), gast2, "g2", None).unwrap();

        let mut gaeste = registry.host_beenden(&raum_id("a"), &host).unwrap();
        gaeste.sort_by_key(|id| id.inner());
        let mut erwartet = vec![gast1, gast2];
        erwartet.sort_by_key(|id| id.inner());
        assert_eq!(gaeste, erwartet);

        // Kein Raum ohne Host
        assert!(!registry.existiert(&raum_id("a")));
        assert_eq!(registry.raum_anzahl(), 0);
    }

    #[test]
    fn host_beenden_fremder_client_wird_abgewiesen() {
        let registry = RoomRegistry::neu();
        let host = ClientId::new();
        let fremder = ClientId::new();

        registry.erstellen(raum_id("a"), None, None, host);
        assert!(registry.host_beenden(&raum_id("a"), &fremder).is_none());
        assert!(registry.existiert(&raum_id("a")));
    }

    #[test]
    fn erstellen_ueberschreibt_und_verdraengt() {
        let registry = RoomRegistry::neu();
        let alter_host = ClientId::new();
        let gast = ClientId::new();
        let neuer_host = ClientId::new();

        registry.erstellen(raum_id("a"), None, Some("alt".into()), alter_host);
        registry
            .beitreten(&raum_id("a"), gast, "gast", Some("alt"))
            .unwrap();

        let verdraengt = registry.erstellen(
            raum_id("a"),
            Some("Neu".into()),
            Some("neu".into()),
            neuer_host,
        );
        assert_eq!(verdraengt.gaeste, vec![gast]);
        assert_eq!(verdraengt.alter_host, Some(alter_host));

        // Der neue Raum startet ohne Gaeste, mit neuem Host und Passwort
        assert_eq!(registry.host_von(&raum_id("a")), Some(neuer_host));
        assert!(!registry.ist_gast(&raum_id("a"), &gast));
        assert_eq!(
            registry
                .beitreten(&raum_id("a"), ClientId::new(), "x", Some("alt"))
                .unwrap_err(),
            BeitrittsFehler::FalschesPasswort
        );

        // Der verdraengte Host hat seine Autoritaet verloren
        assert!(registry.host_beenden(&raum_id("a"), &alter_host).is_none());
        assert!(registry.existiert(&raum_id("a")));
    }

    #[test]
    fn erstellen_gleicher_host_keine_selbst_verdraengung() {
        let registry = RoomRegistry::neu();
        let host = ClientId::new();

        registry.erstellen(raum_id("a"), None, None, host);
        let verdraengt = registry.erstellen(raum_id("a"), Some("Neu".into()), None, host);
        assert!(verdraengt.alter_host.is_none());
    }

    #[test]
    fn snapshot_sortiert_und_exakt() {
        let registry = RoomRegistry::neu();
        let host = ClientId::new();

        registry.erstellen(raum_id("zeta"), None, None, host);
        registry.erstellen(raum_id("alpha"), Some("Alpha".into()), None, host);
        registry.erstellen(raum_id("mitte"), None, None, host);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].id, raum_id("alpha"));
        assert_eq!(snapshot[0].name, "Alpha");
        assert_eq!(snapshot[1].id, raum_id("mitte"));
        // Ohne Anzeigename faellt der Name auf die ID zurueck
        assert_eq!(snapshot[1].name, "mitte");
        assert_eq!(snapshot[2].id, raum_id("zeta"));
        assert!(snapshot.iter().all(|eintrag| eintrag.has_host));

        registry.host_beenden(&raum_id("mitte"), &host);
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.iter().all(|eintrag| eintrag.id != raum_id("mitte")));
    }

    #[test]
    fn clone_teilt_inneren_zustand() {
        let registry1 = RoomRegistry::neu();
        let registry2 = registry1.clone();
        let host = ClientId::new();

        registry1.erstellen(raum_id("geteilt"), None, None, host);
        assert!(registry2.existiert(&raum_id("geteilt")));
    }
}
