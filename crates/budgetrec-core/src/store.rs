//! Protokoll, welche Nutzer mit welchen Artikeln interagiert haben.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::id::{ItemId, UserId};

/// Interaktionsverläufe pro Nutzer plus Register der bekannten Einträge.
///
/// Verläufe behalten Einfügereihenfolge und Duplikate. Bekannte Nutzer und
/// Artikel liegen in geordneten Mengen, jede Aufzählung ist also aufsteigend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionStore {
    histories: BTreeMap<UserId, Vec<ItemId>>,
    items: BTreeSet<ItemId>,
}

impl InteractionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hängt `item` an den Verlauf von `user` an und registriert beide.
    pub fn record_interaction(&mut self, user: UserId, item: ItemId) {
        self.histories.entry(user).or_default().push(item);
        self.items.insert(item);
    }

    /// Registriert einen Artikel ohne Interaktion (z. B. einen frisch bepreisten).
    pub fn register_item(&mut self, item: ItemId) {
        self.items.insert(item);
    }

    /// Verlauf von `user` in Einfügereihenfolge; leer für unbekannte Nutzer.
    #[must_use]
    pub fn items_interacted_by(&self, user: UserId) -> &[ItemId] {
        self.histories.get(&user).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn all_known_items(&self) -> &BTreeSet<ItemId> {
        &self.items
    }

    #[must_use]
    pub fn all_known_users(&self) -> BTreeSet<UserId> {
        self.histories.keys().copied().collect()
    }

    #[must_use]
    pub fn is_known_user(&self, user: UserId) -> bool {
        self.histories.contains_key(&user)
    }

    /// Gesamtzahl erfasster Interaktionen, Duplikate eingeschlossen.
    #[must_use]
    pub fn interaction_count(&self) -> usize {
        self.histories.values().map(Vec::len).sum()
    }

    /// Alle Paare `(user, item)`: Nutzer aufsteigend, Verläufe in Einfügereihenfolge.
    pub fn interactions(&self) -> impl Iterator<Item = (UserId, ItemId)> + '_ {
        self.histories
            .iter()
            .flat_map(|(user, items)| items.iter().map(move |item| (*user, *item)))
    }
}
