//! Getypte Kennungen für die beiden Rollen im Interaktionsgraphen.
//!
//! An den Rändern des Systems (CLI-Eingabe, persistierte Dateien) sind Nutzer
//! und Artikel schlichte Zahlen. Im Crate vermischen sie sich nie: Eine
//! [`UserId`] kann nicht dort übergeben werden, wo eine [`ItemId`] erwartet
//! wird. Der Rohwert bleibt über `raw()` erreichbar, für die
//! Namensraum-Regel des Recommenders.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kennung eines Nutzers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

/// Kennung eines Artikels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl UserId {
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl ItemId {
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for UserId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<u64> for ItemId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.0)
    }
}
