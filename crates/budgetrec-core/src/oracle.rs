//! Scoring-Vertrag zwischen Recommender und trainiertem Modell.
//!
//! Der Recommender schaut nie in ein Modell hinein. Er übergibt ein
//! [`TrainingSet`] an einen [`Trainer`] und fragt danach nur noch das
//! resultierende [`ScoringOracle`] nach Affinitäten.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::error::Result;
use crate::id::{ItemId, UserId};
use crate::store::InteractionStore;

/// Sagt vorher, wie sehr ein Nutzer einen Artikel mag. Höher ist besser.
///
/// Implementierungen müssen nach dem Training deterministisch sein: dasselbe
/// Paar `(user, item)` liefert immer denselben Score.
pub trait ScoringOracle {
    fn score(&self, user: UserId, item: ItemId) -> Result<f64>;
}

/// Lernt ein [`ScoringOracle`] aus erfassten Interaktionen.
pub trait Trainer {
    type Oracle: ScoringOracle;

    fn train(&mut self, set: &TrainingSet) -> Result<Self::Oracle>;
}

/// Ein Beispiel mit implizitem Feedback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub user: UserId,
    pub item: ItemId,
    pub label: f32,
}

/// Alles, was ein Trainer zu sehen bekommt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingSet {
    pub users: BTreeSet<UserId>,
    pub items: BTreeSet<ItemId>,
    pub examples: Vec<TrainingExample>,
}

impl TrainingSet {
    /// Label jeder erfassten Interaktion.
    pub const POSITIVE_LABEL: f32 = 1.0;

    /// Ein positives Beispiel pro erfasster Interaktion, Duplikate eingeschlossen.
    #[must_use]
    pub fn from_store(store: &InteractionStore) -> Self {
        Self {
            users: store.all_known_users(),
            items: store.all_known_items().clone(),
            examples: store
                .interactions()
                .map(|(user, item)| TrainingExample {
                    user,
                    item,
                    label: Self::POSITIVE_LABEL,
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}

/// Scores aus einer festen Tabelle; fehlende Paare erhalten `default`.
///
/// Nützlich für reproduzierbare Szenarien und als Platzhalter für ein echtes Modell.
#[derive(Debug, Clone, Default)]
pub struct TableOracle {
    scores: HashMap<(UserId, ItemId), f64>,
    default: f64,
}

impl TableOracle {
    #[must_use]
    pub fn new(default: f64) -> Self {
        Self {
            scores: HashMap::new(),
            default,
        }
    }

    #[must_use]
    pub fn with(mut self, user: UserId, item: ItemId, score: f64) -> Self {
        self.scores.insert((user, item), score);
        self
    }
}

impl ScoringOracle for TableOracle {
    fn score(&self, user: UserId, item: ItemId) -> Result<f64> {
        Ok(self.scores.get(&(user, item)).copied().unwrap_or(self.default))
    }
}
