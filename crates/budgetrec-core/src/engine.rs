//! Budgetbeschränkte Empfehlungen.
//!
//! Kandidaten sind alle bekannten Artikel, mit denen ein Nutzer noch nicht
//! interagiert hat. Sie werden nach Oracle-Score sortiert und dann gierig in
//! das Budget des Nutzers gepackt: beste Treffer zuerst, das Restbudget füllen
//! günstigere, niedriger gerankte Artikel. Bewusst kein optimaler Rucksack.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use crate::catalog::{Budget, PricingCatalog};
use crate::error::{RecError, Result};
use crate::id::{ItemId, UserId};
use crate::oracle::{ScoringOracle, Trainer, TrainingSet};
use crate::store::InteractionStore;
use crate::telemetry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// Nutzer- und Artikel-IDs teilen sich einen Namensraum: Ein Artikel, dessen
    /// Roh-ID der eines bekannten Nutzers entspricht, ist nie Kandidat.
    pub shared_id_namespace: bool,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            shared_id_namespace: true,
        }
    }
}

/// Ein ausgewählter Artikel samt Score und Preis, die zur Auswahl führten.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredItem {
    pub item: ItemId,
    pub score: f64,
    pub price: f64,
}

/// Ergebnis des gierigen Packens für einen Nutzer.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationPlan {
    pub user: UserId,
    pub budget: Budget,
    /// Ausgewählte Artikel in Rangfolge.
    pub selected: Vec<ScoredItem>,
    pub total_price: f64,
    pub skipped_unpriced: usize,
    pub skipped_over_budget: usize,
}

impl RecommendationPlan {
    #[must_use]
    pub fn items(&self) -> Vec<ItemId> {
        self.selected.iter().map(|s| s.item).collect()
    }
}

/// Besitzt Interaktionsspeicher und Preiskatalog und teilt ein trainiertes Oracle.
///
/// Die Engine startet untrainiert. Das Installieren eines Oracles (direkt oder
/// über [`Recommender::train`]) versetzt sie dauerhaft in den trainierten
/// Zustand; spätere Trainingsläufe ersetzen nur das Oracle.
///
/// Alle `&self`-Operationen lesen nur, daher dürfen Empfehlungen für
/// verschiedene Nutzer parallel laufen, sofern `O: Sync`. Änderungen brauchen
/// `&mut self`; wer eine Engine über Threads teilt, legt sie hinter ein `RwLock`.
#[derive(Debug)]
pub struct Recommender<O> {
    store: InteractionStore,
    catalog: PricingCatalog,
    oracle: Option<Arc<O>>,
    config: RecommenderConfig,
}

impl<O> Default for Recommender<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> Recommender<O> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RecommenderConfig::default())
    }

    #[must_use]
    pub fn with_config(config: RecommenderConfig) -> Self {
        Self::from_parts(InteractionStore::new(), PricingCatalog::new(), config)
    }

    /// Baut eine untrainierte Engine aus persistiertem Zustand auf.
    #[must_use]
    pub fn from_parts(
        store: InteractionStore,
        catalog: PricingCatalog,
        config: RecommenderConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            oracle: None,
            config,
        }
    }

    #[must_use]
    pub fn store(&self) -> &InteractionStore {
        &self.store
    }

    #[must_use]
    pub fn catalog(&self) -> &PricingCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn is_trained(&self) -> bool {
        self.oracle.is_some()
    }

    #[must_use]
    pub fn oracle(&self) -> Option<&Arc<O>> {
        self.oracle.as_ref()
    }

    pub fn record_interaction(&mut self, user: UserId, item: ItemId) {
        self.store.record_interaction(user, item);
    }

    /// Bepreist `item` und registriert es als bekannten Artikel.
    pub fn set_price(&mut self, item: ItemId, price: f64) -> Result<()> {
        self.catalog.set_price(item, price)?;
        self.store.register_item(item);
        Ok(())
    }

    pub fn set_budget(&mut self, user: UserId, limit: f64) -> Result<()> {
        self.catalog.set_budget(user, limit)
    }

    /// Erklärt das Training mit einem extern trainierten Oracle für abgeschlossen.
    pub fn install_oracle(&mut self, oracle: Arc<O>) {
        self.oracle = Some(oracle);
    }
}

impl<O: ScoringOracle> Recommender<O> {
    /// Trainiert auf den aktuellen Interaktionen und installiert das Ergebnis.
    ///
    /// Bei einem Fehler bleibt das bisherige Oracle (falls vorhanden) aktiv.
    pub fn train<T>(&mut self, trainer: &mut T) -> Result<()>
    where
        T: Trainer<Oracle = O>,
    {
        let set = TrainingSet::from_store(&self.store);
        let oracle = trainer.train(&set)?;
        telemetry::debug(format_args!(
            "trained on {} examples ({} users, {} items)",
            set.examples.len(),
            set.users.len(),
            set.items.len()
        ));
        self.install_oracle(Arc::new(oracle));
        Ok(())
    }

    /// Bekannte Artikel ohne Interaktion von `user`, aufsteigend nach ID.
    #[must_use]
    pub fn candidates(&self, user: UserId) -> Vec<ItemId> {
        let seen: HashSet<ItemId> = self
            .store
            .items_interacted_by(user)
            .iter()
            .copied()
            .collect();
        let user_ids: BTreeSet<u64> = if self.config.shared_id_namespace {
            self.store.all_known_users().iter().map(|u| u.raw()).collect()
        } else {
            BTreeSet::new()
        };

        self.store
            .all_known_items()
            .iter()
            .copied()
            .filter(|item| !seen.contains(item) && !user_ids.contains(&item.raw()))
            .collect()
    }

    /// Rankt die Kandidaten von `user` und packt sie in dessen Budget.
    pub fn plan(&self, user: UserId) -> Result<RecommendationPlan> {
        let oracle = self.oracle.as_ref().ok_or(RecError::UntrainedModel)?;

        let mut ranked = Vec::new();
        for item in self.candidates(user) {
            let score = oracle.score(user, item)?;
            if !score.is_finite() {
                return Err(RecError::InvalidScore { user, item, score });
            }
            ranked.push((item, score));
        }
        // Stabil: gleiche Scores behalten die Kandidatenreihenfolge.
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let budget = self.catalog.budget_of(user);
        let mut plan = RecommendationPlan {
            user,
            budget,
            selected: Vec::new(),
            total_price: 0.0,
            skipped_unpriced: 0,
            skipped_over_budget: 0,
        };

        for (item, score) in ranked {
            let Some(price) = self.catalog.price_of(item) else {
                plan.skipped_unpriced += 1;
                continue;
            };
            if budget.admits(plan.total_price + price) {
                plan.total_price += price;
                plan.selected.push(ScoredItem { item, score, price });
            } else {
                plan.skipped_over_budget += 1;
            }
        }

        telemetry::debug(format_args!(
            "{user}: selected {} items for {:.2} of {budget} ({} unpriced, {} over budget)",
            plan.selected.len(),
            plan.total_price,
            plan.skipped_unpriced,
            plan.skipped_over_budget
        ));
        Ok(plan)
    }

    pub fn recommend(&self, user: UserId) -> Result<Vec<ItemId>> {
        self.plan(user).map(|plan| plan.items())
    }

    /// Empfehlungen für jeden im Speicher bekannten Nutzer.
    pub fn recommend_all(&self) -> Result<BTreeMap<UserId, Vec<ItemId>>> {
        if !self.is_trained() {
            return Err(RecError::UntrainedModel);
        }
        self.store
            .all_known_users()
            .into_iter()
            .map(|user| self.recommend(user).map(|items| (user, items)))
            .collect()
    }
}
