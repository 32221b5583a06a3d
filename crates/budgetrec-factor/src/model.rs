//! Trainiertes Faktormodell und sein JSON-Snapshot.

use budgetrec_core::{ItemId, ScoringOracle, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::FactorConfig;
use crate::error::Result;

/// Bias und latenter Vektor eines Nutzers oder Artikels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factors {
    pub bias: f32,
    pub vector: Vec<f32>,
}

impl Factors {
    pub(crate) fn dot(&self, other: &Factors) -> f32 {
        self.vector
            .iter()
            .zip(&other.vector)
            .map(|(a, b)| a * b)
            .sum()
    }
}

/// Zusammenfassung eines Trainingslaufs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Fürs Training genutzte Interaktionen.
    pub positives: usize,
    /// Gezogene Beispiele mit Label 0.
    pub negatives: usize,
    /// Für die Auswertung zurückgehaltene Interaktionen.
    pub holdout: usize,
    pub train_rmse: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holdout_rmse: Option<f32>,
}

/// Matrixfaktorisierung mit Biases: `mu + b_u + b_i + p_u · q_i`.
///
/// Scores sind eine reine Funktion der gespeicherten Parameter. Unbekannte
/// Nutzer oder Artikel tragen weder Bias noch Vektor bei.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorModel {
    pub version: String,
    pub trained_at: String,
    pub seed: u64,
    pub config: FactorConfig,
    pub report: TrainingReport,
    pub(crate) global_mean: f32,
    pub(crate) users: BTreeMap<UserId, Factors>,
    pub(crate) items: BTreeMap<ItemId, Factors>,
}

impl FactorModel {
    pub const VERSION: &'static str = "0.1.0";

    #[must_use]
    pub fn predict(&self, user: UserId, item: ItemId) -> f32 {
        let p = self.users.get(&user);
        let q = self.items.get(&item);
        let mut estimate = self.global_mean;
        if let Some(p) = p {
            estimate += p.bias;
        }
        if let Some(q) = q {
            estimate += q.bias;
        }
        if let (Some(p), Some(q)) = (p, q) {
            estimate += p.dot(q);
        }
        estimate
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl ScoringOracle for FactorModel {
    fn score(&self, user: UserId, item: ItemId) -> budgetrec_core::Result<f64> {
        Ok(f64::from(self.predict(user, item)))
    }
}
