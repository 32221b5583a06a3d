use serde::{Deserialize, Serialize};

use crate::error::{FactorError, Result};

/// Hyperparameter des Faktormodells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorConfig {
    /// Länge der latenten Vektoren.
    pub factors: usize,
    pub epochs: usize,
    pub learning_rate: f32,
    /// L2-Strafe auf Biases und latente Vektoren.
    pub regularization: f32,
    /// Pro Interaktion gezogene, nicht beobachtete Artikel mit Label 0.
    pub negatives_per_positive: usize,
    /// Anteil der für die Auswertung zurückgehaltenen Interaktionen, in `[0.0, 1.0)`.
    pub holdout_fraction: f32,
    /// Latente Vektoren starten gleichverteilt in `[-init_scale, init_scale]`.
    pub init_scale: f32,
    /// Fester Seed für reproduzierbare Läufe; sonst wird einer gezogen.
    pub seed: Option<u64>,
}

impl Default for FactorConfig {
    fn default() -> Self {
        Self {
            factors: 16,
            epochs: 40,
            learning_rate: 0.05,
            regularization: 0.02,
            negatives_per_positive: 2,
            holdout_fraction: 0.2,
            init_scale: 0.1,
            seed: None,
        }
    }
}

impl FactorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.factors == 0 {
            return Err(FactorError::InvalidConfig("factors must be at least 1".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(FactorError::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.regularization.is_finite() && self.regularization >= 0.0) {
            return Err(FactorError::InvalidConfig(format!(
                "regularization must be non-negative, got {}",
                self.regularization
            )));
        }
        if !(0.0..1.0).contains(&self.holdout_fraction) {
            return Err(FactorError::InvalidConfig(format!(
                "holdout_fraction must lie in [0, 1), got {}",
                self.holdout_fraction
            )));
        }
        if !(self.init_scale.is_finite() && self.init_scale >= 0.0) {
            return Err(FactorError::InvalidConfig(format!(
                "init_scale must be non-negative, got {}",
                self.init_scale
            )));
        }
        Ok(())
    }
}
