#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Budgetbeschränkte Empfehlungen aus impliziten Nutzer-Artikel-Interaktionen.
//!
//! Das Crate erfasst Interaktionen ([`InteractionStore`]), Preise und
//! Ausgabenlimits ([`PricingCatalog`]) und macht aus den Scores eines
//! austauschbaren [`ScoringOracle`] eine bezahlbare, gerankte Artikelliste
//! ([`Recommender`]). Wie das Oracle gelernt wird, entscheidet eine
//! [`Trainer`]-Implementierung.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod id;
pub mod oracle;
pub mod store;
pub mod telemetry;

pub use catalog::{Budget, PricingCatalog};
pub use engine::{RecommendationPlan, Recommender, RecommenderConfig, ScoredItem};
pub use error::{RecError, Result};
pub use id::{ItemId, UserId};
pub use oracle::{ScoringOracle, TableOracle, Trainer, TrainingExample, TrainingSet};
pub use store::InteractionStore;
