#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Training latenter Faktoren für budgetrec.
//!
//! [`FactorTrainer`] lernt eine Matrixfaktorisierung mit Biases auf implizitem
//! Feedback: Jede erfasste Interaktion ist ein positives Beispiel, nie
//! berührte Artikel werden als Negative mit Label 0 gezogen. Das resultierende
//! [`FactorModel`] ist das [`ScoringOracle`](budgetrec_core::ScoringOracle),
//! mit dem der Recommender rankt.

pub mod config;
pub mod error;
pub mod model;

pub use config::FactorConfig;
pub use error::{FactorError, Result};
pub use model::{FactorModel, Factors, TrainingReport};

use budgetrec_core::{telemetry, ItemId, Trainer, TrainingSet, UserId};
use rand::prelude::*;
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, HashMap, HashSet};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Versuche pro Negativbeispiel, bevor ein Nutzer, der fast alles kennt, übersprungen wird.
const NEGATIVE_SAMPLE_ATTEMPTS: usize = 8;
/// Ersatz-Zeitstempel, falls die Formatierung scheitert
const FALLBACK_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

/// Lernt [`FactorModel`]s per stochastischem Gradientenabstieg.
#[derive(Debug, Default)]
pub struct FactorTrainer {
    config: FactorConfig,
    last_report: Option<TrainingReport>,
}

/// Beispiel mit Nutzer und Artikel als Parameterindizes.
#[derive(Debug, Clone, Copy)]
struct Indexed {
    user: usize,
    item: usize,
    label: f32,
}

impl FactorTrainer {
    #[must_use]
    pub fn new(config: FactorConfig) -> Self {
        Self {
            config,
            last_report: None,
        }
    }

    /// Bericht des letzten erfolgreichen Laufs.
    #[must_use]
    pub fn last_report(&self) -> Option<&TrainingReport> {
        self.last_report.as_ref()
    }

    pub fn fit(&mut self, set: &TrainingSet) -> Result<FactorModel> {
        self.config.validate()?;
        if set.is_empty() {
            return Err(FactorError::EmptyTrainingSet);
        }

        let seed = self.config.seed.unwrap_or_else(rand::random::<u64>);
        let mut rng = StdRng::seed_from_u64(seed);

        let users: Vec<UserId> = set.users.iter().copied().collect();
        let items: Vec<ItemId> = set.items.iter().copied().collect();
        let user_index: HashMap<UserId, usize> =
            users.iter().enumerate().map(|(n, u)| (*u, n)).collect();
        let item_index: HashMap<ItemId, usize> =
            items.iter().enumerate().map(|(n, i)| (*i, n)).collect();

        let mut positives: Vec<Indexed> = set
            .examples
            .iter()
            .filter_map(|e| {
                Some(Indexed {
                    user: *user_index.get(&e.user)?,
                    item: *item_index.get(&e.item)?,
                    label: e.label,
                })
            })
            .collect();
        if positives.is_empty() {
            return Err(FactorError::EmptyTrainingSet);
        }
        positives.shuffle(&mut rng);

        // Mindestens eine Interaktion bleibt fürs Training.
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let holdout_len = ((positives.len() as f32 * self.config.holdout_fraction) as usize)
            .min(positives.len() - 1);
        if holdout_len == 0 && self.config.holdout_fraction > 0.0 {
            telemetry::warn(format_args!(
                "{} interactions are too few for a {:.0}% holdout; evaluating on training data only",
                positives.len(),
                self.config.holdout_fraction * 100.0
            ));
        }
        let holdout = positives.split_off(positives.len() - holdout_len);

        let seen: HashSet<(usize, usize)> = positives
            .iter()
            .chain(&holdout)
            .map(|p| (p.user, p.item))
            .collect();
        let negatives = self.sample_negatives(&positives, &seen, items.len(), &mut rng);

        let mut examples = positives.clone();
        examples.extend_from_slice(&negatives);
        #[allow(clippy::cast_precision_loss)]
        let global_mean = examples.iter().map(|e| e.label).sum::<f32>() / examples.len() as f32;

        let mut user_factors: Vec<Factors> = (0..users.len())
            .map(|_| self.init_factors(&mut rng))
            .collect();
        let mut item_factors: Vec<Factors> = (0..items.len())
            .map(|_| self.init_factors(&mut rng))
            .collect();

        for _ in 0..self.config.epochs {
            examples.shuffle(&mut rng);
            for example in &examples {
                self.sgd_step(
                    global_mean,
                    &mut user_factors[example.user],
                    &mut item_factors[example.item],
                    example.label,
                );
            }
        }

        let predict = |e: &Indexed| {
            global_mean
                + user_factors[e.user].bias
                + item_factors[e.item].bias
                + user_factors[e.user].dot(&item_factors[e.item])
        };
        let report = TrainingReport {
            positives: positives.len(),
            negatives: negatives.len(),
            holdout: holdout.len(),
            train_rmse: rmse(examples.iter().map(|e| (predict(e), e.label))),
            holdout_rmse: (!holdout.is_empty())
                .then(|| rmse(holdout.iter().map(|e| (predict(e), e.label)))),
        };
        if !report.train_rmse.is_finite() || !all_finite(&user_factors) || !all_finite(&item_factors)
        {
            return Err(FactorError::Diverged {
                rmse: report.train_rmse,
            });
        }
        self.last_report = Some(report.clone());

        Ok(FactorModel {
            version: FactorModel::VERSION.to_string(),
            trained_at: iso8601_now(),
            seed,
            config: self.config.clone(),
            report,
            global_mean,
            users: users.into_iter().zip(user_factors).collect::<BTreeMap<_, _>>(),
            items: items.into_iter().zip(item_factors).collect::<BTreeMap<_, _>>(),
        })
    }

    /// Zieht Artikel ohne Interaktion des Nutzers als Beispiele mit Label 0.
    fn sample_negatives(
        &self,
        positives: &[Indexed],
        seen: &HashSet<(usize, usize)>,
        item_count: usize,
        rng: &mut StdRng,
    ) -> Vec<Indexed> {
        let mut negatives = Vec::with_capacity(positives.len() * self.config.negatives_per_positive);
        for positive in positives {
            for _ in 0..self.config.negatives_per_positive {
                let drawn = (0..NEGATIVE_SAMPLE_ATTEMPTS)
                    .map(|_| rng.gen_range(0..item_count))
                    .find(|item| !seen.contains(&(positive.user, *item)));
                if let Some(item) = drawn {
                    negatives.push(Indexed {
                        user: positive.user,
                        item,
                        label: 0.0,
                    });
                }
            }
        }
        negatives
    }

    fn init_factors(&self, rng: &mut StdRng) -> Factors {
        let scale = self.config.init_scale;
        Factors {
            bias: 0.0,
            vector: (0..self.config.factors)
                .map(|_| {
                    if scale > 0.0 {
                        rng.gen_range(-scale..=scale)
                    } else {
                        0.0
                    }
                })
                .collect(),
        }
    }

    fn sgd_step(&self, global_mean: f32, p: &mut Factors, q: &mut Factors, label: f32) {
        let lr = self.config.learning_rate;
        let reg = self.config.regularization;
        let err = label - (global_mean + p.bias + q.bias + p.dot(q));

        p.bias += lr * (err - reg * p.bias);
        q.bias += lr * (err - reg * q.bias);
        for (pf, qf) in p.vector.iter_mut().zip(q.vector.iter_mut()) {
            let (pu, qi) = (*pf, *qf);
            *pf += lr * (err * qi - reg * pu);
            *qf += lr * (err * pu - reg * qi);
        }
    }
}

impl Trainer for FactorTrainer {
    type Oracle = FactorModel;

    fn train(&mut self, set: &TrainingSet) -> budgetrec_core::Result<FactorModel> {
        Ok(self.fit(set)?)
    }
}

fn all_finite(factors: &[Factors]) -> bool {
    factors
        .iter()
        .all(|f| f.bias.is_finite() && f.vector.iter().all(|v| v.is_finite()))
}

fn rmse(pairs: impl Iterator<Item = (f32, f32)>) -> f32 {
    let (sum, count) = pairs.fold((0.0_f32, 0_usize), |(sum, count), (predicted, label)| {
        (sum + (predicted - label).powi(2), count + 1)
    });
    if count == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    {
        (sum / count as f32).sqrt()
    }
}

fn iso8601_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| FALLBACK_TIMESTAMP.to_string())
}

#[cfg(test)]
#[allow(clippy::expect_used)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use budgetrec_core::{InteractionStore, Recommender, ScoringOracle};

    fn seeded(seed: u64) -> FactorConfig {
        FactorConfig {
            seed: Some(seed),
            ..FactorConfig::default()
        }
    }

    /// Sechs Nutzer, die alle 100 und 101 gekauft haben; 102..=105 existieren,
    /// wurden aber nie gekauft.
    fn popular_pair_store() -> InteractionStore {
        let mut store = InteractionStore::new();
        for user in 1..=6 {
            store.record_interaction(UserId(user), ItemId(100));
            store.record_interaction(UserId(user), ItemId(101));
        }
        for item in 102..=105 {
            store.register_item(ItemId(item));
        }
        store
    }

    #[test]
    fn empty_training_set_is_rejected() {
        let mut trainer = FactorTrainer::new(seeded(1));
        let err = trainer.fit(&TrainingSet::default()).unwrap_err();
        assert!(matches!(err, FactorError::EmptyTrainingSet));
        assert!(trainer.last_report().is_none());
    }

    #[test]
    fn invalid_config_is_rejected_before_training() {
        let mut trainer = FactorTrainer::new(FactorConfig {
            factors: 0,
            ..seeded(1)
        });
        let set = TrainingSet::from_store(&popular_pair_store());
        assert!(matches!(
            trainer.fit(&set),
            Err(FactorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn diverging_run_is_rejected_and_keeps_previous_oracle() {
        let mut store = InteractionStore::new();
        for user in 1..=5 {
            for item in 10..=14 {
                if (user + item) % 2 == 0 {
                    store.record_interaction(UserId(user), ItemId(item));
                }
            }
        }
        let set = TrainingSet::from_store(&store);
        let mut wild = FactorTrainer::new(FactorConfig {
            learning_rate: 50.0,
            ..seeded(1)
        });
        assert!(matches!(wild.fit(&set), Err(FactorError::Diverged { .. })));
        assert!(wild.last_report().is_none());

        let mut engine: Recommender<FactorModel> =
            Recommender::from_parts(store, Default::default(), Default::default());
        engine.set_price(ItemId(10), 1.0).unwrap();
        engine.train(&mut FactorTrainer::new(seeded(1))).unwrap();
        let before = engine.recommend(UserId(1)).unwrap();

        let err = engine.train(&mut wild).unwrap_err();
        assert!(matches!(err, budgetrec_core::RecError::Training(_)));
        assert!(engine.is_trained());
        assert_eq!(engine.recommend(UserId(1)).unwrap(), before);
    }

    #[test]
    fn same_seed_gives_same_scores() {
        let set = TrainingSet::from_store(&popular_pair_store());
        let a = FactorTrainer::new(seeded(42)).fit(&set).unwrap();
        let b = FactorTrainer::new(seeded(42)).fit(&set).unwrap();

        for user in 1..=7 {
            for item in 100..=106 {
                let (u, i) = (UserId(user), ItemId(item));
                assert_eq!(a.predict(u, i).to_bits(), b.predict(u, i).to_bits());
            }
        }
        assert_eq!(a.seed, 42);
    }

    #[test]
    fn report_accounts_for_holdout_and_negatives() {
        let set = TrainingSet::from_store(&popular_pair_store());
        let mut trainer = FactorTrainer::new(FactorConfig {
            holdout_fraction: 0.25,
            ..seeded(3)
        });
        let model = trainer.fit(&set).unwrap();

        assert_eq!(model.report.holdout, 3);
        assert_eq!(model.report.positives, 9);
        assert!(model.report.negatives <= 9 * 2);
        assert!(model.report.holdout_rmse.is_some());
        assert_eq!(trainer.last_report(), Some(&model.report));
    }

    #[test]
    fn single_interaction_is_never_held_out() {
        let mut store = InteractionStore::new();
        store.record_interaction(UserId(1), ItemId(2));
        let model = FactorTrainer::new(seeded(5))
            .fit(&TrainingSet::from_store(&store))
            .unwrap();

        assert_eq!(model.report.positives, 1);
        assert_eq!(model.report.holdout, 0);
        assert!(model.report.holdout_rmse.is_none());
    }

    #[test]
    fn popular_items_outrank_untouched_ones_for_a_new_user() {
        let set = TrainingSet::from_store(&popular_pair_store());
        let model = FactorTrainer::new(FactorConfig {
            holdout_fraction: 0.0,
            ..seeded(11)
        })
        .fit(&set)
        .unwrap();

        let newcomer = UserId(99);
        let popular = model.score(newcomer, ItemId(100)).unwrap();
        for item in 102..=105 {
            let untouched = model.score(newcomer, ItemId(item)).unwrap();
            assert!(popular > untouched, "i100 {popular} <= i{item} {untouched}");
        }
    }

    #[test]
    fn trainer_plugs_into_the_recommender() {
        let mut engine: Recommender<FactorModel> = Recommender::new();
        for user in 1..=3 {
            engine.record_interaction(UserId(user), ItemId(10));
        }
        engine.record_interaction(UserId(1), ItemId(11));
        engine.set_price(ItemId(10), 4.0).unwrap();
        engine.set_price(ItemId(11), 4.0).unwrap();
        engine.set_budget(UserId(2), 4.0).unwrap();

        engine.train(&mut FactorTrainer::new(seeded(9))).unwrap();

        let all = engine.recommend_all().unwrap();
        assert_eq!(all[&UserId(2)], vec![ItemId(11)]);
        assert!(all[&UserId(1)].is_empty());
    }
}
