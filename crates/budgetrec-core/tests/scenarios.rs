//! End-to-End-Verhalten des Recommenders mit fester Score-Tabelle.

use budgetrec_core::{
    Budget, ItemId, RecError, Recommender, RecommenderConfig, TableOracle, UserId,
};
use std::sync::Arc;

const U: UserId = UserId(1);
const X: ItemId = ItemId(100);
const Y: ItemId = ItemId(101);
const Z: ItemId = ItemId(102);

fn engine_with(oracle: TableOracle) -> Recommender<TableOracle> {
    let mut engine = Recommender::new();
    engine.install_oracle(Arc::new(oracle));
    engine
}

#[test]
fn second_item_rejected_when_sum_exceeds_budget() {
    let mut engine = engine_with(TableOracle::new(0.0).with(U, X, 0.9).with(U, Y, 0.8));
    engine.set_price(X, 10.0).expect("price X");
    engine.set_price(Y, 15.0).expect("price Y");
    engine.set_budget(U, 20.0).expect("budget");

    assert_eq!(engine.recommend(U).expect("recommend"), vec![X]);
}

#[test]
fn both_items_selected_when_they_fit() {
    let mut engine = engine_with(TableOracle::new(0.0).with(U, X, 0.9).with(U, Y, 0.8));
    engine.set_price(X, 10.0).expect("price X");
    engine.set_price(Y, 5.0).expect("price Y");
    engine.set_budget(U, 20.0).expect("budget");

    assert_eq!(engine.recommend(U).expect("recommend"), vec![X, Y]);
}

#[test]
fn top_ranked_unpriced_item_is_never_recommended() {
    let oracle = TableOracle::new(0.0)
        .with(U, Z, 0.99)
        .with(U, X, 0.9)
        .with(U, Y, 0.8);
    let mut engine = engine_with(oracle);
    engine.record_interaction(UserId(7), Z);
    engine.set_price(X, 10.0).expect("price X");
    engine.set_price(Y, 5.0).expect("price Y");

    let items = engine.recommend(U).expect("recommend");
    assert!(!items.contains(&Z));
    assert_eq!(items, vec![X, Y]);
}

#[test]
fn recommending_before_training_fails() {
    let mut engine: Recommender<TableOracle> = Recommender::new();
    engine.record_interaction(U, X);
    engine.set_price(Y, 1.0).expect("price");

    assert!(matches!(engine.recommend(U), Err(RecError::UntrainedModel)));
    assert!(matches!(engine.recommend_all(), Err(RecError::UntrainedModel)));
}

/// Kleiner Marktplatz: 4 Nutzer, 12 Artikel, Scores aus einer einfachen Formel.
fn marketplace() -> Recommender<TableOracle> {
    let users: Vec<UserId> = (1..=4).map(UserId).collect();
    let items: Vec<ItemId> = (50..62).map(ItemId).collect();

    let mut oracle = TableOracle::new(0.0);
    for user in &users {
        for item in &items {
            let score = ((user.raw() * 31 + item.raw() * 17) % 23) as f64 / 23.0;
            oracle = oracle.with(*user, *item, score);
        }
    }

    let mut engine = Recommender::with_config(RecommenderConfig::default());
    engine.install_oracle(Arc::new(oracle));
    for (n, item) in items.iter().enumerate() {
        // Jeder fünfte Artikel bleibt ohne Preis.
        if n % 5 != 4 {
            engine
                .set_price(*item, 2.5 + (n % 4) as f64 * 3.0)
                .expect("price");
        }
    }
    for user in &users {
        engine.record_interaction(*user, items[(user.raw() as usize * 3) % items.len()]);
        engine.record_interaction(*user, items[(user.raw() as usize * 7) % items.len()]);
    }
    engine.set_budget(UserId(1), 12.0).expect("budget");
    engine.set_budget(UserId(2), 0.0).expect("budget");
    engine.set_budget(UserId(3), 30.0).expect("budget");
    engine
}

#[test]
fn repeated_calls_are_deterministic() {
    let engine = marketplace();
    let first = engine.recommend_all().expect("first");
    let second = engine.recommend_all().expect("second");
    assert_eq!(first, second);
}

#[test]
fn selections_respect_budget_history_pricing_and_rank() {
    let engine = marketplace();
    let oracle = Arc::clone(engine.oracle().expect("trained"));

    for user in engine.store().all_known_users() {
        let plan = engine.plan(user).expect("plan");
        let history = engine.store().items_interacted_by(user);

        let spent: f64 = plan
            .items()
            .iter()
            .map(|item| engine.catalog().price_of(*item).expect("selected items are priced"))
            .sum();
        assert!(engine.catalog().budget_of(user).admits(spent));
        assert!((spent - plan.total_price).abs() < 1e-9);

        for item in plan.items() {
            assert!(!history.contains(&item), "{user} already has {item}");
        }

        for pair in plan.selected.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        for selected in &plan.selected {
            let score = budgetrec_core::ScoringOracle::score(&*oracle, user, selected.item)
                .expect("score");
            assert!((score - selected.score).abs() < f64::EPSILON);
        }
    }
}

#[test]
fn zero_budget_selects_only_free_items() {
    let mut engine = marketplace();
    engine.set_price(ItemId(200), 0.0).expect("free item");

    let plan = engine.plan(UserId(2)).expect("plan");
    assert_eq!(plan.budget, Budget::Limited(0.0));
    assert_eq!(plan.items(), vec![ItemId(200)]);
}

#[test]
fn user_without_budget_gets_every_priced_candidate() {
    let engine = marketplace();
    let plan = engine.plan(UserId(4)).expect("plan");

    assert_eq!(plan.budget, Budget::Unbounded);
    assert_eq!(plan.skipped_over_budget, 0);
    let priced_candidates = engine
        .candidates(UserId(4))
        .into_iter()
        .filter(|item| engine.catalog().price_of(*item).is_some())
        .count();
    assert_eq!(plan.selected.len(), priced_candidates);
}
