//! Trains a factor model on a tiny shop and prints budget-aware recommendations.
//!
//! Run with: cargo run -p budgetrec-factor --example train_and_recommend

use budgetrec_core::{ItemId, Recommender, UserId};
use budgetrec_factor::{FactorConfig, FactorModel, FactorTrainer};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let mut engine: Recommender<FactorModel> = Recommender::new();

    // (user, item) purchases
    let purchases = [
        (1, 101), (1, 102), (1, 103),
        (2, 101), (2, 104),
        (3, 102), (3, 103), (3, 105),
        (4, 101), (4, 102),
    ];
    for (user, item) in purchases {
        engine.record_interaction(UserId(user), ItemId(item));
    }
    for (item, price) in [(101, 12.0), (102, 8.5), (103, 20.0), (104, 5.0), (105, 15.0)] {
        engine.set_price(ItemId(item), price)?;
    }
    // Item 106 is known but has no price, so it is never recommended.
    engine.record_interaction(UserId(5), ItemId(106));

    engine.set_budget(UserId(1), 10.0)?;
    engine.set_budget(UserId(2), 25.0)?;

    let mut trainer = FactorTrainer::new(FactorConfig {
        seed: Some(7),
        ..FactorConfig::default()
    });
    engine.train(&mut trainer)?;
    if let Some(report) = trainer.last_report() {
        println!(
            "trained on {} interactions (+{} negatives), train rmse {:.3}",
            report.positives, report.negatives, report.train_rmse
        );
    }

    for user in engine.store().all_known_users() {
        let plan = engine.plan(user)?;
        let items: Vec<String> = plan
            .selected
            .iter()
            .map(|s| format!("{} ({:.2}, score {:.3})", s.item, s.price, s.score))
            .collect();
        println!(
            "{user} budget {} -> [{}] total {:.2}",
            plan.budget,
            items.join(", "),
            plan.total_price
        );
    }

    Ok(())
}
