//! Operations shared by the subcommands and the shell.
//!
//! Each returns the text to show the user; mutating ones persist the
//! workspace (or model) before returning.

use anyhow::{Context, Result};
use budgetrec_core::{ItemId, UserId};
use budgetrec_factor::{FactorConfig, FactorTrainer};
use budgetrec_graph::{interaction_graph, recommendation_graph, BipartiteGraph};
use clap::ValueEnum;
use std::fmt::Write as _;
use std::path::Path;

use crate::workspace::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphView {
    Interactions,
    Recommendations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    Dot,
    Json,
}

pub fn interact(session: &mut Session, user: u64, item: u64) -> Result<String> {
    session.engine.record_interaction(UserId(user), ItemId(item));
    session.save_workspace()?;
    Ok(format!(
        "Recorded interaction {} -> {} ({} interactions in total)",
        UserId(user),
        ItemId(item),
        session.engine.store().interaction_count()
    ))
}

pub fn set_price(session: &mut Session, item: u64, price: f64) -> Result<String> {
    session.engine.set_price(ItemId(item), price)?;
    session.save_workspace()?;
    let priced = session.engine.catalog().priced_items().count();
    Ok(format!(
        "Price of {} set to {price:.2} ({priced} items priced)",
        ItemId(item)
    ))
}

pub fn set_budget(session: &mut Session, user: u64, limit: f64) -> Result<String> {
    session.engine.set_budget(UserId(user), limit)?;
    session.save_workspace()?;
    Ok(format!("Price limit of {} set to {limit:.2}", UserId(user)))
}

pub fn train(session: &mut Session, config: FactorConfig) -> Result<String> {
    let mut trainer = FactorTrainer::new(config);
    session.engine.train(&mut trainer)?;
    session.save_model()?;

    let mut out = String::from("Matrix factorization trained.");
    if let Some(report) = trainer.last_report() {
        let _ = write!(
            out,
            " {} interactions, {} negatives, {} held out; train rmse {:.4}",
            report.positives, report.negatives, report.holdout, report.train_rmse
        );
        if let Some(holdout_rmse) = report.holdout_rmse {
            let _ = write!(out, ", holdout rmse {holdout_rmse:.4}");
        }
    }
    Ok(out)
}

/// One line per user: budget, selected items, total spent.
pub fn recommend(session: &Session, user: Option<u64>) -> Result<String> {
    let users = match user {
        Some(raw) => vec![UserId(raw)],
        None => session.engine.store().all_known_users().into_iter().collect(),
    };

    let mut out = String::new();
    for user in users {
        let plan = session.engine.plan(user)?;
        let items = if plan.selected.is_empty() {
            "(none)".to_string()
        } else {
            plan.items()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        };
        let _ = writeln!(
            out,
            "{user} (budget {}): {items} [total {:.2}]",
            plan.budget, plan.total_price
        );
    }
    if out.is_empty() {
        out.push_str("No users known yet.\n");
    }
    Ok(out)
}

pub fn graph(session: &Session, view: GraphView, format: GraphFormat) -> Result<String> {
    let graph: BipartiteGraph = match view {
        GraphView::Interactions => interaction_graph(session.engine.store()),
        GraphView::Recommendations => recommendation_graph(&session.engine.recommend_all()?),
    };
    match format {
        GraphFormat::Dot => Ok(graph.to_dot()),
        GraphFormat::Json => graph.to_json_pretty().context("Failed to serialize graph"),
    }
}

/// Writes `text` to `output`, or returns it unchanged for printing.
pub fn deliver(text: String, output: Option<&Path>) -> Result<String> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, text).with_context(|| format!("Failed to write {:?}", path))?;
            Ok(format!("Wrote {}", path.display()))
        }
        None => Ok(text),
    }
}
