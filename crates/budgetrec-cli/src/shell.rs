//! Line-oriented shell over a fixed command table.

use anyhow::{anyhow, bail, Context, Result};
use budgetrec_factor::FactorConfig;
use std::io::{BufRead, Write};
use std::str::FromStr;

use crate::commands::{self, GraphFormat, GraphView};
use crate::workspace::Session;

/// What the loop does after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue(String),
    Exit(u8),
}

type Handler = fn(&mut Session, &[&str], &FactorConfig) -> Result<Flow>;

/// `(name, usage, handler)`
const COMMANDS: &[(&str, &str, Handler)] = &[
    ("interact", "interact <user> <item>", cmd_interact),
    ("price", "price <item> <price>", cmd_price),
    ("budget", "budget <user> <limit>", cmd_budget),
    ("train", "train", cmd_train),
    ("recommend", "recommend [user]", cmd_recommend),
    (
        "graph",
        "graph <interactions|recommendations> [dot|json]",
        cmd_graph,
    ),
    ("help", "help", cmd_help),
    ("exit", "exit [code]", cmd_exit),
];

/// Runs one input line against the table.
pub fn dispatch(session: &mut Session, line: &str, train_config: &FactorConfig) -> Result<Flow> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(Flow::Continue(String::new()));
    };
    let args: Vec<&str> = words.collect();
    let (_, _, handler) = COMMANDS
        .iter()
        .find(|(command, _, _)| *command == name)
        .ok_or_else(|| anyhow!("Unknown command '{name}'; type 'help' for the list"))?;
    handler(session, &args, train_config)
}

/// Reads commands until `exit` or end of input. Errors are reported and the
/// loop goes on with the state as it was.
pub fn run(
    session: &mut Session,
    input: impl BufRead,
    out: &mut impl Write,
    err: &mut impl Write,
    train_config: &FactorConfig,
) -> Result<u8> {
    writeln!(out, "budgetrec shell; type 'help' for commands")?;
    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next() else {
            return Ok(0);
        };
        match dispatch(session, &line?, train_config) {
            Ok(Flow::Continue(text)) => {
                if !text.is_empty() {
                    writeln!(out, "{}", text.trim_end())?;
                }
            }
            Ok(Flow::Exit(code)) => {
                writeln!(out, "Exiting the program.")?;
                return Ok(code);
            }
            Err(e) => writeln!(err, "error: {e:#}")?,
        }
    }
}

fn arg<T>(args: &[&str], index: usize, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = args
        .get(index)
        .ok_or_else(|| anyhow!("missing argument <{name}>"))?;
    raw.parse()
        .with_context(|| format!("invalid <{name}>: '{raw}'"))
}

fn expect_arity(args: &[&str], max: usize) -> Result<()> {
    if args.len() > max {
        bail!("expected at most {max} argument(s), got {}", args.len());
    }
    Ok(())
}

fn cmd_interact(session: &mut Session, args: &[&str], _: &FactorConfig) -> Result<Flow> {
    expect_arity(args, 2)?;
    let text = commands::interact(session, arg(args, 0, "user")?, arg(args, 1, "item")?)?;
    Ok(Flow::Continue(text))
}

fn cmd_price(session: &mut Session, args: &[&str], _: &FactorConfig) -> Result<Flow> {
    expect_arity(args, 2)?;
    let text = commands::set_price(session, arg(args, 0, "item")?, arg(args, 1, "price")?)?;
    Ok(Flow::Continue(text))
}

fn cmd_budget(session: &mut Session, args: &[&str], _: &FactorConfig) -> Result<Flow> {
    expect_arity(args, 2)?;
    let text = commands::set_budget(session, arg(args, 0, "user")?, arg(args, 1, "limit")?)?;
    Ok(Flow::Continue(text))
}

fn cmd_train(session: &mut Session, args: &[&str], config: &FactorConfig) -> Result<Flow> {
    expect_arity(args, 0)?;
    commands::train(session, config.clone()).map(Flow::Continue)
}

fn cmd_recommend(session: &mut Session, args: &[&str], _: &FactorConfig) -> Result<Flow> {
    expect_arity(args, 1)?;
    let user = if args.is_empty() {
        None
    } else {
        Some(arg(args, 0, "user")?)
    };
    commands::recommend(session, user).map(Flow::Continue)
}

fn cmd_graph(session: &mut Session, args: &[&str], _: &FactorConfig) -> Result<Flow> {
    expect_arity(args, 2)?;
    let view = match args.first().copied() {
        Some("interactions") => GraphView::Interactions,
        Some("recommendations") => GraphView::Recommendations,
        Some(other) => bail!("unknown view '{other}'"),
        None => bail!("missing argument <view>"),
    };
    let format = match args.get(1).copied() {
        None | Some("dot") => GraphFormat::Dot,
        Some("json") => GraphFormat::Json,
        Some(other) => bail!("unknown format '{other}'"),
    };
    commands::graph(session, view, format).map(Flow::Continue)
}

fn cmd_help(_: &mut Session, _: &[&str], _: &FactorConfig) -> Result<Flow> {
    let usages: Vec<&str> = COMMANDS.iter().map(|(_, usage, _)| *usage).collect();
    Ok(Flow::Continue(format!("commands:\n  {}", usages.join("\n  "))))
}

fn cmd_exit(_: &mut Session, args: &[&str], _: &FactorConfig) -> Result<Flow> {
    expect_arity(args, 1)?;
    let code = if args.is_empty() {
        0
    } else {
        arg(args, 0, "code")?
    };
    Ok(Flow::Exit(code))
}
