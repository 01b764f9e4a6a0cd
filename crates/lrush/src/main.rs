//! lrush - interactive shell over an in-process LRU cache

mod command;
mod handler;
mod reply;

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Parser;
use lrucache::{LruCache, DEFAULT_CAPACITY};
use tracing::{info, warn};

use crate::command::Command;
use crate::handler::CommandHandler;
use crate::reply::Reply;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cache capacity (number of items)
    #[arg(short, long, env = "LRUSH_CAPACITY", default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Do not print the banner or prompt
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Logs go to stderr so replies on stdout stay clean
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let cache = LruCache::try_new(args.capacity).context("invalid --capacity")?;
    info!("Starting lrush v{}", env!("CARGO_PKG_VERSION"));
    info!("Cache capacity: {}", args.capacity);

    if !args.quiet {
        println!("lrush {} (capacity {})", env!("CARGO_PKG_VERSION"), args.capacity);
        println!("Commands: GET SET DEL EXISTS PEEK KEYS DBSIZE FLUSHDB INFO PING QUIT");
    }

    let mut handler = CommandHandler::new(cache);
    run(&mut handler, io::stdin().lock(), io::stdout().lock(), !args.quiet)
}

fn run<R: BufRead, W: Write>(
    handler: &mut CommandHandler,
    input: R,
    mut output: W,
    prompt: bool,
) -> Result<()> {
    let mut lines = input.lines();

    loop {
        if prompt {
            write!(output, "lrush> ")?;
            output.flush()?;
        }

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("failed to read command")?;

        let reply = match Command::parse(&line) {
            Ok(Some(Command::Quit)) => {
                writeln!(output, "{}", Reply::Ok)?;
                break;
            }
            Ok(Some(cmd)) => handler.handle(cmd),
            Ok(None) => continue,
            Err(e) => {
                warn!("Parse error: {}", e);
                Reply::Error(e.to_string())
            }
        };

        writeln!(output, "{}", reply)?;
    }

    info!("Input closed, exiting");
    Ok(())
}
