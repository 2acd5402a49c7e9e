use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{HttpFetcher, NavigationController};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod orchestration;
mod view;

use commands::{parse_command, HELP};
use config::{load_settings, Settings};
use orchestration::{dispatch, Outcome};
use view::render_text;

const COMMAND_QUEUE: usize = 32;

#[derive(Parser, Debug)]
#[command(about = "Hypermedia admin client for Mason APIs")]
struct Args {
    /// Entry point of the API; overrides admin.toml and the environment.
    #[arg(long)]
    entry_url: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[arg(long)]
    log: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings();
    if let Some(v) = args.entry_url {
        settings.entry_url = v;
    }
    if let Some(v) = args.timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = args.log {
        settings.log_filter = v;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;
    runtime.block_on(run(settings))
}

async fn run(settings: Settings) -> Result<()> {
    let fetcher = HttpFetcher::with_timeout(&settings.entry_url, settings.request_timeout())
        .with_context(|| format!("cannot use entry url '{}'", settings.entry_url))?;
    let mut nav = NavigationController::new(
        Arc::new(fetcher),
        settings.entry_url.clone(),
        settings.render_options(),
    );

    let (line_tx, mut line_rx) = mpsc::channel::<String>(COMMAND_QUEUE);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    println!("{HELP}");
    tracing::info!(entry_url = %settings.entry_url, "admin starting");
    nav.bootstrap();

    loop {
        tokio::select! {
            Some(completion) = nav.next_completion() => {
                nav.apply(completion);
                if nav.in_flight() == 0 {
                    print!("{}", render_text(nav.view()));
                }
            }
            line = line_rx.recv() => {
                let Some(line) = line else {
                    nav.settle().await;
                    print!("{}", render_text(nav.view()));
                    break;
                };
                let cmd = match parse_command(&line) {
                    Ok(cmd) => cmd,
                    Err(err) => {
                        println!("{err}");
                        continue;
                    }
                };
                match dispatch(&mut nav, cmd) {
                    Outcome::Started => {}
                    Outcome::Message(message) => println!("{message}"),
                    Outcome::ShowView => print!("{}", render_text(nav.view())),
                    Outcome::Quit => break,
                }
            }
        }
    }

    Ok(())
}
