/// Cadence - interactive playback queue
use cadence_cli::{
    commands::{format_queue, Console, Outcome},
    config::AppConfig,
    store::JsonQueueStore,
    App,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use crossbeam_channel::{bounded, select, unbounded};
use std::io::BufRead;
use std::path::PathBuf;
use std::thread;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Play a queue from the terminal", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session (default)
    Run {
        /// Start playing the restored queue right away
        #[arg(long)]
        autoplay: bool,
    },
    /// Print the saved queue
    Queue,
    /// Print the effective configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence=info,cadence_cli=info,cadence_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config =
        AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    match cli.command.unwrap_or(Commands::Run { autoplay: false }) {
        Commands::Run { autoplay } => run(&config, autoplay)?,
        Commands::Queue => match JsonQueueStore::load(&config.storage.queue_file) {
            Some(snapshot) => println!("{}", format_queue(&snapshot.tracks, snapshot.current_index)),
            None => println!("No saved queue at {:?}", config.storage.queue_file),
        },
        Commands::Config => println!("{}", serde_json::to_string_pretty(&config)?),
    }

    Ok(())
}

fn run(config: &AppConfig, autoplay: bool) -> anyhow::Result<()> {
    tracing::info!("Starting Cadence");
    tracing::info!("Queue file: {:?}", config.storage.queue_file);

    let (stop_tx, stop_rx) = bounded(1);
    let app = App::start(config, stop_tx, autoplay).context("Failed to start playback service")?;
    let mut console = Console::new(app.handle(), app.preferences().clone());

    // Stdin blocks, so lines are read on their own thread
    let (line_tx, line_rx) = unbounded();
    thread::Builder::new()
        .name("cadence-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if line_tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Failed to read input: {}", e);
                        break;
                    }
                }
            }
        })?;

    println!("Type 'help' for commands");

    loop {
        select! {
            recv(line_rx) -> line => {
                let Ok(line) = line else {
                    tracing::info!("Input closed");
                    break;
                };
                match console.run_line(&line) {
                    Ok(Outcome::Continue(Some(text))) => println!("{}", text),
                    Ok(Outcome::Continue(None)) => {}
                    Ok(Outcome::Quit) => break,
                    Err(e) => eprintln!("{}", e),
                }
            }
            recv(stop_rx) -> _ => {
                tracing::info!("Playback finished, exiting");
                break;
            }
        }
    }

    app.shutdown();
    tracing::info!("Goodbye");
    Ok(())
}
