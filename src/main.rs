use anyhow::Context;
use clap::{Parser, Subcommand};
use std::{
    fs::File,
    io::{self, BufReader, BufWriter},
    path::PathBuf,
};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use phishguard::{
    decision::Threshold,
    evaluation::{evaluate, Dataset},
    report::{read_url_list, write_report},
    routes::{router, AppContext},
    Config, PhishingEngine,
};

#[derive(Parser, Debug)]
#[command(name = "phishguard", version, about = "Phishing URL classifier")]
struct Cli {
    /// Configuration file (defaults to ./phishguard.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Classify URLs and print the result for each
    Check {
        #[arg(required = true)]
        urls: Vec<String>,
        /// One JSON object per line
        #[arg(long)]
        json: bool,
    },
    /// Classify a URL list and write a CSV report
    Report {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Score the model against a labelled dataset
    Evaluate {
        #[arg(short, long)]
        dataset: PathBuf,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "phishguard=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = Config::load_from(cli.config.as_deref())?;
    info!("Loaded configuration: {:?}", config);

    let engine = PhishingEngine::from_config(&config)
        .with_context(|| format!("loading model from {}", config.model_path.display()))?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config, engine).await,
        Command::Check { urls, json } => check(&engine, &urls, json),
        Command::Report { input, output } => {
            let reader = BufReader::new(
                File::open(&input).with_context(|| format!("opening {}", input.display()))?,
            );
            let urls = read_url_list(reader)?;
            let writer = BufWriter::new(
                File::create(&output).with_context(|| format!("creating {}", output.display()))?,
            );
            let summary = write_report(&engine, &urls, writer)?;
            println!(
                "{} URLs checked: {} phishing, {} legitimate -> {}",
                summary.total,
                summary.phishing,
                summary.legitimate,
                output.display()
            );
            Ok(())
        }
        Command::Evaluate { dataset } => {
            let reader = BufReader::new(
                File::open(&dataset).with_context(|| format!("opening {}", dataset.display()))?,
            );
            let model = engine.model();
            let data = Dataset::from_csv(reader, model.schema(), model.mapping())?;
            let threshold: Threshold = engine.threshold();
            let report = evaluate(model, &data, threshold)?;
            print!("{}", report);
            Ok(())
        }
    }
}

async fn serve(config: &Config, engine: PhishingEngine) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let app = router(AppContext::new(engine));

    info!("Starting phishing classifier on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn check(engine: &PhishingEngine, urls: &[String], json: bool) -> anyhow::Result<()> {
    for url in urls {
        let prediction = engine.predict(url)?;
        if json {
            let line = serde_json::json!({
                "url": url,
                "label": prediction.label,
                "confidence": prediction.confidence,
                "probability_of_legitimate": prediction.probability_of_legitimate,
                "features": prediction.features,
            });
            println!("{}", line);
            continue;
        }

        println!("{}", url);
        println!(
            "  {} ({} confidence)",
            prediction.label,
            prediction.confidence_percent()
        );
        if let Some(hit) = engine.extractor().typosquat_match(url) {
            match hit.mismatches {
                Some(m) => println!(
                    "  looks like {} (similarity {:.2}, {} mismatches)",
                    hit.target, hit.similarity, m
                ),
                None => println!("  looks like {} (similarity {:.2})", hit.target, hit.similarity),
            }
        }
        for (feature, value) in prediction.features.iter() {
            println!("  {:<28} {:>2}", feature.name(), value);
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
