//! crew-digest CLI: normalize crew responses, extract recommendations and
//! discover competitors from the shell.
//!
//! Usage:
//!   crew-digest services
//!   crew-digest normalize --service comp_analysis --input response.json --condense
//!   crew-digest extract --input report.md
//!   crew-digest discover --company Zomato --category "food delivery"

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crew_digest::clients::GroqClient;
use crew_digest::condenser::SummaryCondenser;
use crew_digest::config::{Config, RuntimeConfig};
use crew_digest::discovery::CompetitorDiscovery;
use crew_digest::session::{InputMode, Session};
use crew_digest::{
    CrewDigestError, ExportDocument, FailureClass, InvocationContext, ResultPipeline, ServiceId,
};

#[derive(Parser)]
#[command(name = "crew-digest")]
#[command(about = "Normalize crew analysis results and extract recommendations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the service catalog
    Services,
    /// Normalize a raw crew response into a canonical result
    Normalize {
        #[arg(long)]
        service: String,
        /// Response JSON file, or "-" for stdin
        #[arg(long, default_value = "-")]
        input: String,
        /// JSON array of executive-summary bullets
        #[arg(long)]
        bullets: Option<PathBuf>,
        /// Generate the executive summary with the configured chat backend
        #[arg(long)]
        condense: bool,
        /// Print the downloadable export document instead
        #[arg(long)]
        export: bool,
    },
    /// Extract prioritized recommendations from free text
    Extract {
        #[arg(long, default_value = "-")]
        input: String,
    },
    /// Ask the chat backend for competitors of a company
    Discover {
        #[arg(long)]
        company: String,
        #[arg(long)]
        category: String,
    },
    /// Print the request a crew expects for the given inputs
    Request {
        #[arg(long)]
        service: String,
        #[arg(long, default_value = "")]
        company: String,
        /// Up to three competitors
        #[arg(long = "competitor")]
        competitors: Vec<String>,
    },
    /// Classify a failed crew call and print the remediation
    Classify {
        #[arg(long)]
        service: String,
        #[arg(long)]
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    crew_digest::load_env();
    let log_level = RuntimeConfig::load_from_env().log_level;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("crew_digest=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    match cli.command {
        Commands::Services => services(),
        Commands::Normalize {
            service,
            input,
            bullets,
            condense,
            export,
        } => normalize(&config, &service, &input, bullets, condense, export).await,
        Commands::Extract { input } => extract(&config, &input),
        Commands::Discover { company, category } => discover(&config, &company, &category).await,
        Commands::Request {
            service,
            company,
            competitors,
        } => request(&config, &service, company, competitors),
        Commands::Classify { service, message } => classify(&config, &service, &message),
    }
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading {}", input))
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn services() -> Result<()> {
    let catalog: Vec<Value> = ServiceId::ALL
        .iter()
        .map(|id| {
            let info = id.info();
            json!({
                "id": id.as_str(),
                "name": info.name,
                "port": info.port,
                "endpoint": info.endpoint,
                "needsFocalCompany": info.needs_focal_company,
                "hasRecommendations": info.has_recommendations,
                "agents": info.agents,
            })
        })
        .collect();
    print_json(&catalog)
}

async fn normalize(
    config: &Config,
    service: &str,
    input: &str,
    bullets: Option<PathBuf>,
    condense: bool,
    export: bool,
) -> Result<()> {
    let service: ServiceId = service.parse()?;
    let raw: Value = serde_json::from_str(&read_input(input)?).context("parsing response JSON")?;
    let ctx = InvocationContext::now();
    let pipeline = ResultPipeline::from_config(config);
    let expected = service.info().agents;

    let result = if condense {
        let condenser = SummaryCondenser::new(config.summarizer.clone());
        match GroqClient::from_config(config) {
            Ok(client) => {
                pipeline
                    .run_with_condenser(&ctx, service, &raw, expected, &condenser, &client)
                    .await
            }
            Err(e) => {
                tracing::warn!("Skipping executive summary: {}", e);
                pipeline.run(&ctx, service, &raw, expected, Vec::new())
            }
        }
    } else {
        let bullets: Vec<String> = match bullets {
            Some(path) => serde_json::from_str(
                &std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
            )
            .context("bullets must be a JSON array of strings")?,
            None => Vec::new(),
        };
        pipeline.run(&ctx, service, &raw, expected, bullets)
    };

    info!(
        "{} normalized: {} agents, recommendations from {:?}",
        result.service_name,
        result.agents.len(),
        result.recommendation_source
    );

    if export {
        let doc = ExportDocument::from_result(service.as_str(), &result, ctx.timestamp_ms);
        info!("export file name: {}", doc.file_name(ctx.timestamp_ms));
        print_json(&doc)
    } else {
        print_json(&result)
    }
}

fn extract(config: &Config, input: &str) -> Result<()> {
    let text = read_input(input)?;
    let pipeline = ResultPipeline::from_config(config);
    let items = pipeline.recommendations(&text, &[]).map(|(items, _)| items);
    print_json(&items)
}

async fn discover(config: &Config, company: &str, category: &str) -> Result<()> {
    match find_competitors(config, company, category).await {
        Ok(names) => print_json(&names),
        Err(e) => {
            report_discovery_error(config, &e);
            Err(e.into())
        }
    }
}

async fn find_competitors(
    config: &Config,
    company: &str,
    category: &str,
) -> crew_digest::Result<Vec<String>> {
    let client = GroqClient::from_config(config)?;
    CompetitorDiscovery::new(config.discovery.clone())
        .discover(&client, company, category)
        .await
}

fn report_discovery_error(config: &Config, err: &CrewDigestError) {
    eprintln!(
        "{}",
        err.failure_class().remediation_at(
            &config.summarizer.endpoint,
            "chat backend",
            &err.to_string()
        )
    );
}

fn request(
    config: &Config,
    service: &str,
    company: String,
    competitors: Vec<String>,
) -> Result<()> {
    let service: ServiceId = service.parse()?;
    let mut session = Session::new();
    session.set_mode(InputMode::StructuredEntry);
    session.focal_company = company;
    for (slot, name) in competitors.into_iter().enumerate() {
        session.set_manual_competitor(slot, name)?;
    }
    let request = session.backend_request(service, &config.backend)?;
    print_json(&request)
}

fn classify(config: &Config, service: &str, message: &str) -> Result<()> {
    let service: ServiceId = service.parse()?;
    let class = FailureClass::from_message(message);
    println!(
        "{}",
        class.remediation(service.info(), &config.backend.host, message)
    );
    Ok(())
}
