//! oxide-route-check CLI
//!
//! Loads a route table and inspects how requests are mapped.

mod routes;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_route_tree::{MatchResult, Method, Request};

use crate::routes::{Registry, RouteTable};

/// Resolve requests against a route table.
#[derive(Parser)]
#[command(name = "oxide-route-check")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Route table file (JSON).
    #[arg(short, long, env = "ROUTE_TABLE", default_value = "routes.json")]
    routes: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one request.
    Resolve {
        /// Request target, path plus optional query string.
        target: String,

        /// HTTP method.
        #[arg(short, long, default_value = "GET")]
        method: Method,

        /// Request header as `name=value`; repeatable.
        #[arg(short = 'H', long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,
    },

    /// Print the pattern tree.
    Tree,

    /// List registered routes.
    Routes,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))
}

/// Renders a lookup result for the terminal.
fn describe(result: MatchResult<String>, path: &str) -> anyhow::Result<String> {
    if matches!(result, MatchResult::AmbiguousPreflight) {
        return Ok("preflight matched several CORS routes".to_string());
    }
    let Some(m) = result.into_result(path)? else {
        return Ok(format!("no route for {path}"));
    };

    let mut out = format!("{} {} ({:?})", m.handler, m.pattern, m.source);
    for (name, value) in m.params.iter() {
        out.push_str(&format!("\n  {name} = {value}"));
    }
    Ok(out)
}

fn list_routes(registry: &Registry) -> String {
    registry
        .routes()
        .map(|(id, reg)| {
            let methods: Vec<&str> = reg.methods.iter().map(Method::as_str).collect();
            let index = if reg.in_tree { "tree" } else { "fallback" };
            format!(
                "{id}\t{}\t{}\t{}\t{index}",
                methods.join(","),
                reg.pattern,
                reg.handler
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Loading route table {}", cli.routes.display());
    let registry = RouteTable::load(&cli.routes)?.into_registry()?;

    match cli.command {
        Commands::Resolve {
            target,
            method,
            headers,
        } => {
            let request = headers
                .into_iter()
                .fold(Request::parse_target(method, &target), |request, (name, value)| {
                    request.header(name, value)
                });
            let result = registry.resolve(&request);
            println!("{}", describe(result, &request.path)?);
        }

        Commands::Tree => {
            print!("{}", registry.tree());
        }

        Commands::Routes => {
            if registry.is_empty() {
                info!("The route table is empty.");
            } else {
                println!("{}", list_routes(&registry));
            }
        }
    }

    Ok(())
}
