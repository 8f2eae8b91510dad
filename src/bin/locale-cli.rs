use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use locale_gateway::config::{load_config, RoutingConfig};
use locale_gateway::locale::{negotiate, Locale, RoutingDecision};
use locale_gateway::routing::{Dispatch, LocaleRouter};

#[derive(Parser)]
#[command(name = "locale-cli")]
#[command(about = "Inspect locale routing decisions offline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how the gateway would route a request
    Decide {
        /// Request path, e.g. /pricing
        #[arg(short, long)]
        path: String,

        /// Accept-Language header value
        #[arg(short, long)]
        accept_language: Option<String>,

        /// Gateway config to take path exclusions from
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show which supported locale an Accept-Language value selects
    Negotiate {
        /// Accept-Language header value
        header: String,
    },
}

#[derive(Serialize)]
struct DecideOutput {
    dispatch: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    decision: Option<RoutingDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
}

#[derive(Serialize)]
struct NegotiateOutput {
    header: String,
    locale: Option<Locale>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Decide {
            path,
            accept_language,
            config,
        } => {
            let routing = match config {
                Some(file) => load_config(&file)?.routing,
                None => RoutingConfig::default(),
            };
            let router = LocaleRouter::from_config(&routing);
            let dispatch = router.route(&path, accept_language.as_deref());

            let output = match dispatch {
                Dispatch::Bypass => DecideOutput {
                    dispatch: "bypass",
                    decision: None,
                    target: None,
                },
                Dispatch::Decide(decision) => DecideOutput {
                    dispatch: decision.kind(),
                    target: decision.target_path(),
                    decision: Some(decision),
                },
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Negotiate { header } => {
            let locale = negotiate(&header);
            let output = NegotiateOutput { header, locale };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
