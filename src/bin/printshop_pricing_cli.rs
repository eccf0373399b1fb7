//! Printshop Pricing CLI - JSON bridge for storefront tooling
//!
//! Commands: products, resolve, quote, addon, availability
//! Outputs JSON to stdout, logs to stderr
//! Exit 0 when priced, 2 when nothing matches or the selection is rejected,
//! 1 on bad input or catalog errors

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use printshop_pricing::{
    availability::Availability, catalog::Catalog, parse_unit_price, resolve_addon, AddonKind,
    CatalogProvider, EngineConfig, FamilyRules, PriceCalculator, QuoteError, QuoteRequest,
    Resolution, Selection,
};

#[derive(Parser)]
#[command(name = "printshop-pricing-cli")]
#[command(about = "Printshop Pricing CLI - pricing rule resolution")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory of product and add-on catalog JSON files
    #[arg(short, long, default_value = "catalog")]
    catalog_dir: PathBuf,

    /// Engine configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalogued products
    Products,

    /// Resolve the pricing rule for a selection
    Resolve {
        #[arg(short, long)]
        product: String,

        /// JSON payload (Selection)
        #[arg(short = 'j', long)]
        payload: String,
    },

    /// Price a selection, including add-ons
    Quote {
        /// JSON payload (QuoteRequest)
        #[arg(short = 'j', long)]
        payload: String,
    },

    /// Look up an add-on price entry
    Addon {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        size: String,

        #[arg(long)]
        color: String,

        #[arg(long)]
        pages: u32,
    },

    /// Report which Paper Printing options would price this job
    Availability {
        #[arg(short, long)]
        product: String,

        /// JSON payload (Selection)
        #[arg(short = 'j', long)]
        payload: String,
    },
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // A second subscriber only happens in embedding tests; ignore it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init();
}

fn emit(value: &impl Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => println!(r#"{{"error": "Failed to serialize output: {e}"}}"#),
    }
}

fn fail(message: String) -> ExitCode {
    emit(&serde_json::json!({ "success": false, "error": message }));
    ExitCode::FAILURE
}

fn parse_selection(payload: &str) -> Result<Selection, String> {
    serde_json::from_str(payload).map_err(|e| format!("Invalid payload: {e}"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match EngineConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!(r#"{{"error": "Failed to load config: {}"}}"#, e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.log_level);

    let catalog = match Catalog::load_from_dir(&cli.catalog_dir) {
        Ok(c) => c,
        Err(e) => {
            eprintln!(r#"{{"error": "Failed to load catalog: {}"}}"#, e);
            return ExitCode::FAILURE;
        }
    };

    let calculator = PriceCalculator::new(catalog, config);

    match cli.command {
        Commands::Products => {
            let products: Vec<_> = calculator
                .catalog()
                .list()
                .iter()
                .map(|p| {
                    serde_json::json!({
                        "id": p.id,
                        "name": p.name,
                        "family": p.pricing.family(),
                        "rules": p.pricing.len(),
                    })
                })
                .collect();
            emit(&products);
            ExitCode::SUCCESS
        }

        Commands::Resolve { product, payload } => {
            let selection = match parse_selection(&payload) {
                Ok(s) => s,
                Err(e) => return fail(e),
            };
            match calculator.resolve(&product, &selection) {
                Ok(resolution) => {
                    emit(&resolution);
                    if resolution.is_found() {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::from(2)
                    }
                }
                Err(e) => fail(e.to_string()),
            }
        }

        Commands::Quote { payload } => {
            let request: QuoteRequest = match serde_json::from_str(&payload) {
                Ok(r) => r,
                Err(e) => return fail(format!("Invalid payload: {e}")),
            };
            match calculator.quote(&request) {
                Ok(quote) => {
                    emit(&serde_json::json!({ "success": true, "quote": quote }));
                    ExitCode::SUCCESS
                }
                Err(e @ (QuoteError::ProductNotFound(_) | QuoteError::Serialization(_))) => {
                    fail(e.to_string())
                }
                Err(e) => {
                    emit(&serde_json::json!({ "success": false, "error": e.to_string() }));
                    ExitCode::from(2)
                }
            }
        }

        Commands::Addon {
            name,
            size,
            color,
            pages,
        } => match resolve_addon(calculator.catalog().addons(), &name, &size, &color, pages) {
            Some(entry) => {
                emit(&serde_json::json!({
                    "entry": entry,
                    "kind": AddonKind::from_name(&name),
                    "unitPrice": parse_unit_price(&entry.price),
                }));
                ExitCode::SUCCESS
            }
            None => {
                emit(&serde_json::json!({ "entry": null }));
                ExitCode::from(2)
            }
        },

        Commands::Availability { product, payload } => {
            let selection = match parse_selection(&payload) {
                Ok(s) => s,
                Err(e) => return fail(e),
            };
            let Some(found) = calculator.catalog().product(&product) else {
                return fail(QuoteError::ProductNotFound(product).to_string());
            };
            let FamilyRules::PaperPrinting(rules) = &found.pricing else {
                return fail(format!("{} is not a paper printing product", found.id));
            };

            let availability = Availability::new(calculator.resolver());
            let size = selection.size.as_deref().unwrap_or_default();
            let color = selection.color.as_deref().unwrap_or_default();
            let pages = selection.page_count.unwrap_or_default();
            let copies = selection.copies();
            let priced = calculator.resolver().resolve_paper_printing(rules, &selection);

            emit(&serde_json::json!({
                "pageCountValid": availability.is_page_count_valid(rules, size, color, pages),
                "doubleSidedAvailable":
                    availability.is_double_sided_available(rules, size, color, pages, copies),
                "sizes": availability.available_sizes(rules, color, pages, copies),
                "colors": availability.available_colors(rules, size, pages, copies),
                "selection": priced,
            }));
            if matches!(priced, Resolution::Found(_)) {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
    }
}
