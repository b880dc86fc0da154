use std::str::FromStr;
use std::sync::Arc;

use dexbook_rs::catalog::{AssetCatalog, StaticCatalog};
use dexbook_rs::indexer::{self, IndexerApi};
use dexbook_rs::models::{Asset, PositionPlan, TradingPair};
use dexbook_rs::encoder;
use rust_decimal::Decimal;

const DEFAULT_INDEXER_URL: &str = "http://localhost:8080";
const DEFAULT_CATALOG_FILE: &str = "assets.json";
const DEFAULT_MAX_HOPS: u32 = 3;
const DEFAULT_DEPTH: usize = 20;

fn print_usage(bin: &str) {
    eprintln!("Usage:");
    eprintln!("  {} book <BASE> <QUOTE> [options]", bin);
    eprintln!(
        "  {} encode <BASE> <QUOTE> <price> <fee_bps> <base_reserves> <quote_reserves> [--close-on-fill]",
        bin
    );
    eprintln!();
    eprintln!("  book    → print the aggregated order book as JSON");
    eprintln!("  encode  → encode a liquidity position plan and print it");
    eprintln!();
    eprintln!("  Options:");
    eprintln!("    --indexer <url>   indexer base URL (default {})", DEFAULT_INDEXER_URL);
    eprintln!("    --catalog <file>  asset catalog JSON (default {})", DEFAULT_CATALOG_FILE);
    eprintln!("    --hops <n>        maximum routed hop counts (default {})", DEFAULT_MAX_HOPS);
    eprintln!("    --depth <n>       levels kept per book side (default {})", DEFAULT_DEPTH);
    eprintln!();
    eprintln!("  Example:");
    eprintln!("    {} book PEN USDY --hops 2 --depth 10", bin);
}

struct CliArgs {
    positional: Vec<String>,
    indexer_url: String,
    catalog_file: String,
    max_hops: u32,
    depth: usize,
    close_on_fill: bool,
}

fn parse_args(raw_args: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs {
        positional: Vec::new(),
        indexer_url: DEFAULT_INDEXER_URL.to_string(),
        catalog_file: DEFAULT_CATALOG_FILE.to_string(),
        max_hops: DEFAULT_MAX_HOPS,
        depth: DEFAULT_DEPTH,
        close_on_fill: false,
    };

    let mut i = 1;
    while i < raw_args.len() {
        match raw_args[i].as_str() {
            "--indexer" => {
                i += 1;
                args.indexer_url = flag_value(raw_args, i, "--indexer")?;
            }
            "--catalog" => {
                i += 1;
                args.catalog_file = flag_value(raw_args, i, "--catalog")?;
            }
            "--hops" => {
                i += 1;
                args.max_hops = flag_value(raw_args, i, "--hops")?
                    .parse()
                    .map_err(|_| "--hops requires a positive integer".to_string())?;
            }
            "--depth" => {
                i += 1;
                args.depth = flag_value(raw_args, i, "--depth")?
                    .parse()
                    .map_err(|_| "--depth requires a positive integer".to_string())?;
            }
            "--close-on-fill" => args.close_on_fill = true,
            other => args.positional.push(other.to_string()),
        }
        i += 1;
    }

    Ok(args)
}

fn flag_value(raw_args: &[String], i: usize, flag: &str) -> Result<String, String> {
    raw_args
        .get(i)
        .cloned()
        .ok_or_else(|| format!("{} requires a value", flag))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let raw_args: Vec<String> = std::env::args().collect();
    let args = match parse_args(&raw_args) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{}", e);
            print_usage(&raw_args[0]);
            std::process::exit(1);
        }
    };

    match args.positional.first().map(String::as_str) {
        Some("book") if args.positional.len() == 3 => run_book(&args).await?,
        Some("encode") if args.positional.len() == 7 => run_encode(&args).await?,
        _ => {
            print_usage(&raw_args[0]);
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn run_book(args: &CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = StaticCatalog::load(&args.catalog_file)?;
    let base = resolve(&catalog, &args.positional[1]).await?;
    let quote = resolve(&catalog, &args.positional[2]).await?;

    let pair = TradingPair::new(base.id, quote.id);
    let api = Arc::new(IndexerApi::new(&args.indexer_url));

    eprintln!("Querying book for {} across {} hop counts...", pair, args.max_hops);
    let book = indexer::fetch_book(api, &pair, args.max_hops, args.depth).await;
    eprintln!(
        "Got {} ask(s), {} bid(s).",
        book.asks.len(),
        book.bids.len()
    );

    println!("{}", serde_json::to_string_pretty(&book)?);
    Ok(())
}

async fn run_encode(args: &CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = StaticCatalog::load(&args.catalog_file)?;
    let base = resolve(&catalog, &args.positional[1]).await?;
    let quote = resolve(&catalog, &args.positional[2]).await?;

    let mut plan = PositionPlan::new(
        base,
        quote,
        Decimal::from_str(&args.positional[3])?,
        args.positional[4].parse()?,
    );
    plan.base_reserves = Decimal::from_str(&args.positional[5])?;
    plan.quote_reserves = Decimal::from_str(&args.positional[6])?;
    plan.close_on_fill = args.close_on_fill;

    let position = encoder::encode_position(&plan)?;
    println!("{}", serde_json::to_string_pretty(&position)?);
    Ok(())
}

async fn resolve(
    catalog: &StaticCatalog,
    symbol: &str,
) -> Result<Asset, Box<dyn std::error::Error>> {
    Ok(catalog.require(symbol).await?)
}
