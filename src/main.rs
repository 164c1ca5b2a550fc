// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Turn them into a validated MirrorConfig
// 3. Mirror cores/arduino/ and variants/<VARIANT>/ into the destination
// 4. Print what was downloaded
// 5. Exit with proper code (0 = all downloaded, 1 = aborted part way, 2 = error)
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli;           // src/cli.rs - command-line parsing
mod config;        // src/config.rs - validated configuration
mod fetch;         // src/fetch/ - HTTP fetching
mod listing;       // src/listing/ - directory listing parsing
mod logging;       // src/logging.rs - tracing setup
mod mirror;        // src/mirror/ - the download pipeline

use anyhow::{Context, Result};
use clap::Parser;

use cli::Cli;
use config::MirrorConfig;
use fetch::HttpFetcher;
use listing::SelectorListingParser;
use mirror::DownloadResult;

#[tokio::main]
async fn main() {
    logging::init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = every listed file was downloaded
//   Ok(1) = the mirror stopped at a failure (earlier files are kept)
//   Err   = bad configuration or setup failure
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let json = cli.json;

    let config = MirrorConfig::from_cli(&cli).context("invalid configuration")?;
    let parser = SelectorListingParser::new(&config.selector)?;
    let fetcher = HttpFetcher::new(config.timeout).context("failed to build HTTP client")?;

    if !json {
        println!("📦 Mirroring {} and {}", config.core_path, config.variant_path);
        println!("   from {}", config.raw_base_url);
        println!("   into {}\n", std::path::Path::new(&config.dest_dir).display());
    }

    match mirror::mirror(&fetcher, &parser, &config).await {
        Ok(results) => {
            print_results(&results, json)?;
            Ok(0)
        }
        Err(failure) => {
            print_results(&failure.results, json)?;
            eprintln!("❌ {}: {}", failure, failure.error);
            Ok(1)
        }
    }
}

// Prints the results either as a table or JSON
fn print_results(results: &[DownloadResult], json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(results)?;
        println!("{}", json_output);
    } else {
        print_table(results);
    }
    Ok(())
}

fn print_table(results: &[DownloadResult]) {
    println!("{:<30} {:<12} {:<40}", "FILE", "STATUS", "LOCAL PATH");
    println!("{}", "=".repeat(82));

    for result in results {
        let status = if result.success { "✅ OK" } else { "❌ FAILED" };
        println!(
            "{:<30} {:<12} {:<40}",
            result.entry.name,
            status,
            result.local_path.display()
        );
    }

    println!();

    let ok_count = results.iter().filter(|r| r.success).count();

    println!("📊 Summary:");
    println!("   ✅ Downloaded: {}", ok_count);
    println!("   ❌ Failed: {}", results.len() - ok_count);
}
