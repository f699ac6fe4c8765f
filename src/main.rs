use clap::{CommandFactory, Parser};
use mer_keeper::cli::{args::Args, commands};
use mer_keeper::config::MerConfig;
use mer_keeper::importer::release_extraction_dir;
use std::process;

fn main() {
    let args = Args::parse();

    // Without a subcommand, show help
    if args.command.is_none() {
        let _ = Args::command().print_help();
        println!();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        tokio::select! {
            result = commands::run(args) => result,
            signal = tokio::signal::ctrl_c() => {
                // Abandon every running session, once nothing reads extracted dumps
                eprintln!("\nReceived CTRL+C, shutting down...");
                let dir = MerConfig::default().extraction_dir;
                let _ = tokio::task::spawn_blocking(move || release_extraction_dir(&dir)).await;
                match signal {
                    Ok(()) => Err(anyhow::anyhow!("Interrupted by user")),
                    Err(e) => Err(anyhow::anyhow!("Failed to listen for CTRL+C: {}", e)),
                }
            }
        }
    });

    match result {
        Ok(_stats) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}
