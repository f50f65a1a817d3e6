use clap::Parser;
use sensor_combiner::cli::{self, Args};
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        let shutdown_signal = async {
            if tokio::signal::ctrl_c().await.is_err() {
                // No handler available; let the command run to completion
                std::future::pending::<()>().await;
            }
        };

        cli::run_until(args, shutdown_signal).await
    });

    match result {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Sensor Combiner - Hourly Environmental Sensor Table");
    println!("===================================================");
    println!();
    println!("Fetch the Bancroft mown-plot station export, solar radiation,");
    println!("precipitation and treatment-plot readings, align them on an hourly");
    println!("timeline and produce a single combined CSV.");
    println!();
    println!("USAGE:");
    println!("    sensor-combiner <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    export      Write the combined CSV to a file or stdout");
    println!("    serve       Serve the download page and combined CSV over HTTP");
    println!("    datasets    Show the dataset sources a run would read");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Increase logging verbosity");
    println!("    -q, --quiet      Only show errors");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Combine the published datasets into combined_data.csv:");
    println!("    sensor-combiner export");
    println!();
    println!("    # Use a local copy of the precipitation data and print to stdout:");
    println!("    sensor-combiner export --precip ./precip.csv --stdout");
    println!();
    println!("    # Serve the download page on port 8050:");
    println!("    sensor-combiner serve --port 8050");
    println!();
    println!("For detailed help on any command, use:");
    println!("    sensor-combiner <COMMAND> --help");
}
