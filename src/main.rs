//! linksift - sift URL lists against pattern wordlists
//!
//! Main entry point for the command-line application.

use clap::Parser;
use std::path::Path;
use std::process;

use linksift::cli::Args;
use linksift::output::FileSink;
use linksift::processor::{Processor, ProcessorConfig};
use linksift::progress::{
    print_banner, print_error, print_header, print_info, print_success, print_summary,
};

fn main() {
    let args = Args::parse();

    // Set up logging
    if args.verbose {
        std::env::set_var("RUST_LOG", "debug");
    } else if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "warn");
    }
    env_logger::init();

    if let Err(e) = run(args) {
        print_error(&format!("{}", e));

        // Print chain of errors
        let mut source = e.source();
        while let Some(err) = source {
            print_error(&format!("  Caused by: {}", err));
            source = err.source();
        }

        process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    if !args.quiet {
        print_banner();
    }

    let config = ProcessorConfig::from_args(&args);
    let processor = Processor::new(config)?;

    let wordlist = args.wordlist_path();
    let input = args.input_path();
    let output = args.output_path();

    let loaded = processor.load_patterns(&wordlist)?;
    let urls = processor.load_urls(&input)?;

    // Opened before dispatch so an unwritable destination fails the run early
    let sink = FileSink::open(&output)?;

    if args.verbose {
        print_config(&config, &input, &wordlist, &output);
        print_info(&format!(
            "Total URLs/Patterns ({}/{})",
            urls.len(),
            loaded.patterns.len()
        ));
        if loaded.duplicates > 0 {
            print_info(&format!("Duplicate patterns dropped: {}", loaded.duplicates));
        }
        eprintln!();
    }

    let summary = processor.run(&urls, &loaded.patterns, &sink)?;

    if !args.quiet {
        print_summary(&summary, sink.path());
        let written = sink.lines_written();
        if written > 0 {
            print_success(&format!("{} matches appended to {:?}", written, sink.path()));
        }
    }

    Ok(())
}

/// Print configuration summary
fn print_config(config: &ProcessorConfig, input: &Path, wordlist: &Path, output: &Path) {
    print_header("Configuration");

    print_info(&format!("Input:        {:?}", input));
    print_info(&format!("Wordlist:     {:?}", wordlist));
    print_info(&format!("Output:       {:?}", output));
    print_info(&format!("Scan target:  {}", config.scan_mode));
    print_info(&format!("Match mode:   {}", config.match_mode));
    print_info(&format!("Case:         {:?}", config.case_policy));
    print_info(&format!(
        "Concurrency:  {} (of {} CPU cores)",
        config.concurrency,
        num_cpus::get()
    ));
}
