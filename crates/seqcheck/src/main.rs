#![forbid(unsafe_code)]

use clap::Parser;
use seqcheck::logging::DEFAULT_FILTER;

fn main() {
    let cli = seqcheck::Cli::parse();
    let json = cli.json;
    seqcheck::logging::init(if cli.quiet { "warn" } else { DEFAULT_FILTER });
    if let Err(error) = seqcheck::run(cli) {
        if json {
            eprintln!(
                "{}",
                serde_json::json!({
                    "status": "error",
                    "error": error.to_string(),
                    "exit_code": error.exit_code(),
                })
            );
        } else {
            eprintln!("{error}");
        }
        std::process::exit(error.exit_code());
    }
}
