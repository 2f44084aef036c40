use clap::Parser;
use datetidy::cli::{Cli, run_cli};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run_cli(cli) {
        datetidy::output::error(&e);
        std::process::exit(1);
    }
}
