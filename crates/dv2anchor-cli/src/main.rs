//! dv2anchor CLI - Convert Data Vault draw.io diagrams into Anchor model diagrams

mod cli;
mod report;

use clap::Parser;

fn main() {
    let cli_args = cli::Cli::parse();
    let color = report::should_colorize(cli_args.color);

    let app = cli::Dv2AnchorApp::new();

    if let Err(e) = app.run(cli_args) {
        eprintln!("{}", report::format_error(&e, color));
        std::process::exit(1);
    }
}
