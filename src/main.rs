use clap::Parser;
use fractal::cli::commands::Cli;
use fractal::cli::handlers;

fn main() {
    let cli = Cli::parse();

    // The TUI sets up its own file logging once the project is known
    if cli.command.is_some() {
        fractal::logging::init_stderr();
    }

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
