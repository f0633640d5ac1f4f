//! Café cart manager CLI

use std::{io, process::ExitCode};

use tracing::{debug, info};

use cafe_cart::{
    cart::CartStore,
    cli::Cli,
    logging,
    menu::{Menu, Reporting},
};

fn main() -> ExitCode {
    let cli = match Cli::load() {
        Ok(cli) => cli,
        Err(error) => {
            // --help and --version arrive as errors too
            let code = if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };

            _ = error.print();

            return code;
        }
    };

    if let Err(error) = logging::init_subscriber(&cli.logging) {
        report(&format!("Logging error: {error}"));
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report(&error);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let settings = cli
        .settings()
        .map_err(|error| format!("Configuration error: {error}"))?;

    info!(
        cafe = settings.name(),
        cart = %settings.files().cart().display(),
        "starting"
    );

    let store = CartStore::from_settings(&settings);
    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();

    let mut menu = Menu::new(store, settings, stdin, stdout);

    if cli.no_autoload {
        debug!("autoload disabled");
    } else {
        menu.load_saved(Reporting::Quiet)
            .map_err(|error| format!("failed to load saved cart: {error}"))?;
    }

    menu.run().map_err(|error| error.to_string())?;

    info!(items = menu.store().len(), "session ended");

    Ok(())
}

#[expect(
    clippy::print_stderr,
    reason = "errors before or outside the menu go straight to the terminal"
)]
fn report(message: &str) {
    eprintln!("{message}");
}
