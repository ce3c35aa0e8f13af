use anyhow::Result;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use tracing::{error, info};

use gitpulse::app::App;
use gitpulse::cli::CliArgs;
use gitpulse::config::Config;
use gitpulse::error::AppError;
use gitpulse::{git, scan};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    info!("Starting gitpulse");

    let cli_args = CliArgs::parse();
    let config_path = cli_args.config.clone();
    let config = Config::from_cli_and_file(cli_args, config_path)?;

    if !config.base_dir.is_dir() {
        return Err(AppError::InvalidRoot {
            path: config.base_dir,
        }
        .into());
    }

    info!(
        root = %config.base_dir.display(),
        depth = config.scan_depth,
        "scanning for repositories"
    );
    let repo_paths = scan::find_repos(&config.base_dir, config.scan_depth);
    if repo_paths.is_empty() {
        return Err(AppError::NoRepositories {
            root: config.base_dir,
            depth: config.scan_depth,
        }
        .into());
    }

    // First snapshot happens before the terminal is taken over, so a slow
    // initial collection shows up as a startup pause rather than a blank
    // alternate screen.
    let repos = git::aggregate(&repo_paths, &config, false);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, repo_paths, repos);
    let res = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Application error: {}", err);
        println!("Error: {}", err);
    }

    info!("gitpulse shut down cleanly");
    Ok(())
}
