//! Development data tool: loads tours from a JSON file or wipes them all.
//!
//! ```text
//! import-tours --import dev-data/tours-simple.json
//! import-tours --delete
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgGroup, Parser};
use dotenvy::dotenv;

use natours::db::{establish_connection_pool, run_migrations};
use natours::forms::tour::CreateTourForm;
use natours::models::config::ServerConfig;
use natours::repository::DieselRepository;
use natours::services::tours as tours_service;

/// `import-tours` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "import-tours",
    about = "Load development tours from a JSON file or delete every tour",
    version
)]
#[command(group(ArgGroup::new("mode").required(true).args(["import", "delete"])))]
struct CliArgs {
    /// JSON file holding an array of tour payloads.
    #[arg(long, value_name = "path")]
    import: Option<PathBuf>,
    /// Remove every stored tour.
    #[arg(long)]
    delete: bool,
}

fn read_forms(path: &Path) -> Result<Vec<CreateTourForm>, Box<dyn std::error::Error>> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn run(args: CliArgs, repo: &DieselRepository) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = args.import {
        let forms = read_forms(&path)?;
        let tours = tours_service::import_tours(repo, forms)?;
        log::info!("Data successfully loaded: {} tours", tours.len());
    } else if args.delete {
        let count = tours_service::delete_all_tours(repo)?;
        log::info!("Data successfully deleted: {count} tours");
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    dotenv().ok(); // Load .env file
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let server_config = match ServerConfig::load() {
        Ok(server_config) => server_config,
        Err(err) => {
            log::error!("Error loading server config: {err}");
            return ExitCode::FAILURE;
        }
    };

    let pool = match establish_connection_pool(&server_config.database_url) {
        Ok(pool) => pool,
        Err(err) => {
            log::error!("Failed to establish database connection: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = run_migrations(&pool) {
        log::error!("Failed to run migrations: {err}");
        return ExitCode::FAILURE;
    }
    let repo = DieselRepository::new(pool);

    match run(args, &repo) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("import-tours failed: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn import_takes_a_path() {
        let args = CliArgs::try_parse_from(["import-tours", "--import", "tours.json"]).unwrap();
        assert_eq!(args.import.as_deref(), Some(Path::new("tours.json")));
        assert!(!args.delete);

        assert!(CliArgs::try_parse_from(["import-tours", "--import"]).is_err());
    }

    #[test]
    fn exactly_one_mode_is_required() {
        let err = CliArgs::try_parse_from(["import-tours"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let err = CliArgs::try_parse_from(["import-tours", "--import", "tours.json", "--delete"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);

        let err = CliArgs::try_parse_from(["import-tours", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }
}
