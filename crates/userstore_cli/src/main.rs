//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `userstore_core` linkage and, given a config, that the configured
//!   database opens and can be read.
//!
//! Usage: `userstore_cli [config.json]`

use std::process::ExitCode;
use userstore_core::{
    core_version, DefaultUserValidator, NoopModificationLog, SqliteUserRepository,
    UserRepository, UserStoreConfig,
};

fn main() -> ExitCode {
    println!("userstore_core version={}", core_version());

    let Some(config_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match report(&config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn report(config_path: &str) -> Result<(), String> {
    let config = UserStoreConfig::load(config_path).map_err(|err| err.to_string())?;
    let logging = config.init_logging()?;
    let conn = config.open_db().map_err(|err| err.to_string())?;

    let validator =
        DefaultUserValidator::new(config.prohibited_word_list(), config.trusted_domain_list());
    let repo = SqliteUserRepository::new(&conn, validator, NoopModificationLog);
    let users = repo.get_all().map_err(|err| err.to_string())?;
    let active = users.iter().filter(|user| user.is_active()).count();

    println!("logging={}", if logging { "on" } else { "off" });
    println!("users={} active={}", users.len(), active);
    Ok(())
}
