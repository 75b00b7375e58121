//! CLI smoke entry point.
//!
//! Usage: `lead_data_cli [DB_PATH] [EMAIL]`
//!
//! Opens the lead database (in-memory when no path is given), prints the
//! core and schema versions, and resolves `EMAIL` to a user id when given.

use lead_data_core::db::schema::schema_version;
use lead_data_core::{LeadDataConfig, LeadDataProvider, SqliteLeadRepository};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run(std::env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("lead_data_cli error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), Box<dyn Error>> {
    let mut args = args.into_iter();
    let config = LeadDataConfig {
        db_path: args.next().map(PathBuf::from),
        ..LeadDataConfig::default()
    };

    println!("lead_data_core version={}", lead_data_core::core_version());
    let conn = config.open()?;
    println!("lead_data_core schema_version={}", schema_version(&conn)?);

    if let Some(email) = args.next() {
        let provider = LeadDataProvider::new(SqliteLeadRepository::try_new(&conn)?);
        match provider.get_user_id_from_email(&email)? {
            Some(user_id) => println!("user_id={user_id}"),
            None => println!("user_id=<not found>"),
        }
    }

    Ok(())
}
