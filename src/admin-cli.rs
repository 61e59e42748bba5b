#![allow(dead_code)]
mod config;
mod db;
mod security;
mod utils;

use std::env;
use color_eyre::Result;
use eyre::eyre;
use dotenv::dotenv;
use getopts::Options;
use log::info;
use r2d2_sqlite::{self, SqliteConnectionManager};
use crate::config::Config;
use crate::db::entities::User;
use crate::db::Pool;
use crate::utils::time_utils;

// Copy pasted this from getopts doc.
fn print_usage(program: &str, opts: Options) {
  let brief = format!("Usage: {} [options]", program);
  print!("{}", opts.usage(&brief));
}

/**
 * Maintenance binary: schema creation and admin accounts,
 * for setups where the server shouldn't be the one seeding
 * things.
 */
fn main() -> Result<()> {
  dotenv().ok();
  env_logger::init();

  let args: Vec<String> = env::args().collect();
  let program = args[0].clone();
  let mut opts = Options::new();
  opts.optflag("i", "init-db", "Create the database schema if it's missing");
  opts.optopt("c", "create-admin", "Create an admin user", "USERNAME");
  opts.optopt("p", "password", "Password for --create-admin", "PASSWORD");
  opts.optopt("e", "email", "Optional email for --create-admin", "EMAIL");
  opts.optflag("h", "help", "Program usage");
  let opt_matches = opts.parse(args)?;
  if opt_matches.opt_present("h") {
    print_usage(&program, opts);
    return Ok(());
  }

  let wants_init = opt_matches.opt_present("i");
  let admin_username = opt_matches.opt_str("c");
  if !wants_init && admin_username.is_none() {
    print_usage(&program, opts);
    return Ok(());
  }

  let config = Config::from_env()
    .expect("Configuration (environment or .env file) is missing");

  let manager = SqliteConnectionManager::file(&config.db_path);
  let pool = Pool::new(manager)
    .expect("Database connection failed");

  // Schema first, creating a user needs the tables anyway:
  db::initialize(&pool)?;
  if wants_init {
    info!("Database schema is in place at {}", config.db_path);
  }

  if let Some(username) = admin_username {
    let password = opt_matches.opt_str("p")
      .ok_or_else(|| eyre!("--create-admin requires --password"))?;
    if db::user_by_username(&pool, &username)?.is_some() {
      return Err(eyre!("User {} already exists", username));
    }
    let mut user = User {
      id: -1,
      username,
      email: opt_matches.opt_str("e"),
      // The plaintext stops existing right here:
      pw_hash: security::hash_password(&password)?,
      created_at: time_utils::current_timestamp()
    };
    db::insert_user(&pool, &mut user)?;
    info!("Created admin user {} with ID {}", user.username, user.id);
  }

  Ok(())
}
