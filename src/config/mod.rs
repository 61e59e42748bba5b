// Adding the context method to errors:
use eyre::WrapErr;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::convert::From;

#[derive(Debug, Deserialize)]
pub struct Config {
  pub db_path: String,
  pub bind_address: String,
  // Where uploaded files land on disk and the public URL
  // prefix they're served under (the front webserver serves
  // the actual bytes):
  pub uploads_path: String,
  pub uploads_url: String,
  pub template_dir: String,
  // Secret for the session cookie, 32 bytes minimum:
  pub session_key: String,
  pub cors_origin: String,
  // First-boot admin account, only used when the users table
  // is empty:
  pub admin_username: String,
  pub admin_password: String,
  // Used to generate the sitemap and absolute URLs:
  pub site_title: String,
  pub site_root: String,
  pub site_blog_root: String,
  pub site_description: String
}

// Looks redundant but I thought having another
// struct would be better than moving all of this
// info around the app_state, especially since
// there could be sensible info in the config.
#[derive(Serialize)]
pub struct SiteInfo {
  pub title: String,
  pub root: String,
  pub blog_root: String,
  pub description: String
}

// I'm using From so that transforming into
// SiteInfo supposedely drops all of the other
// info since a "move" is obligatory here.
impl From<Config> for SiteInfo {
  fn from(config: Config) -> Self {
    Self {
      title: config.site_title,
      root: config.site_root,
      blog_root: config.site_blog_root,
      description: config.site_description
    }
  }
}

impl Config {

  pub fn from_env() -> Result<Config> {
    let mut c = config::Config::new();
    // RUST_LOG is already set in main.rs if it
    // was absent.
    // Let's set other default values. You have
    // to use lowercase when compared to what's
    // in the .env file.
    c.set_default("bind_address", "127.0.0.1:8080")?;
    c.set_default("uploads_path", "./static/uploads")?;
    c.set_default("uploads_url", "/static/uploads")?;
    // Default template directory:
    c.set_default("template_dir", "./templates")?;
    // Obviously meant to be overridden in production. The 32
    // byte minimum is checked at startup:
    c.set_default("session_key", "dev-key-change-in-production-0123456789")?;
    // Empty means permissive CORS:
    c.set_default("cors_origin", "")?;
    // The account seeded on an empty users table. Yes the
    // password default is terrible, it's the historical one
    // and there's a loud warning in the logs until changed:
    c.set_default("admin_username", "admin")?;
    c.set_default("admin_password", "123456")?;
    // Default website URLs and OpenGraph etc.
    // config:
    c.set_default("site_title", "Mente Magna")?;
    // Should never have a trailing slash or THINGS WILL BREAK.
    c.set_default("site_root", "https://mentemagna.com")?;
    c.set_default("site_blog_root", "blog")?;
    c.set_default("site_description", "Blog sobre tecnologia, programação e ferramentas úteis.")?;

    c.merge(config::Environment::default())?;
    // The error has to be given a context for
    // color_eyre to work here:
    c.try_into()
      .context("Loading configuration from env")
  }

}
