use actix_cors::Cors;
use actix_identity::{CookieIdentityPolicy, IdentityService};
use actix_web::{middleware, web, App, HttpServer};
use r2d2_sqlite::{self, SqliteConnectionManager};
use color_eyre::Result;
use eyre::{eyre, WrapErr};
use handlebars::Handlebars;
use log::{debug, warn};
use uploads::UploadService;
// I think we have to add crate here because
// of the other crate named "config" that we
// use as a dependency.
use crate::config::{Config, SiteInfo};
use crate::db::{self, Pool};
use crate::db::entities::User;
use crate::security;
use crate::utils::time_utils;
mod admin;
mod auth_handlers;
mod dtos;
mod error;
mod handlers;
mod helpers;
mod posts;
mod uploads;

// Declare app state struct. Everything request handlers need
// is in here and passed around explicitly, no module-level
// globals:
pub struct AppState {
  pub pool: Pool,
  pub uploads: UploadService,
  pub site_info: SiteInfo
}

// Function to start the server.
// Has to be async because there should be a .await at the end.
pub async fn run() -> Result<()> {
  let config = Config::from_env()
    .expect("Configuration (environment or .env file) is missing");
  debug!("Current config: {:?}", config);
  if config.session_key.len() < 32 {
    return Err(eyre!("SESSION_KEY needs to be at least 32 bytes long"));
  }

  let manager = SqliteConnectionManager::file(&config.db_path);
  let pool = Pool::new(manager)
    .expect("Database connection failed");

  // Make sure the schema exists, then the admin account. On
  // an already-populated database both are no-ops:
  db::initialize(&pool)?;
  seed_admin(&pool, &config)?;

  // Crash immediately if the uploads directory is not
  // writable, no point serving an admin that can't save
  // images:
  let uploads = UploadService::open(&config.uploads_path, &config.uploads_url)
    .expect("Fatal: uploads directory is missing or not writable");

  // Declare the template system, currently using
  // handlebars. Only the sitemap and robots documents live
  // there:
  let mut handlebars = Handlebars::new();
  handlebars
    .register_templates_directory(".xhtml", &config.template_dir)
    .expect("Fatal: templates directory might be missing or \
      not accessible");
  let handlebars_ref = web::Data::new(handlebars);

  // Got to save these for later because we'll be destroying
  // "config" by moving it into app_state as another struct
  // called SiteInfo.
  let bind_address = config.bind_address.clone();
  let session_key = config.session_key.clone();
  let cors_origin = config.cors_origin.clone();

  let app_state = web::Data::new(
    AppState {
      pool,
      uploads,
      site_info: config.into()
    }
  );

  HttpServer::new(move|| {
    // Cors isn't Clone so each worker builds its own:
    let cors = if cors_origin.is_empty() {
      Cors::permissive()
    } else {
      Cors::default()
        .allowed_origin(&cors_origin)
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
    };
    App::new()
      .app_data(app_state.clone())
      .app_data(handlebars_ref.clone())
      .app_data(web::PathConfig::default().error_handler(|_, _| {
        // No idea how this works but it does:
        actix_web::error::ErrorBadRequest("Invalid path arguments")
      }))
      .app_data(web::QueryConfig::default().error_handler(|_, _| {
        actix_web::error::ErrorBadRequest("Invalid query string arguments")
      }))
      .app_data(web::JsonConfig::default().error_handler(|_, _| {
        actix_web::error::ErrorBadRequest("Invalid JSON body")
      }))
      .wrap(middleware::Logger::default())
      .wrap(cors)
      .wrap(IdentityService::new(
        CookieIdentityPolicy::new(session_key.as_bytes())
          .name("mm_session")
          .secure(false)
      ))
      .configure(base_endpoints_config)
      .default_service(web::route().to(handlers::not_found))
  })
  .bind(bind_address)?
  .run()
  .await
  .context("Start Actix web server")

}

// First boot on an empty users table creates the configured
// admin account. Same thing the CLI binary does, minus the
// flags.
fn seed_admin(pool: &Pool, config: &Config) -> Result<()> {
  if db::user_count(pool)? > 0 {
    return Ok(());
  }
  let pw_hash = security::hash_password(&config.admin_password)?;
  let mut user = User {
    id: -1,
    username: config.admin_username.clone(),
    email: None,
    pw_hash,
    created_at: time_utils::current_timestamp()
  };
  db::insert_user(pool, &mut user)?;
  warn!(
    "Seeded admin user \"{}\" with the configured password - \
    change it if that was a default",
    user.username
  );
  Ok(())
}

// Route configuration:
fn base_endpoints_config(cfg: &mut web::ServiceConfig) {
  cfg.route("/", web::get().to(handlers::index))
    .route("/blog", web::get().to(handlers::blog))
    .route("/blog/{slug}", web::get().to(handlers::post_detail))
    .route("/blog/{slug}/like", web::post().to(handlers::like_post))
    .route("/categories", web::get().to(handlers::categories))
    .route("/sitemap.xml", web::get().to(handlers::sitemap))
    .route("/robots.txt", web::get().to(handlers::robots))
    .route("/auth/login", web::get().to(auth_handlers::session_status))
    .route("/auth/login", web::post().to(auth_handlers::login))
    .route("/auth/logout", web::get().to(auth_handlers::logout))
    .route("/admin", web::get().to(admin::dashboard))
    .route("/admin/novo", web::post().to(admin::new_post))
    .route("/admin/editar/{id}", web::get().to(admin::edit_form))
    .route("/admin/editar/{id}", web::post().to(admin::edit_post))
    .route("/admin/deletar/{id}", web::post().to(admin::delete_post))
    .route("/admin/upload", web::post().to(admin::upload));
}
