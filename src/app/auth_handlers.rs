use actix_identity::Identity;
use actix_web::{web, HttpRequest, HttpResponse, Result};
use log::{info, warn};
use crate::db;
use crate::security;
use super::dtos::{JsonStatus, JsonStatusType, LoginForm, SessionDto};
use super::error::{map_db_error, Error};
use super::helpers;
use super::AppState;

// Session-cookie login. The form either matches a stored
// argon2 hash or it doesn't, and the response is the same
// 401 whether the username or the password was wrong.
pub async fn login(
  app_state: web::Data<AppState>,
  form: web::Form<LoginForm>,
  id: Identity,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  let user = db::user_by_username(&app_state.pool, form.username.trim())
    .map_err(map_db_error)?;
  match user {
    Some(user) if security::verify_password(&form.password, &user.pw_hash) => {
      info!("Successful login for {}", user.username);
      id.remember(user.username);
      Ok(
        HttpResponse::Ok().json(
          JsonStatus::new(JsonStatusType::Success, "Logged in")
        )
      )
    },
    _ => {
      warn!(
        "Failed login attempt for {} from {:?}",
        form.username,
        helpers::real_ip_addr(&req)
      );
      Err(Error::Unauthorized)
    }
  }
}

pub async fn logout(id: Identity) -> HttpResponse {
  id.forget();
  HttpResponse::Ok().json(
    JsonStatus::new(JsonStatusType::Success, "Logged out")
  )
}

// The GET side of /auth/login. A JSON API has no login page
// to render, the admin frontend just wants to know if the
// cookie is still good.
pub async fn session_status(id: Identity) -> HttpResponse {
  let username = id.identity();
  HttpResponse::Ok().json(
    SessionDto {
      authenticated: username.is_some(),
      username
    }
  )
}
