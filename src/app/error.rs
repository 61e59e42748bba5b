use actix_web::{
  error::ResponseError,
  HttpResponse
};
use derive_more::Display;
use eyre::Report;
use log::error;

// The full error output should only appear in logs, which is
// why the 500-family variants don't display their payload to
// random internet people.
#[derive(Debug, Display)]
pub enum Error {
  #[display(fmt = "Internal Server Error")]
  InternalServerError(String),
  #[display(fmt = "Database Error")]
  DatabaseError(String),
  #[display(fmt = "Authentication required")]
  Unauthorized,
  #[display(fmt = "Forbidden: {}", _0)]
  Forbidden(String),
  #[display(fmt = "Not Found: {}", _0)]
  NotFound(String),
  #[display(fmt = "Bad Request: {}", _0)]
  BadRequest(String)
}

// Plain text error responses because it's easy and the old
// site was doing it too. A nice TODO would be to use JSON
// instead.
impl ResponseError for Error {
  fn error_response(&self) -> HttpResponse {
    match self {
      Error::InternalServerError(_) | Error::DatabaseError(_) =>
        HttpResponse::InternalServerError().body(self.to_string()),
      Error::Unauthorized => HttpResponse::Unauthorized().body(self.to_string()),
      Error::Forbidden(_) => HttpResponse::Forbidden().body(self.to_string()),
      Error::NotFound(_) => HttpResponse::NotFound().body(self.to_string()),
      Error::BadRequest(_) => HttpResponse::BadRequest().body(self.to_string())
    }
  }
}

// The db module reports through eyre, handlers funnel those
// into the generic database variant with this:
pub fn map_db_error(e: Report<color_eyre::Handler>) -> Error {
  error!("Database error - {}", e);
  Error::DatabaseError(e.to_string())
}
