use actix_identity::Identity;
use actix_web::HttpRequest;
use lazy_static::lazy_static;
use regex::Regex;
use std::net::IpAddr;
use std::str::FromStr;
use super::error::Error;

// Every admin handler starts with this. There's a single
// seeded administrator and no role system, a valid session
// IS the authorization.
pub fn require_admin(id: &Identity) -> Result<String, Error> {
  id.identity().ok_or(Error::Unauthorized)
}

// It's technically possible to get no IP address from the
// Actix ConnectionInfo. Only used for logging failed logins
// so an Option is fine.
pub fn real_ip_addr(req: &HttpRequest) -> Option<IpAddr> {
  // The goal of the regex is to remove the port part
  // from the "IP address" that Actix gives us, which
  // may or may not have a port part.
  lazy_static! {
    static ref PORT_REGEX: Regex = Regex::new(
      r"(.+):\d+$"
    ).unwrap();
  }

  req.connection_info().realip_remote_addr()
    .map(|ip| {
      // Convert the result into an option:
      IpAddr::from_str(&PORT_REGEX.replace(ip, "$1"))
        .ok()
    })
    // We get an Option of an Option of IpAddr here, one
    // level has to go.
    .unwrap_or(None)
}
