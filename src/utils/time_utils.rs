use chrono::{Local, TimeZone};

// chrono formatting reference:
// https://docs.rs/chrono/0.4.19/chrono/format/strftime/index.html
const DATE_FORMAT_STANDARD: &'static str = "%d/%m/%Y %k:%M:%S%:z";
// The sitemap wants plain dates:
const DATE_FORMAT_USCOMPACT: &'static str = "%Y-%m-%d";

pub enum DateFormat {
  Standard,
  USCompact,
}

pub fn timestamp_to_date_string(timestamp: i64, format: DateFormat) -> String {
  let d = Local.timestamp(timestamp, 0);
  let format_str = match format {
    DateFormat::Standard => DATE_FORMAT_STANDARD,
    DateFormat::USCompact => DATE_FORMAT_USCOMPACT,
  };
  d.format(format_str).to_string()
}

pub fn current_timestamp() -> i64 {
  Local::now().timestamp()
}

#[cfg(test)]
mod tests {
  use super::*;

  // These run in whatever timezone CI has, so no asserting
  // exact local times, only the shape of the output.

  #[test]
  fn standard_format_has_date_and_offset_parts() {
    let timestamp: i64 = 1615150740;
    let result = timestamp_to_date_string(timestamp, DateFormat::Standard);
    assert!(result.contains("/2021 "));
    assert!(result.contains(':'));
    assert!(result.contains('+') || result.contains('-'));
  }

  #[test]
  fn compact_format_is_a_plain_date() {
    let timestamp: i64 = 1615150740;
    let result = timestamp_to_date_string(timestamp, DateFormat::USCompact);
    assert_eq!(10, result.len());
    // March 7th 2021 UTC, give or take a timezone:
    assert!(result.starts_with("2021-03-0"));
  }
}
