use html2text::from_read;

// Listings want summaries that fit on a card, not essays:
pub const SUMMARY_MAX_LENGTH: usize = 300;

// String::truncate panics when the cut lands in the middle of
// a multibyte char, so count actual chars instead.
pub fn truncate_utf8(value: &mut String, max_chars: usize) {
  if value.chars().count() > max_chars {
    *value = value.chars().take(max_chars).collect();
  }
}

pub fn strip_html(html: &str) -> String {
  from_read(html.as_bytes(), 70)
}

/**
 * Fallback summary for posts where the editor didn't write one:
 * strip the markup, flatten the line-wrapping html2text does,
 * and cut at a sane length.
 */
pub fn derive_summary(content: &str) -> String {
  let stripped = strip_html(content);
  let mut summary = stripped
    .split_whitespace()
    .collect::<Vec<&str>>()
    .join(" ");
  if summary.chars().count() > SUMMARY_MAX_LENGTH {
    truncate_utf8(&mut summary, SUMMARY_MAX_LENGTH);
    summary.push_str("...");
  }
  summary
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn truncate_utf8_is_multibyte_safe() {
    let mut sut = String::from("café da manhã");
    truncate_utf8(&mut sut, 4);
    assert_eq!("café", sut);
  }

  #[test]
  fn truncate_utf8_leaves_short_strings_alone() {
    let mut sut = String::from("short");
    truncate_utf8(&mut sut, 100);
    assert_eq!("short", sut);
  }

  #[test]
  fn derive_summary_strips_markup() {
    let summary = derive_summary(
      "<p>Primeiro parágrafo.</p><p>Segundo <b>parágrafo</b>.</p>"
    );
    assert!(summary.contains("Primeiro parágrafo."));
    assert!(summary.contains("Segundo"));
    assert!(!summary.contains('<'));
  }

  #[test]
  fn derive_summary_truncates_long_content() {
    let content = format!("<p>{}</p>", "ções ".repeat(200));
    let summary = derive_summary(&content);
    assert!(summary.ends_with("..."));
    // The "..." comes on top of the cap:
    assert_eq!(SUMMARY_MAX_LENGTH + 3, summary.chars().count());
  }
}
