use derive_more::Display;
use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

// What a title turns into when nothing of it survives
// slugification (emoji-only titles are a thing):
pub const SLUG_FALLBACK: &'static str = "post";
// The slug column is not limitless:
pub const MAX_SLUG_LENGTH: usize = 200;
// Uniqueness lookups stop after that many candidates. If we
// ever get there something is deeply wrong with the lookup.
pub const MAX_SLUG_ATTEMPTS: u32 = 10_000;

// The lookup closure talks to the database but this module
// shouldn't know about that, so it gets its own error type
// with a variant to wrap whatever the lookup reports.
#[derive(Debug, Display)]
pub enum SlugError {
  #[display(fmt = "No unique slug found after 10000 attempts")]
  Exhausted,
  #[display(fmt = "Slug lookup failed - {}", _0)]
  Lookup(String)
}

impl std::error::Error for SlugError {}

/**
 * Turn any human title into a URL-safe token: ASCII lowercase
 * letters, digits and single hyphens only.
 */
pub fn slugify(text: &str) -> String {
  lazy_static! {
    // Everything that is not going to survive, checked after
    // lowercasing. Whitespace stays for now, it becomes the
    // hyphens later:
    static ref INVALID_CHARS: Regex = Regex::new(r"[^a-z0-9\s-]").unwrap();
    // Underscores are already gone at this point but keeping
    // them in the class costs nothing:
    static ref SEPARATORS: Regex = Regex::new(r"[\s_-]+").unwrap();
  }

  // NFD splits accented letters into their base letter plus
  // combining marks. We keep the base letters and drop the
  // marks, which is how "Olá" ends up as "ola".
  let decomposed: String = text
    .nfd()
    .filter(|c| !is_combining_mark(*c))
    .collect();
  let lowered = decomposed.to_lowercase();
  let cleaned = INVALID_CHARS.replace_all(&lowered, "");
  let hyphened = SEPARATORS.replace_all(cleaned.trim(), "-");
  let slug = hyphened.trim_matches('-');

  if slug.is_empty() {
    return String::from(SLUG_FALLBACK);
  }
  if slug.len() > MAX_SLUG_LENGTH {
    // Only ASCII remains here so byte indexing can't panic:
    return slug[..MAX_SLUG_LENGTH]
      .trim_end_matches('-')
      .to_string();
  }
  slug.to_string()
}

/**
 * Disambiguate a candidate slug against whatever collection the
 * lookup closure checks. The closure answers "is this slug
 * taken", already excluding the record being saved when that
 * applies (updates).
 *
 * Note the check-then-insert sequence is racy with concurrent
 * writers. The UNIQUE constraint on the slug columns is the
 * actual backstop, this just produces friendly suffixes.
 */
pub fn unique_slug<F>(base: &str, mut taken: F) -> Result<String, SlugError>
where
  F: FnMut(&str) -> Result<bool, SlugError>
{
  let mut candidate = base.to_string();
  let mut counter: u32 = 0;
  while taken(&candidate)? {
    counter += 1;
    if counter > MAX_SLUG_ATTEMPTS {
      return Err(SlugError::Exhausted);
    }
    candidate = format!("{}-{}", base, counter);
  }
  Ok(candidate)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  #[test]
  fn accented_title_becomes_ascii_slug() {
    assert_eq!("ola-mundo-2025", slugify("Olá, Mundo! 2025"));
  }

  #[test]
  fn punctuation_and_case_are_normalized() {
    assert_eq!("hello-world-2024", slugify("Hello, World! (2024)"));
    assert_eq!("deja-vu", slugify("Déjà  --  Vu"));
  }

  #[test]
  fn symbol_only_input_gives_the_fallback() {
    assert_eq!(SLUG_FALLBACK, slugify("!!! ???"));
    assert_eq!(SLUG_FALLBACK, slugify("🚀🔥"));
    assert_eq!(SLUG_FALLBACK, slugify(""));
  }

  #[test]
  fn slugify_is_idempotent_on_clean_slugs() {
    let once = slugify("Um Título Bem Comprido");
    assert_eq!(once, slugify(&once));
  }

  #[test]
  fn hyphen_runs_collapse_and_edges_trim() {
    assert_eq!("spaced", slugify("  --spaced-- "));
    assert_eq!("a-b", slugify("a---b"));
    assert_eq!("a-b", slugify("a _ b"));
  }

  #[test]
  fn very_long_titles_are_capped() {
    let long = "palavra ".repeat(100);
    let slug = slugify(&long);
    assert!(slug.len() <= MAX_SLUG_LENGTH);
    assert!(!slug.ends_with('-'));
  }

  #[test]
  fn unique_slug_returns_base_when_free() {
    let existing: HashSet<&str> = HashSet::new();
    let slug = unique_slug(
      "hello-world",
      |s| Ok(existing.contains(s))
    ).unwrap();
    assert_eq!("hello-world", slug);
  }

  #[test]
  fn unique_slug_skips_taken_suffixes() {
    let existing: HashSet<&str> =
      ["hello-world", "hello-world-1"].iter().cloned().collect();
    let slug = unique_slug(
      "hello-world",
      |s| Ok(existing.contains(s))
    ).unwrap();
    assert_eq!("hello-world-2", slug);
  }

  #[test]
  fn unique_slug_gives_up_eventually() {
    let result = unique_slug("post", |_| Ok(true));
    match result {
      Err(SlugError::Exhausted) => (),
      other => panic!("Expected exhaustion, got {:?}", other)
    }
  }

  #[test]
  fn unique_slug_propagates_lookup_errors() {
    let result = unique_slug(
      "post",
      |_| Err(SlugError::Lookup("no database".to_string()))
    );
    match result {
      Err(SlugError::Lookup(msg)) => assert_eq!("no database", msg),
      other => panic!("Expected a lookup error, got {:?}", other)
    }
  }
}
