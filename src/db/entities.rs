use serde::{Deserialize, Serialize};

// Ultra simple datatypes, which is something SQLite fits
// naturally into. The DTO layer turns these into what the
// API actually serves.

#[derive(Debug, Serialize, Deserialize)]
pub struct Post {
  pub id: i64,
  pub title: String,
  pub slug: String,
  // None in listing queries where we don't fetch the body:
  pub content: Option<String>,
  pub summary: String,
  pub cover_image: Option<String>,
  pub published: bool,
  pub created_at: i64,
  pub updated_at: i64,
  pub views: i64,
  pub likes: i64,
  // Loaded with a separate query:
  pub categories: Vec<Category>
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Category {
  pub id: i64,
  pub name: String,
  pub slug: String,
  pub description: Option<String>,
  pub color: String,
  pub icon: String,
  pub active: bool
}

// No Serialize on purpose, the password hash must never end
// up in a response body.
#[derive(Debug)]
pub struct User {
  pub id: i64,
  pub username: String,
  pub email: Option<String>,
  pub pw_hash: String,
  pub created_at: i64
}

// Aggregates for the admin dashboard, computed in a single
// query.
#[derive(Debug)]
pub struct PostStats {
  pub total_posts: i64,
  pub published_posts: i64,
  pub total_views: i64,
  pub this_week_posts: i64
}
