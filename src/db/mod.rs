use rusqlite::{params, NO_PARAMS, OptionalExtension, Row, ToSql};
use eyre::WrapErr;
use color_eyre::Result;
pub mod entities;
mod mappers;
use entities::*;
use mappers::{map_category, map_post, map_user};
use crate::utils::time_utils;

// Type alias to make function signatures much clearer:
pub type Pool = r2d2::Pool<r2d2_sqlite::SqliteConnectionManager>;

/**
 * All the DB stuff is non-async, handlers just call into here
 * with the pool.
 */

// Single source of truth for the schema, ran at startup.
// CREATE TABLE IF NOT EXISTS means starting on an existing
// database file is a no-op.
const SCHEMA: &'static str = "
  CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    content TEXT NOT NULL,
    summary TEXT NOT NULL,
    cover_image TEXT,
    published INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    views INTEGER NOT NULL DEFAULT 0,
    likes INTEGER NOT NULL DEFAULT 0
  );
  CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    slug TEXT NOT NULL UNIQUE,
    description TEXT,
    color TEXT NOT NULL DEFAULT '#007bff',
    icon TEXT NOT NULL DEFAULT '📝',
    active INTEGER NOT NULL DEFAULT 1
  );
  CREATE TABLE IF NOT EXISTS post_categories (
    post_id INTEGER NOT NULL,
    category_id INTEGER NOT NULL,
    PRIMARY KEY (post_id, category_id),
    FOREIGN KEY (post_id) REFERENCES posts (id),
    FOREIGN KEY (category_id) REFERENCES categories (id)
  );
  CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT,
    pw_hash TEXT NOT NULL,
    created_at INTEGER NOT NULL
  );
";

// The categories the site always had, seeded when the table
// is created empty. More can be added straight in database.
const DEFAULT_CATEGORIES: [(&'static str, &'static str, &'static str, &'static str, &'static str); 4] = [
  ("Inteligência Artificial", "inteligencia-artificial",
    "Artigos sobre IA e Machine Learning", "#e74c3c", "🤖"),
  ("Programação", "programacao",
    "Tutoriais de programação e desenvolvimento", "#3498db", "💻"),
  ("Web Development", "web-development",
    "Desenvolvimento web e frameworks", "#2ecc71", "🌐"),
  ("Ferramentas", "ferramentas",
    "Ferramentas úteis e utilitários", "#f39c12", "🔧")
];

// Column lists for the post queries. Listings skip the body
// by selecting NULL in its place, which keeps a single row
// mapper for every post query.
const POST_FIELDS: &'static str =
  "id, title, slug, content, summary, cover_image, published, \
  created_at, updated_at, views, likes";
const POST_FIELDS_NO_CONTENT: &'static str =
  "id, title, slug, NULL, summary, cover_image, published, \
  created_at, updated_at, views, likes";

pub fn initialize(pool: &Pool) -> Result<()> {
  let conn = pool.clone().get()?;
  conn.execute_batch(SCHEMA)
    .context("Creating database schema")?;
  let count: i64 = conn.query_row(
    "SELECT count(*) FROM categories",
    NO_PARAMS,
    |row| row.get(0)
  )?;
  if count == 0 {
    for (name, slug, description, color, icon) in DEFAULT_CATEGORIES.iter() {
      conn.execute(
        "INSERT OR IGNORE INTO categories (name, slug, description, color, icon) \
        VALUES (?, ?, ?, ?, ?)",
        params![name, slug, description, color, icon]
      )?;
    }
  }
  Ok(())
}

// Stole most of the signature from the rustqlite doc.
// Careful to use a later version of the crate,
// Google takes you to old versions of the doc.
fn select_many<T, P, F>(
  pool: &Pool,
  query: &str,
  params: P,
  mapper: F
) -> Result<Vec<T>>
  where
    P: IntoIterator,
    P::Item: ToSql,
    F: FnMut(&Row<'_>) -> Result<T, rusqlite::Error>,
{
  // Do the reference counting thing and get a connection
  let conn = pool.clone().get()?;
  let mut stmt = conn.prepare(query)?;
  stmt.query_map(params, mapper)
    .and_then(Iterator::collect)
    .context("Generic select_many query")
}

/* --- Posts --- */

pub fn published_posts(
  pool: &Pool,
  start: usize,
  max: usize,
  category: Option<&str>
) -> Result<Vec<Post>> {
  let mut posts = match category {
    Some(category_slug) => select_many(
      pool,
      "SELECT p.id, p.title, p.slug, NULL, p.summary, p.cover_image, \
      p.published, p.created_at, p.updated_at, p.views, p.likes \
      FROM posts p \
      JOIN post_categories pc ON pc.post_id = p.id \
      JOIN categories c ON c.id = pc.category_id \
      WHERE p.published = 1 AND c.slug = ? \
      ORDER BY p.created_at DESC LIMIT ? OFFSET ?",
      params![category_slug, max as i64, start as i64],
      map_post
    )?,
    None => select_many(
      pool,
      &format!(
        "SELECT {} FROM posts WHERE published = 1 \
        ORDER BY created_at DESC LIMIT ? OFFSET ?",
        POST_FIELDS_NO_CONTENT
      ),
      params![max as i64, start as i64],
      map_post
    )?
  };
  attach_categories(pool, &mut posts)?;
  Ok(posts)
}

// Every published post, for the sitemap. No body, no
// categories, the sitemap doesn't use either.
pub fn all_published_posts(pool: &Pool) -> Result<Vec<Post>> {
  select_many(
    pool,
    &format!(
      "SELECT {} FROM posts WHERE published = 1 \
      ORDER BY created_at DESC",
      POST_FIELDS_NO_CONTENT
    ),
    NO_PARAMS,
    map_post
  )
}

// Drafts included, for the admin dashboard.
pub fn all_posts(pool: &Pool) -> Result<Vec<Post>> {
  let mut posts = select_many(
    pool,
    &format!(
      "SELECT {} FROM posts ORDER BY created_at DESC",
      POST_FIELDS_NO_CONTENT
    ),
    NO_PARAMS,
    map_post
  )?;
  attach_categories(pool, &mut posts)?;
  Ok(posts)
}

pub fn post_by_id(pool: &Pool, id: i64) -> Result<Option<Post>> {
  let conn = pool.clone().get()?;
  let post = conn.query_row(
    &format!("SELECT {} FROM posts WHERE id = ?", POST_FIELDS),
    params![id],
    map_post
  ).optional()?;
  with_categories(pool, post)
}

pub fn post_by_slug(
  pool: &Pool,
  slug: &str,
  published_only: bool
) -> Result<Option<Post>> {
  let conn = pool.clone().get()?;
  let query = if published_only {
    format!(
      "SELECT {} FROM posts WHERE slug = ? AND published = 1",
      POST_FIELDS
    )
  } else {
    format!("SELECT {} FROM posts WHERE slug = ?", POST_FIELDS)
  };
  let post = conn.query_row(
    &query,
    params![slug],
    map_post
  ).optional()?;
  with_categories(pool, post)
}

// Used by the slug resolver. The -1 default never matches a
// real row so a single query covers inserts and updates.
pub fn slug_in_use(
  pool: &Pool,
  slug: &str,
  exclude_id: Option<i64>
) -> Result<bool> {
  let conn = pool.clone().get()?;
  let exclude = exclude_id.unwrap_or(-1);
  let count: i64 = conn.query_row(
    "SELECT count(*) FROM posts WHERE slug = ? AND id != ?",
    params![slug, exclude],
    |row| row.get(0)
  )?;
  Ok(count > 0)
}

pub fn insert_post(pool: &Pool, post: &mut Post) -> Result<()> {
  let mut conn = pool.clone().get()?;
  let tx = conn.transaction()?;
  tx.execute(
    "INSERT INTO posts \
    (title, slug, content, summary, cover_image, published, \
    created_at, updated_at, views, likes) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, 0)",
    params![
      post.title,
      post.slug,
      post.content,
      post.summary,
      post.cover_image,
      post.published,
      post.created_at,
      post.updated_at
    ]
  )?;
  post.id = tx.last_insert_rowid();
  for category in &post.categories {
    tx.execute(
      "INSERT INTO post_categories (post_id, category_id) VALUES (?, ?)",
      params![post.id, category.id]
    )?;
  }
  tx.commit().context("Inserting a post")
}

pub fn update_post(pool: &Pool, post: &Post) -> Result<()> {
  let mut conn = pool.clone().get()?;
  let tx = conn.transaction()?;
  tx.execute(
    "UPDATE posts SET title = ?, slug = ?, content = ?, summary = ?, \
    cover_image = ?, published = ?, updated_at = ? WHERE id = ?",
    params![
      post.title,
      post.slug,
      post.content,
      post.summary,
      post.cover_image,
      post.published,
      post.updated_at,
      post.id
    ]
  )?;
  // Associations are replaced wholesale, the post always
  // carries its full category list:
  tx.execute(
    "DELETE FROM post_categories WHERE post_id = ?",
    params![post.id]
  )?;
  for category in &post.categories {
    tx.execute(
      "INSERT INTO post_categories (post_id, category_id) VALUES (?, ?)",
      params![post.id, category.id]
    )?;
  }
  tx.commit().context("Updating a post")
}

pub fn delete_post(pool: &Pool, id: i64) -> Result<bool> {
  let mut conn = pool.clone().get()?;
  let tx = conn.transaction()?;
  tx.execute(
    "DELETE FROM post_categories WHERE post_id = ?",
    params![id]
  )?;
  let deleted = tx.execute("DELETE FROM posts WHERE id = ?", params![id])?;
  tx.commit().context("Deleting a post")?;
  Ok(deleted > 0)
}

// The view counter moves on the read path, but through this
// explicit call, never hidden inside a fetch query.
pub fn record_view(pool: &Pool, id: i64) -> Result<()> {
  let conn = pool.clone().get()?;
  conn.execute(
    "UPDATE posts SET views = views + 1 WHERE id = ?",
    params![id]
  )?;
  Ok(())
}

pub fn record_like(pool: &Pool, id: i64) -> Result<i64> {
  let conn = pool.clone().get()?;
  conn.execute(
    "UPDATE posts SET likes = likes + 1 WHERE id = ?",
    params![id]
  )?;
  let likes: i64 = conn.query_row(
    "SELECT likes FROM posts WHERE id = ?",
    params![id],
    |row| row.get(0)
  )?;
  Ok(likes)
}

// The "you might also like" list on the post page.
pub fn recent_published_posts(
  pool: &Pool,
  exclude_id: i64,
  max: usize
) -> Result<Vec<Post>> {
  select_many(
    pool,
    &format!(
      "SELECT {} FROM posts WHERE published = 1 AND id != ? \
      ORDER BY created_at DESC LIMIT ?",
      POST_FIELDS_NO_CONTENT
    ),
    params![exclude_id, max as i64],
    map_post
  )
}

pub fn previous_published_post(
  pool: &Pool,
  created_at: i64
) -> Result<Option<Post>> {
  let conn = pool.clone().get()?;
  conn.query_row(
    &format!(
      "SELECT {} FROM posts WHERE published = 1 AND created_at < ? \
      ORDER BY created_at DESC LIMIT 1",
      POST_FIELDS_NO_CONTENT
    ),
    params![created_at],
    map_post
  ).optional().context("Fetching previous post")
}

pub fn next_published_post(
  pool: &Pool,
  created_at: i64
) -> Result<Option<Post>> {
  let conn = pool.clone().get()?;
  conn.query_row(
    &format!(
      "SELECT {} FROM posts WHERE published = 1 AND created_at > ? \
      ORDER BY created_at ASC LIMIT 1",
      POST_FIELDS_NO_CONTENT
    ),
    params![created_at],
    map_post
  ).optional().context("Fetching next post")
}

pub fn post_stats(pool: &Pool) -> Result<PostStats> {
  let conn = pool.clone().get()?;
  let week_ago = time_utils::current_timestamp() - 7 * 86400;
  let stats = conn.query_row(
    "SELECT count(*), \
    COALESCE(SUM(published), 0), \
    COALESCE(SUM(views), 0), \
    COALESCE(SUM(CASE WHEN created_at >= ? THEN 1 ELSE 0 END), 0) \
    FROM posts",
    params![week_ago],
    |row| Ok(PostStats {
      total_posts: row.get(0)?,
      published_posts: row.get(1)?,
      total_views: row.get(2)?,
      this_week_posts: row.get(3)?
    })
  )?;
  Ok(stats)
}

/* --- Categories --- */

pub fn all_categories(pool: &Pool, active_only: bool) -> Result<Vec<Category>> {
  let query = if active_only {
    "SELECT id, name, slug, description, color, icon, active \
    FROM categories WHERE active = 1 ORDER BY name ASC"
  } else {
    "SELECT id, name, slug, description, color, icon, active \
    FROM categories ORDER BY name ASC"
  };
  select_many(pool, query, NO_PARAMS, map_category)
}

pub fn category_by_id(pool: &Pool, id: i64) -> Result<Option<Category>> {
  let conn = pool.clone().get()?;
  conn.query_row(
    "SELECT id, name, slug, description, color, icon, active \
    FROM categories WHERE id = ?",
    params![id],
    map_category
  ).optional().context("Fetching category by id")
}

pub fn categories_for_post(pool: &Pool, post_id: i64) -> Result<Vec<Category>> {
  select_many(
    pool,
    "SELECT categories.id, categories.name, categories.slug, \
    categories.description, categories.color, categories.icon, \
    categories.active \
    FROM post_categories, categories WHERE \
    post_categories.post_id = ? \
    AND post_categories.category_id = categories.id",
    params![post_id],
    map_category
  )
}

fn attach_categories(pool: &Pool, posts: &mut Vec<Post>) -> Result<()> {
  for post in posts.iter_mut() {
    post.categories = categories_for_post(pool, post.id)?;
  }
  Ok(())
}

fn with_categories(pool: &Pool, post: Option<Post>) -> Result<Option<Post>> {
  match post {
    Some(mut post) => {
      post.categories = categories_for_post(pool, post.id)?;
      Ok(Some(post))
    },
    None => Ok(None)
  }
}

/* --- Users --- */

pub fn user_by_username(pool: &Pool, username: &str) -> Result<Option<User>> {
  let conn = pool.clone().get()?;
  conn.query_row(
    "SELECT id, username, email, pw_hash, created_at \
    FROM users WHERE username = ?",
    params![username],
    map_user
  ).optional().context("Fetching user by username")
}

pub fn user_count(pool: &Pool) -> Result<i64> {
  let conn = pool.clone().get()?;
  let count: i64 = conn.query_row(
    "SELECT count(*) FROM users",
    NO_PARAMS,
    |row| row.get(0)
  )?;
  Ok(count)
}

pub fn insert_user(pool: &Pool, user: &mut User) -> Result<()> {
  let conn = pool.clone().get()?;
  conn.execute(
    "INSERT INTO users (username, email, pw_hash, created_at) \
    VALUES (?, ?, ?, ?)",
    params![user.username, user.email, user.pw_hash, user.created_at]
  )?;
  user.id = conn.last_insert_rowid();
  Ok(())
}

#[cfg(test)]
pub mod test_helpers {
  use super::*;

  // A pool of several connections would give each of them its
  // own empty :memory: database, hence the max_size of 1.
  pub fn memory_pool() -> Pool {
    let manager = r2d2_sqlite::SqliteConnectionManager::memory();
    let pool = Pool::builder()
      .max_size(1)
      .build(manager)
      .unwrap();
    initialize(&pool).unwrap();
    pool
  }

  pub fn sample_post(title: &str, slug: &str, published: bool) -> Post {
    Post {
      id: -1,
      title: title.to_string(),
      slug: slug.to_string(),
      content: Some("<p>Conteúdo de teste.</p>".to_string()),
      summary: "Conteúdo de teste.".to_string(),
      cover_image: None,
      published,
      created_at: 1700000000,
      updated_at: 1700000000,
      views: 0,
      likes: 0,
      categories: Vec::new()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use super::test_helpers::*;

  #[test]
  fn schema_seeds_default_categories() {
    let pool = memory_pool();
    let categories = all_categories(&pool, true).unwrap();
    assert_eq!(4, categories.len());
    // Ordered by name:
    assert_eq!("ferramentas", categories[0].slug);
  }

  #[test]
  fn insert_then_fetch_by_slug() {
    let pool = memory_pool();
    let mut post = sample_post("Primeiro Post", "primeiro-post", true);
    insert_post(&pool, &mut post).unwrap();
    assert!(post.id > 0);
    let found = post_by_slug(&pool, "primeiro-post", true)
      .unwrap()
      .expect("post should exist");
    assert_eq!(post.id, found.id);
    assert_eq!("Primeiro Post", found.title);
    assert!(found.content.is_some());
  }

  #[test]
  fn drafts_are_hidden_from_published_lookups() {
    let pool = memory_pool();
    let mut post = sample_post("Rascunho", "rascunho", false);
    insert_post(&pool, &mut post).unwrap();
    assert!(post_by_slug(&pool, "rascunho", true).unwrap().is_none());
    // But the admin fetch still sees it:
    assert!(post_by_slug(&pool, "rascunho", false).unwrap().is_some());
    assert!(published_posts(&pool, 0, 10, None).unwrap().is_empty());
  }

  #[test]
  fn record_view_increments_by_one() {
    let pool = memory_pool();
    let mut post = sample_post("Visitas", "visitas", true);
    insert_post(&pool, &mut post).unwrap();
    record_view(&pool, post.id).unwrap();
    record_view(&pool, post.id).unwrap();
    let found = post_by_id(&pool, post.id).unwrap().unwrap();
    assert_eq!(2, found.views);
  }

  #[test]
  fn record_like_returns_the_new_count() {
    let pool = memory_pool();
    let mut post = sample_post("Curtidas", "curtidas", true);
    insert_post(&pool, &mut post).unwrap();
    assert_eq!(1, record_like(&pool, post.id).unwrap());
    assert_eq!(2, record_like(&pool, post.id).unwrap());
  }

  #[test]
  fn slug_in_use_can_exclude_the_record_being_saved() {
    let pool = memory_pool();
    let mut post = sample_post("Um Post", "um-post", true);
    insert_post(&pool, &mut post).unwrap();
    assert!(slug_in_use(&pool, "um-post", None).unwrap());
    assert!(!slug_in_use(&pool, "um-post", Some(post.id)).unwrap());
    assert!(!slug_in_use(&pool, "outro-post", None).unwrap());
  }

  #[test]
  fn deleting_a_post_removes_row_and_associations() {
    let pool = memory_pool();
    let categories = all_categories(&pool, true).unwrap();
    let mut post = sample_post("Com Categoria", "com-categoria", true);
    post.categories.push(categories.into_iter().next().unwrap());
    insert_post(&pool, &mut post).unwrap();
    assert_eq!(1, categories_for_post(&pool, post.id).unwrap().len());

    assert!(delete_post(&pool, post.id).unwrap());
    assert!(post_by_id(&pool, post.id).unwrap().is_none());
    assert!(categories_for_post(&pool, post.id).unwrap().is_empty());
    // Deleting again reports nothing was there:
    assert!(!delete_post(&pool, post.id).unwrap());
  }

  #[test]
  fn update_post_replaces_category_associations() {
    let pool = memory_pool();
    let categories = all_categories(&pool, true).unwrap();
    let mut post = sample_post("Recategorizado", "recategorizado", true);
    post.categories.push(Category {
      id: categories[0].id,
      name: categories[0].name.clone(),
      slug: categories[0].slug.clone(),
      description: None,
      color: categories[0].color.clone(),
      icon: categories[0].icon.clone(),
      active: true
    });
    insert_post(&pool, &mut post).unwrap();

    post.categories = vec![];
    update_post(&pool, &post).unwrap();
    assert!(categories_for_post(&pool, post.id).unwrap().is_empty());
  }

  #[test]
  fn post_stats_counts_drafts_and_views() {
    let pool = memory_pool();
    let mut published = sample_post("Publicado", "publicado", true);
    let mut draft = sample_post("Rascunho", "rascunho", false);
    insert_post(&pool, &mut published).unwrap();
    insert_post(&pool, &mut draft).unwrap();
    record_view(&pool, published.id).unwrap();

    let stats = post_stats(&pool).unwrap();
    assert_eq!(2, stats.total_posts);
    assert_eq!(1, stats.published_posts);
    assert_eq!(1, stats.total_views);
  }

  #[test]
  fn users_roundtrip_by_username() {
    let pool = memory_pool();
    assert_eq!(0, user_count(&pool).unwrap());
    let mut user = User {
      id: -1,
      username: "admin".to_string(),
      email: None,
      pw_hash: "$argon2id$fake".to_string(),
      created_at: 1700000000
    };
    insert_user(&pool, &mut user).unwrap();
    assert_eq!(1, user_count(&pool).unwrap());
    let found = user_by_username(&pool, "admin").unwrap().unwrap();
    assert_eq!(user.id, found.id);
    assert!(user_by_username(&pool, "nobody").unwrap().is_none());
  }
}
