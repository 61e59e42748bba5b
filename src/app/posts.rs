use log::{error, info};
use crate::db::{self, Pool};
use crate::db::entities::{Category, Post};
use crate::utils::slug_utils::{self, SlugError};
use crate::utils::{serde_utils, text_utils, time_utils};
use super::dtos::{PostForm, PostUpdateForm};
use super::error::{map_db_error, Error};
use super::uploads::UploadService;

// Service functions for everything that writes posts. The
// handlers stay thin and the slug generation is an explicit
// step in here instead of some hook buried in the storage
// layer.

// Bridges the resolver's lookup closure to the posts table.
// Two simultaneous saves of the same title can still both
// pass this check, the UNIQUE column catches that case at
// commit time.
fn unique_post_slug(
  pool: &Pool,
  base: &str,
  exclude_id: Option<i64>
) -> Result<String, Error> {
  slug_utils::unique_slug(base, |candidate| {
    db::slug_in_use(pool, candidate, exclude_id)
      .map_err(|e| SlugError::Lookup(e.to_string()))
  })
  .map_err(|e| match e {
    SlugError::Exhausted => {
      error!("Slug generation exhausted for base {}", base);
      Error::InternalServerError(e.to_string())
    },
    SlugError::Lookup(message) => Error::DatabaseError(message)
  })
}

// Category IDs come straight from the admin frontend, check
// them one by one and fail loudly on the first unknown one.
fn checked_categories(
  pool: &Pool,
  ids: &[i64]
) -> Result<Vec<Category>, Error> {
  let mut categories = Vec::with_capacity(ids.len());
  for id in ids {
    match db::category_by_id(pool, *id).map_err(map_db_error)? {
      Some(category) => categories.push(category),
      None => return Err(Error::BadRequest(
        format!("Category with ID {} does not exist", id)
      ))
    }
  }
  Ok(categories)
}

pub fn create_post(pool: &Pool, form: PostForm) -> Result<Post, Error> {
  let title = form.title.trim().to_string();
  if title.is_empty() {
    return Err(Error::BadRequest(
      String::from("Field title cannot be empty")
    ));
  }
  if form.content.trim().is_empty() {
    return Err(Error::BadRequest(
      String::from("Field content cannot be empty")
    ));
  }

  // An explicit slug from the form still goes through the
  // slugifier, editors type anything in there:
  let base_slug = match serde_utils::empty_string_to_none(form.slug) {
    Some(explicit) => slug_utils::slugify(&explicit),
    None => slug_utils::slugify(&title)
  };
  let slug = unique_post_slug(pool, &base_slug, None)?;

  let summary = match serde_utils::empty_string_to_none(form.summary) {
    Some(explicit) => explicit,
    None => text_utils::derive_summary(&form.content)
  };
  let categories = checked_categories(
    pool,
    form.categories.as_deref().unwrap_or(&[])
  )?;

  let now = time_utils::current_timestamp();
  let mut post = Post {
    id: -1,
    title,
    slug,
    content: Some(form.content),
    summary,
    cover_image: serde_utils::empty_string_to_none(form.cover_image),
    // Posts go out published unless the editor says otherwise:
    published: form.published.unwrap_or(true),
    created_at: now,
    updated_at: now,
    views: 0,
    likes: 0,
    categories
  };
  db::insert_post(pool, &mut post).map_err(map_db_error)?;
  info!("Created post {} with slug {}", post.id, post.slug);
  Ok(post)
}

pub fn update_post(
  pool: &Pool,
  id: i64,
  form: PostUpdateForm
) -> Result<Post, Error> {
  let mut post = db::post_by_id(pool, id)
    .map_err(map_db_error)?
    .ok_or_else(|| Error::NotFound(
      String::from("Post does not exist")
    ))?;

  let mut title_changed = false;
  if let Some(title) = &form.title {
    let trimmed = title.trim();
    if trimmed.is_empty() {
      return Err(Error::BadRequest(
        String::from("Field title cannot be empty")
      ));
    }
    if trimmed != post.title {
      post.title = trimmed.to_string();
      title_changed = true;
    }
  }

  // An explicit slug wins, a changed title re-derives one,
  // anything else keeps the stored slug. Either way the
  // uniqueness pass excludes the post being saved.
  match serde_utils::empty_string_to_none(form.slug) {
    Some(explicit) => {
      let base = slug_utils::slugify(&explicit);
      if base != post.slug {
        post.slug = unique_post_slug(pool, &base, Some(id))?;
      }
    },
    None => if title_changed {
      let base = slug_utils::slugify(&post.title);
      post.slug = unique_post_slug(pool, &base, Some(id))?;
    }
  }

  if let Some(content) = form.content {
    if content.trim().is_empty() {
      return Err(Error::BadRequest(
        String::from("Field content cannot be empty")
      ));
    }
    post.content = Some(content);
  }
  if let Some(summary) = form.summary {
    post.summary = match serde_utils::empty_string_to_none(Some(summary)) {
      Some(summary) => summary,
      // Blanking the summary re-derives it from the body:
      None => text_utils::derive_summary(
        post.content.as_deref().unwrap_or("")
      )
    };
  }
  if let Some(cover_image) = form.cover_image {
    post.cover_image = serde_utils::empty_string_to_none(cover_image);
  }
  if let Some(published) = form.published {
    post.published = published;
  }
  if let Some(ids) = &form.categories {
    post.categories = checked_categories(pool, ids)?;
  }

  post.updated_at = time_utils::current_timestamp();
  db::update_post(pool, &post).map_err(map_db_error)?;
  Ok(post)
}

// Removes the row and the uploaded cover that went with it.
// A missing cover file only gets a log line, the post is
// gone and that's what the caller asked for.
pub async fn delete_post(
  pool: &Pool,
  uploads: &UploadService,
  id: i64
) -> Result<(), Error> {
  let post = db::post_by_id(pool, id)
    .map_err(map_db_error)?
    .ok_or_else(|| Error::NotFound(
      String::from("Post does not exist")
    ))?;
  db::delete_post(pool, id).map_err(map_db_error)?;
  if let Some(cover) = &post.cover_image {
    uploads.remove_by_url(cover).await;
  }
  info!("Deleted post {} ({})", id, post.slug);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::test_helpers::memory_pool;

  fn base_form(title: &str) -> PostForm {
    PostForm {
      title: title.to_string(),
      content: "<p>Algum conteúdo interessante.</p>".to_string(),
      summary: None,
      slug: None,
      cover_image: None,
      published: None,
      categories: None
    }
  }

  #[test]
  fn create_derives_slug_and_summary() {
    let pool = memory_pool();
    let post = create_post(&pool, base_form("Olá, Mundo! 2025")).unwrap();
    assert_eq!("ola-mundo-2025", post.slug);
    assert!(post.summary.contains("Algum conteúdo interessante."));
    assert!(post.published);
  }

  #[test]
  fn duplicate_titles_get_numbered_slugs() {
    let pool = memory_pool();
    let first = create_post(&pool, base_form("Olá, Mundo! 2025")).unwrap();
    let second = create_post(&pool, base_form("Olá, Mundo! 2025")).unwrap();
    let third = create_post(&pool, base_form("Olá, Mundo! 2025")).unwrap();
    assert_eq!("ola-mundo-2025", first.slug);
    assert_eq!("ola-mundo-2025-1", second.slug);
    assert_eq!("ola-mundo-2025-2", third.slug);
  }

  #[test]
  fn empty_title_is_a_bad_request() {
    let pool = memory_pool();
    match create_post(&pool, base_form("   ")) {
      Err(Error::BadRequest(_)) => (),
      other => panic!("Expected BadRequest, got {:?}", other)
    }
  }

  #[test]
  fn unknown_category_is_a_bad_request() {
    let pool = memory_pool();
    let mut form = base_form("Com Categorias");
    form.categories = Some(vec![9999]);
    match create_post(&pool, form) {
      Err(Error::BadRequest(message)) =>
        assert!(message.contains("9999")),
      other => panic!("Expected BadRequest, got {:?}", other)
    }
  }

  #[test]
  fn title_change_regenerates_the_slug() {
    let pool = memory_pool();
    let post = create_post(&pool, base_form("Título Antigo")).unwrap();
    assert_eq!("titulo-antigo", post.slug);

    let update = PostUpdateForm {
      title: Some("Título Novo".to_string()),
      content: None,
      summary: None,
      slug: None,
      cover_image: None,
      published: None,
      categories: None
    };
    let updated = update_post(&pool, post.id, update).unwrap();
    assert_eq!("titulo-novo", updated.slug);
  }

  #[test]
  fn resaving_the_same_title_keeps_the_slug() {
    let pool = memory_pool();
    let post = create_post(&pool, base_form("Título Estável")).unwrap();
    let update = PostUpdateForm {
      title: Some("Título Estável".to_string()),
      content: Some("<p>Corpo revisado.</p>".to_string()),
      summary: None,
      slug: None,
      cover_image: None,
      published: None,
      categories: None
    };
    let updated = update_post(&pool, post.id, update).unwrap();
    // No "-1" suffix from colliding with itself:
    assert_eq!("titulo-estavel", updated.slug);
  }

  #[test]
  fn explicit_null_clears_the_cover() {
    let pool = memory_pool();
    let mut form = base_form("Com Capa");
    form.cover_image = Some("/static/uploads/a.png".to_string());
    let post = create_post(&pool, form).unwrap();
    assert!(post.cover_image.is_some());

    let update = PostUpdateForm {
      title: None,
      content: None,
      summary: None,
      slug: None,
      cover_image: Some(None),
      published: None,
      categories: None
    };
    let updated = update_post(&pool, post.id, update).unwrap();
    assert!(updated.cover_image.is_none());
  }

  #[test]
  fn update_can_unpublish() {
    let pool = memory_pool();
    let post = create_post(&pool, base_form("Vai Virar Rascunho")).unwrap();
    let update = PostUpdateForm {
      title: None,
      content: None,
      summary: None,
      slug: None,
      cover_image: None,
      published: Some(false),
      categories: None
    };
    update_post(&pool, post.id, update).unwrap();
    assert!(
      db::post_by_slug(&pool, "vai-virar-rascunho", true)
        .unwrap()
        .is_none()
    );
  }

  #[tokio::test]
  async fn delete_without_cover_does_not_error() {
    let pool = memory_pool();
    let dir = std::env::temp_dir()
      .join(format!("mm-posts-delete-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let uploads = UploadService::open(
      dir.to_str().unwrap(),
      "/static/uploads"
    ).unwrap();

    let post = create_post(&pool, base_form("Sem Capa")).unwrap();
    delete_post(&pool, &uploads, post.id).await.unwrap();
    assert!(db::post_by_id(&pool, post.id).unwrap().is_none());
  }

  #[tokio::test]
  async fn delete_removes_the_cover_file() {
    let pool = memory_pool();
    let dir = std::env::temp_dir()
      .join(format!("mm-posts-cover-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("capa.png"), b"fake image").unwrap();
    let uploads = UploadService::open(
      dir.to_str().unwrap(),
      "/static/uploads"
    ).unwrap();

    let mut form = base_form("Com Capa Real");
    form.cover_image = Some("/static/uploads/capa.png".to_string());
    let post = create_post(&pool, form).unwrap();

    delete_post(&pool, &uploads, post.id).await.unwrap();
    assert!(!dir.join("capa.png").exists());
  }

  #[tokio::test]
  async fn deleting_a_ghost_post_is_not_found() {
    let pool = memory_pool();
    let dir = std::env::temp_dir()
      .join(format!("mm-posts-ghost-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let uploads = UploadService::open(
      dir.to_str().unwrap(),
      "/static/uploads"
    ).unwrap();

    match delete_post(&pool, &uploads, 12345).await {
      Err(Error::NotFound(_)) => (),
      other => panic!("Expected NotFound, got {:?}", other)
    }
  }
}
