use actix_web::{web, HttpResponse, Result};
use handlebars::Handlebars;
use log::error;
use serde_json::json;
use crate::db;
use super::dtos::{BlogQuery, LikeDto, PostDetailDto, PostDto, SitemapData};
use super::error::{map_db_error, Error};
use super::AppState;

// Public API handlers. The admin ones live in their own
// module.

// Few constants that don't really qualify for the config
// file:
const MAX_POSTS: usize = 30;
// The "you might also like" list on post pages:
const MAX_RECENT_POSTS: usize = 6;

// The frontend renders the pages, the home endpoint just
// describes the site.
pub async fn index(app_state: web::Data<AppState>) -> HttpResponse {
  HttpResponse::Ok().json(
    json!({
      "title": app_state.site_info.title,
      "description": app_state.site_info.description,
      "root": app_state.site_info.root
    })
  )
}

// Default response when no route matched the request:
pub async fn not_found() -> Result<HttpResponse, Error> {
  Err(Error::NotFound(String::from("Endpoint doesn't exist")))
}

pub async fn blog(
  app_state: web::Data<AppState>,
  query: web::Query<BlogQuery>
) -> Result<HttpResponse, Error> {
  let start = query.start.unwrap_or(0);
  let max = query.max
    .map(|m| if m > MAX_POSTS { MAX_POSTS } else { m })
    .unwrap_or(MAX_POSTS);
  let posts = db::published_posts(
    &app_state.pool,
    start,
    max,
    query.category.as_deref()
  ).map_err(map_db_error)?;
  let dtos: Vec<PostDto> = posts.into_iter().map(|p| p.into()).collect();
  Ok(HttpResponse::Ok().json(dtos))
}

pub async fn post_detail(
  app_state: web::Data<AppState>,
  path: web::Path<(String,)>
) -> Result<HttpResponse, Error> {
  let slug = path.into_inner().0;
  let post = db::post_by_slug(&app_state.pool, &slug, true)
    .map_err(map_db_error)?;
  match post {
    Some(post) => {
      // Count the visit. This is the one mutation on the read
      // path and it happens here, in the open. A failed
      // counter update shouldn't take the page down with it:
      if let Err(e) = db::record_view(&app_state.pool, post.id) {
        error!("Could not record a view for post {} - {}", post.id, e);
      }
      let recent = db::recent_published_posts(
        &app_state.pool,
        post.id,
        MAX_RECENT_POSTS
      ).map_err(map_db_error)?;
      let previous = db::previous_published_post(
        &app_state.pool,
        post.created_at
      ).map_err(map_db_error)?;
      let next = db::next_published_post(
        &app_state.pool,
        post.created_at
      ).map_err(map_db_error)?;

      Ok(
        HttpResponse::Ok().json(
          PostDetailDto {
            post: post.into(),
            recent: recent.into_iter().map(|p| p.into()).collect(),
            previous: previous.map(|p| p.into()),
            next: next.map(|p| p.into())
          }
        )
      )
    },
    None => Err(Error::NotFound(String::from("Post does not exist")))
  }
}

pub async fn like_post(
  app_state: web::Data<AppState>,
  path: web::Path<(String,)>
) -> Result<HttpResponse, Error> {
  let slug = path.into_inner().0;
  let post = db::post_by_slug(&app_state.pool, &slug, true)
    .map_err(map_db_error)?;
  match post {
    Some(post) => {
      let likes = db::record_like(&app_state.pool, post.id)
        .map_err(map_db_error)?;
      Ok(HttpResponse::Ok().json(LikeDto { likes }))
    },
    None => Err(Error::NotFound(String::from("Post does not exist")))
  }
}

pub async fn categories(
  app_state: web::Data<AppState>
) -> Result<HttpResponse, Error> {
  match db::all_categories(&app_state.pool, true) {
    Ok(categories) => Ok(HttpResponse::Ok().json(categories)),
    Err(e) => Err(Error::DatabaseError(e.to_string()))
  }
}

pub async fn sitemap(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>
) -> Result<HttpResponse, Error> {
  let site_info = &app_state.site_info;
  let mut data = SitemapData::new();
  // Static pages of the public site, by priority:
  data.add_page(site_info, "", "daily", "1.0");
  data.add_page(site_info, &site_info.blog_root, "daily", "0.9");
  data.add_page(site_info, "sobre", "monthly", "0.8");
  data.add_page(site_info, "contato", "monthly", "0.7");
  data.add_page(site_info, "termos", "yearly", "0.3");
  data.add_page(site_info, "privacidade", "yearly", "0.3");

  // DB errors are ignored here, a static-only sitemap is
  // better than a 500 to a crawler:
  if let Ok(posts) = db::all_published_posts(&app_state.pool) {
    for post in posts {
      data.add_post(site_info, post);
    }
  }

  let body = hb.render("sitemap", &data)
    .map_err(|e| {
      error!("A template engine error occured when rendering the sitemap: {}", e);
      Error::InternalServerError("Template engine error".to_string())
    })?;

  Ok(
    HttpResponse::Ok()
      .content_type("application/xml")
      .header("Cache-Control", "max-age=3600")
      .body(body)
  )
}

pub async fn robots(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>
) -> Result<HttpResponse, Error> {
  let body = hb.render("robots", &json!({ "root": app_state.site_info.root }))
    .map_err(|e| {
      error!("A template engine error occured when rendering robots.txt: {}", e);
      Error::InternalServerError("Template engine error".to_string())
    })?;

  Ok(
    HttpResponse::Ok()
      .content_type("text/plain")
      .header("Cache-Control", "max-age=86400")
      .body(body)
  )
}
