use actix_identity::Identity;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Result};
use futures::{StreamExt, TryStreamExt};
use log::error;
use tokio::io::AsyncWriteExt;
use crate::db;
use super::dtos::{
  DashboardDto,
  JsonStatus,
  JsonStatusType,
  PostDto,
  PostForm,
  PostUpdateForm,
  UploadDto
};
use super::error::{map_db_error, Error};
use super::helpers::require_admin;
use super::posts;
use super::uploads::UploadService;
use super::AppState;

// The admin surface. Everything in here starts by checking
// the session, a 401 from require_admin short-circuits the
// handler through "?".

pub async fn dashboard(
  app_state: web::Data<AppState>,
  id: Identity
) -> Result<HttpResponse, Error> {
  require_admin(&id)?;
  let stats = db::post_stats(&app_state.pool).map_err(map_db_error)?;
  let posts = db::all_posts(&app_state.pool).map_err(map_db_error)?;
  Ok(
    HttpResponse::Ok().json(
      DashboardDto {
        total_posts: stats.total_posts,
        published_posts: stats.published_posts,
        draft_posts: stats.total_posts - stats.published_posts,
        total_views: stats.total_views,
        this_week_posts: stats.this_week_posts,
        posts: posts.into_iter().map(|p| p.into()).collect()
      }
    )
  )
}

pub async fn new_post(
  app_state: web::Data<AppState>,
  id: Identity,
  form: web::Json<PostForm>
) -> Result<HttpResponse, Error> {
  require_admin(&id)?;
  let post = posts::create_post(&app_state.pool, form.into_inner())?;
  Ok(HttpResponse::Created().json(PostDto::from(post)))
}

// The GET side of the edit endpoint, drafts included since
// this is the editor asking.
pub async fn edit_form(
  app_state: web::Data<AppState>,
  id: Identity,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  require_admin(&id)?;
  let post_id = path.into_inner().0;
  match db::post_by_id(&app_state.pool, post_id).map_err(map_db_error)? {
    Some(post) => Ok(HttpResponse::Ok().json(PostDto::from(post))),
    None => Err(Error::NotFound(String::from("Post does not exist")))
  }
}

pub async fn edit_post(
  app_state: web::Data<AppState>,
  id: Identity,
  path: web::Path<(i64,)>,
  form: web::Json<PostUpdateForm>
) -> Result<HttpResponse, Error> {
  require_admin(&id)?;
  let post = posts::update_post(
    &app_state.pool,
    path.into_inner().0,
    form.into_inner()
  )?;
  Ok(HttpResponse::Ok().json(PostDto::from(post)))
}

pub async fn delete_post(
  app_state: web::Data<AppState>,
  id: Identity,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  require_admin(&id)?;
  let post_id = path.into_inner().0;
  posts::delete_post(&app_state.pool, &app_state.uploads, post_id).await?;
  Ok(
    HttpResponse::Ok().json(
      JsonStatus::new_with_id(JsonStatusType::Success, "Post deleted", post_id)
    )
  )
}

// Single-file multipart upload. The first field carrying a
// filename wins, fields without one (regular form values)
// are skipped. Nothing is written for files failing the
// extension check.
pub async fn upload(
  app_state: web::Data<AppState>,
  id: Identity,
  mut payload: Multipart
) -> Result<HttpResponse, Error> {
  require_admin(&id)?;
  while let Ok(Some(mut field)) = payload.try_next().await {
    let disposition = field.content_disposition();
    let filename = match disposition.as_ref().and_then(|d| d.get_filename()) {
      Some(filename) => filename.to_string(),
      None => continue
    };
    let ext = UploadService::allowed_extension(&filename)
      .ok_or_else(|| Error::BadRequest(
        format!("File format is not allowed for {}", filename)
      ))?;

    let stored_name = UploadService::generate_filename(&filename, &ext);
    let mut file = app_state.uploads
      .create_file(&stored_name)
      .await
      .map_err(|e| {
        error!("Could not create upload file {} - {}", stored_name, e);
        Error::InternalServerError(e.to_string())
      })?;
    while let Some(chunk) = field.next().await {
      let data = chunk.map_err(|e| {
        Error::BadRequest(format!("Upload stream error - {}", e))
      })?;
      file.write_all(&data).await.map_err(|e| {
        error!("Could not write upload {} - {}", stored_name, e);
        Error::InternalServerError(e.to_string())
      })?;
    }

    return Ok(
      HttpResponse::Ok().json(
        UploadDto {
          url: app_state.uploads.public_url(&stored_name)
        }
      )
    );
  }
  Err(Error::BadRequest(String::from("No file field in the request")))
}
