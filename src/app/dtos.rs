use serde::{Deserialize, Serialize};
use derive_more::Display;
use crate::config::SiteInfo;
use crate::db::entities::*;
use crate::utils::{serde_utils, time_utils};
use crate::utils::time_utils::DateFormat;

// Entities are converted to DTOs with the From trait, same
// deal in the other direction for the forms.

// The CategoryDto is actually exactly Category. Can I
// just re-export the entity?
pub use crate::db::entities::Category as CategoryDto;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDto {
  pub id: i64,
  pub title: String,
  pub slug: String,
  pub summary: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub cover_image: Option<String>,
  pub published: bool,
  pub date: String,
  pub updated: String,
  pub views: i64,
  pub likes: i64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub content: Option<String>,
  pub categories: Vec<CategoryDto>
}

impl From<Post> for PostDto {
  fn from(post: Post) -> Self {
    Self {
      id: post.id,
      title: post.title,
      slug: post.slug,
      summary: post.summary,
      cover_image: post.cover_image,
      published: post.published,
      date: time_utils::timestamp_to_date_string(
        post.created_at,
        DateFormat::Standard
      ),
      updated: time_utils::timestamp_to_date_string(
        post.updated_at,
        DateFormat::Standard
      ),
      views: post.views,
      likes: post.likes,
      content: post.content,
      categories: post.categories
    }
  }
}

// Tiny version for the previous/next links on the post page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRefDto {
  pub title: String,
  pub slug: String
}

impl From<Post> for PostRefDto {
  fn from(post: Post) -> Self {
    Self {
      title: post.title,
      slug: post.slug
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetailDto {
  #[serde(flatten)]
  pub post: PostDto,
  pub recent: Vec<PostDto>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub previous: Option<PostRefDto>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub next: Option<PostRefDto>
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeDto {
  pub likes: i64
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDto {
  pub total_posts: i64,
  pub published_posts: i64,
  pub draft_posts: i64,
  pub total_views: i64,
  pub this_week_posts: i64,
  pub posts: Vec<PostDto>
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadDto {
  pub url: String
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
  pub authenticated: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub username: Option<String>
}

/* --- Request body or query or form objects --- */

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
  pub username: String,
  pub password: String
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostForm {
  pub title: String,
  pub content: String,
  pub summary: Option<String>,
  pub slug: Option<String>,
  pub cover_image: Option<String>,
  pub published: Option<bool>,
  pub categories: Option<Vec<i64>>
}

// The edit endpoint only touches what's in the request body.
// cover_image is a special case for which we allow nullifying
// the field in DB if the update JSON had the field set to
// null. We use a double Option and a special deserializer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostUpdateForm {
  pub title: Option<String>,
  pub content: Option<String>,
  pub summary: Option<String>,
  pub slug: Option<String>,
  #[serde(
    default,
    deserialize_with = "serde_utils::deserialize_null_value"
  )]
  pub cover_image: Option<Option<String>>,
  pub published: Option<bool>,
  pub categories: Option<Vec<i64>>
}

#[derive(Debug, Deserialize)]
pub struct BlogQuery {
  pub start: Option<usize>,
  pub max: Option<usize>,
  pub category: Option<String>
}

/* --- End request body or query or form objects --- */

// I use this in some responses. Should probably use it
// for all of them but uh... Yeah.
#[derive(Debug, Deserialize, Serialize)]
pub struct JsonStatus {
  pub status: String,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>
}

#[derive(Debug, Display)]
pub enum JsonStatusType {
  #[display(fmt = "success")]
  Success,
  #[display(fmt = "error")]
  Error
}

impl JsonStatus {
  pub fn new(status: JsonStatusType, message: &str) -> Self {
    Self {
      status: status.to_string(),
      message: String::from(message),
      id: None
    }
  }

  pub fn new_with_id(
    status: JsonStatusType,
    message: &str,
    id: i64
  ) -> Self {
    Self {
      status: status.to_string(),
      message: String::from(message),
      id: Some(id)
    }
  }
}

// Following structs are used by the template engine to
// generate the sitemap XML file.
#[derive(Serialize)]
pub struct SitemapData {
  pub entries: Vec<SitemapEntry>
}

#[derive(Serialize)]
pub struct SitemapEntry {
  pub loc: String,
  pub lastmod: String,
  pub changefreq: &'static str,
  pub priority: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub image: Option<SitemapImage>
}

#[derive(Serialize)]
pub struct SitemapImage {
  pub loc: String,
  pub title: String
}

impl SitemapData {

  pub fn new() -> Self {
    Self {
      entries: Vec::new()
    }
  }

  // Static site pages. An empty path means the home page.
  pub fn add_page(
    &mut self,
    site_info: &SiteInfo,
    path: &str,
    changefreq: &'static str,
    priority: &'static str
  ) {
    let loc = if path.is_empty() {
      format!("{}/", site_info.root)
    } else {
      format!("{}/{}", site_info.root, path)
    };
    self.entries.push(
      SitemapEntry {
        loc,
        lastmod: time_utils::timestamp_to_date_string(
          time_utils::current_timestamp(),
          DateFormat::USCompact
        ),
        changefreq,
        priority,
        image: None
      }
    );
  }

  // We want to move the Post in there, it shouldn't
  // be used afterwards.
  pub fn add_post(&mut self, site_info: &SiteInfo, post: Post) {
    let loc = format!(
      "{}/{}/{}",
      site_info.root,
      site_info.blog_root,
      post.slug
    );
    let title = post.title;
    let image = post.cover_image
      .map(|url| {
        // Check if we have to add a "/" or not:
        let image_loc = match url.find('/') {
          Some(0) => format!("{}{}", site_info.root, url),
          _ => if url.find("://").is_none() {
            format!("{}/{}", site_info.root, url)
          } else {
            // URL appears to not be relative.
            url
          }
        };
        SitemapImage {
          loc: image_loc,
          title: title.clone()
        }
      });
    self.entries.push(
      SitemapEntry {
        loc,
        lastmod: time_utils::timestamp_to_date_string(
          post.updated_at,
          DateFormat::USCompact
        ),
        changefreq: "weekly",
        priority: "0.8",
        image
      }
    );
  }

}
