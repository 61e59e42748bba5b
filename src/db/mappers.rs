use super::entities::*;
use rusqlite::{Row, Error};

// All the post queries select the same column list (listing
// queries put NULL in the content slot) so a single mapper
// covers every shape.
pub fn map_post(row: &Row) -> Result<Post, Error> {
  Ok(Post {
    id: row.get(0)?,
    title: row.get(1)?,
    slug: row.get(2)?,
    content: row.get(3)?,
    summary: row.get(4)?,
    cover_image: row.get(5)?,
    published: row.get(6)?,
    created_at: row.get(7)?,
    updated_at: row.get(8)?,
    views: row.get(9)?,
    likes: row.get(10)?,
    categories: Vec::new()
  })
}

pub fn map_category(row: &Row) -> Result<Category, Error> {
  Ok(Category {
    id: row.get(0)?,
    name: row.get(1)?,
    slug: row.get(2)?,
    description: row.get(3)?,
    color: row.get(4)?,
    icon: row.get(5)?,
    active: row.get(6)?
  })
}

pub fn map_user(row: &Row) -> Result<User, Error> {
  Ok(User {
    id: row.get(0)?,
    username: row.get(1)?,
    email: row.get(2)?,
    pw_hash: row.get(3)?,
    created_at: row.get(4)?
  })
}
