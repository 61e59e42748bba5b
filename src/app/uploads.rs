use std::io;
use std::path::{Path, PathBuf};
use sha1::{Digest, Sha1};
use tokio::fs::{self, File};
use log::warn;
use crate::utils::slug_utils;
use crate::utils::time_utils;

// The extension allow-list, same images-and-videos set the
// site always accepted. Everything else gets a 400.
pub const ALLOWED_EXTENSIONS: [&'static str; 5] =
  ["png", "jpg", "jpeg", "gif", "mp4"];

/**
 * Owns the uploads directory. Files are stored under generated
 * names so two editors uploading "foto.png" the same day can't
 * clobber each other, and handed back out as public URLs under
 * a configured prefix (the front webserver serves the bytes).
 */
pub struct UploadService {
  uploads_path: PathBuf,
  public_url: String
}

impl UploadService {

  // Crash-early constructor: a missing or read-only uploads
  // directory means every upload would fail anyway.
  pub fn open(path: &str, public_url: &str) -> Result<Self, io::Error> {
    let uploads_path = PathBuf::from(path);
    let read_only = uploads_path.metadata()?.permissions().readonly();
    let is_dir = uploads_path.is_dir();
    match (read_only, is_dir) {
      (false, true) => Ok(Self {
        uploads_path,
        public_url: public_url.trim_end_matches('/').to_string()
      }),
      _ => Err(
        io::Error::new(
          io::ErrorKind::PermissionDenied,
          "Uploads directory is not writable"
        )
      )
    }
  }

  // Returns the normalized extension when the file name is
  // acceptable, None otherwise.
  pub fn allowed_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename)
      .extension()?
      .to_str()?
      .to_lowercase();
    if ALLOWED_EXTENSIONS.iter().any(|e| *e == ext) {
      Some(ext)
    } else {
      None
    }
  }

  // "Férias 2025.PNG" -> "1a2b3c4d-ferias-2025.png".
  // The hash prefix takes the current timestamp into account
  // so re-uploading the same file name doesn't collide. The
  // slugified stem is just there to keep the files browsable
  // on disk.
  pub fn generate_filename(original_name: &str, ext: &str) -> String {
    let stem = Path::new(original_name)
      .file_stem()
      .and_then(|s| s.to_str())
      .unwrap_or("file");
    let mut hasher = Sha1::new();
    hasher.update(original_name.as_bytes());
    hasher.update(time_utils::current_timestamp().to_le_bytes());
    let digest = hasher.finalize();
    let prefix: String = digest
      .iter()
      .take(4)
      .map(|b| format!("{:02x}", b))
      .collect();
    format!("{}-{}.{}", prefix, slug_utils::slugify(stem), ext)
  }

  pub fn public_url(&self, stored_name: &str) -> String {
    format!("{}/{}", self.public_url, stored_name)
  }

  pub async fn create_file(&self, stored_name: &str) -> Result<File, io::Error> {
    File::create(self.uploads_path.join(stored_name)).await
  }

  // Maps a public URL (the way we hand them out) back to a
  // file in the uploads directory and removes it. Foreign
  // URLs and already-missing files aren't errors, the caller
  // is deleting the record either way.
  pub async fn remove_by_url(&self, url: &str) -> bool {
    let prefix = format!("{}/", self.public_url);
    let name = match url.strip_prefix(&prefix) {
      Some(name) => name,
      None => {
        warn!("Not removing cover {} - not an upload of ours", url);
        return false;
      }
    };
    // Anything with path separators left has no business here:
    if name.is_empty() || name.contains('/') || name.contains("..") {
      warn!("Not removing suspicious upload path {}", name);
      return false;
    }
    match fs::remove_file(self.uploads_path.join(name)).await {
      Ok(_) => true,
      Err(e) => {
        warn!("Could not remove uploaded file {} - {}", name, e);
        false
      }
    }
  }

}
