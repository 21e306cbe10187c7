//! Reading a photo from disk into a `data:` URL.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::FormError;
use crate::guestbook_entry::AttachedImage;

/// Largest photo accepted, in bytes (2 MiB).
pub const MAX_IMAGE_BYTES: u64 = 2 * 1024 * 1024;

/// `image/*` MIME type for a path, judged by its extension.
pub fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        "heic" => "image/heic",
        "tif" | "tiff" => "image/tiff",
        "ico" => "image/x-icon",
        _ => return None,
    };
    Some(mime)
}

/// Check and encode the file at `path`.
///
/// Only regular files are accepted. The type and size checks run before
/// any bytes are read, and the read itself stops one byte past `limit`, so
/// a file that grows after the check is still rejected.
pub async fn load_image(path: &Path, limit: u64) -> Result<AttachedImage, FormError> {
    let mime = image_mime(path).ok_or_else(|| FormError::NotAnImage {
        path: path.to_path_buf(),
    })?;

    let read_err = |source| FormError::ImageRead {
        path: path.to_path_buf(),
        source,
    };

    let metadata = tokio::fs::metadata(path).await.map_err(read_err)?;
    if !metadata.is_file() {
        return Err(FormError::NotAnImage {
            path: path.to_path_buf(),
        });
    }
    if metadata.len() > limit {
        return Err(FormError::ImageTooLarge {
            size: metadata.len(),
            limit,
        });
    }

    let file = tokio::fs::File::open(path).await.map_err(read_err)?;
    let bytes = read_capped(file, limit).await.map_err(|e| match e {
        CappedReadError::TooLarge(size) => FormError::ImageTooLarge { size, limit },
        CappedReadError::Io(source) => read_err(source),
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(AttachedImage {
        file_name,
        data_url: format!("data:{mime};base64,{}", STANDARD.encode(&bytes)),
    })
}

#[derive(Debug)]
enum CappedReadError {
    /// At least this many bytes were available.
    TooLarge(u64),
    Io(std::io::Error),
}

/// Read all of `reader`, giving up once more than `limit` bytes arrive.
async fn read_capped<R>(reader: R, limit: u64) -> Result<Vec<u8>, CappedReadError>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .await
        .map_err(CappedReadError::Io)?;

    if bytes.len() as u64 > limit {
        return Err(CappedReadError::TooLarge(bytes.len() as u64));
    }
    Ok(bytes)
}
