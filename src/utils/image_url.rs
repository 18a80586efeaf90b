//! Image URL detection and local filename derivation.
//!
//! Ensures a remote image maps to the same local filename on every run by
//! normalizing the URL before deriving the name.

use sha2::{Digest, Sha256};
use url::Url;

/// Extensions recognised as images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Longest filename produced before falling back to a hashed name.
const MAX_FILENAME_LEN: usize = 180;

/// Hex characters of the hash that disambiguates lossy flattened names.
const HASH_SUFFIX_LEN: usize = 12;

/// Errors that can occur while interpreting an image URL.
#[derive(Debug, thiserror::Error)]
pub enum ImageUrlError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,
}

/// Normalizes an absolute image URL.
///
/// # Normalization Rules
///
/// 1. **Protocol**: Only HTTP and HTTPS are allowed
/// 2. **Hostname**: Lowercased by the parser
/// 3. **Default ports**: Removed (80 for HTTP, 443 for HTTPS)
/// 4. **Fragments**: Removed
///
/// # Errors
///
/// Returns [`ImageUrlError::InvalidFormat`] for malformed or relative URLs.
/// Returns [`ImageUrlError::UnsupportedProtocol`] for non-HTTP(S) schemes.
pub fn normalize_image_url(input: &str) -> Result<Url, ImageUrlError> {
    let mut url = Url::parse(input.trim()).map_err(|e| ImageUrlError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(ImageUrlError::UnsupportedProtocol),
    }

    url.set_fragment(None);
    Ok(url)
}

/// Returns true if `value` is an absolute HTTP(S) URL whose path ends with a
/// known image extension.
///
/// Relative paths such as `avatar.png` are not matched: they cannot be
/// fetched and are left for the client to resolve.
pub fn is_image_url(value: &str) -> bool {
    let Ok(url) = normalize_image_url(value) else {
        return false;
    };
    let path = url.path().to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Derives the local filename for an image URL.
///
/// Host and path segments are flattened into one name
/// (`cdn.example.com_uploads_shot.png`); the query string is ignored. When
/// flattening could make two URLs look alike (a segment that already holds
/// `_` or needed sanitizing, an empty segment, an explicit port) a short hash
/// of the URL is inserted before the extension. URLs with no usable path, or
/// whose flattened name is too long, get a fully hashed name instead.
pub fn derive_filename(input: &str) -> String {
    let Ok(mut url) = normalize_image_url(input) else {
        return hashed_name(input, None);
    };
    url.set_query(None);

    let raw_segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.collect())
        .unwrap_or_default();
    let segments: Vec<String> = raw_segments
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| sanitize_segment(s))
        .filter(|s| !s.is_empty())
        .collect();

    let extension = segments
        .last()
        .and_then(|last| last.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()));

    if segments.is_empty() {
        return hashed_name(url.as_str(), extension.as_deref());
    }

    let raw_host = url.host_str().unwrap_or_default();
    let host = sanitize_segment(raw_host);
    let mut name = host.clone();
    for segment in &segments {
        if !name.is_empty() {
            name.push('_');
        }
        name.push_str(segment);
    }

    let unambiguous = url.port().is_none()
        && is_verbatim(raw_host, &host)
        && raw_segments
            .iter()
            .all(|raw| !raw.is_empty() && is_verbatim(raw, &sanitize_segment(raw)));
    if !unambiguous {
        name = with_hash_suffix(&name, url.as_str(), extension.is_some());
    }

    if name.len() > MAX_FILENAME_LEN {
        return hashed_name(url.as_str(), extension.as_deref());
    }
    name
}

/// True when a sanitized part is the raw part unchanged and free of the
/// `_` separator, so it can be told apart from its neighbours.
fn is_verbatim(raw: &str, sanitized: &str) -> bool {
    raw == sanitized && !raw.contains('_')
}

/// Inserts `-<hash>` before the extension (or at the end without one).
fn with_hash_suffix(name: &str, identity: &str, has_extension: bool) -> String {
    let digest = hex::encode(Sha256::digest(identity.as_bytes()));
    let tag = &digest[..HASH_SUFFIX_LEN];
    match name.rsplit_once('.') {
        Some((stem, ext)) if has_extension => format!("{stem}-{tag}.{ext}"),
        _ => format!("{name}-{tag}"),
    }
}

fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}

fn hashed_name(input: &str, extension: Option<&str>) -> String {
    let digest = hex::encode(Sha256::digest(input.as_bytes()));
    let stem = &digest[..32];
    match extension {
        Some(ext) if !ext.is_empty() && ext.len() <= 5 => format!("{stem}.{ext}"),
        _ => stem.to_string(),
    }
}
