//! Local filename derivation for media URLs.
//!
//! The local name is a pure function of the media URL: the final path segment,
//! percent-decoded once, with any literal `%20` left over from double encoding
//! turned into a space. Path separators are neutralised so the result always
//! names a file directly inside the output directory.

use std::path::{Path, PathBuf};

use url::Url;

/// Reasons a media URL cannot be mapped to a local file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilenameError {
    /// The URL could not be parsed.
    #[error("invalid media URL: {url}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
    },

    /// The URL has no usable final path segment (e.g. it ends in `/`).
    #[error("no filename in media URL: {url}")]
    NoFilename {
        /// The offending URL.
        url: String,
    },
}

/// Derives the bare filename for `media_url`.
///
/// # Errors
///
/// Returns [`FilenameError`] when the URL is unparsable or its last path
/// segment is empty, `.` or `..`.
pub fn local_filename(media_url: &str) -> Result<String, FilenameError> {
    let parsed = Url::parse(media_url).map_err(|_| FilenameError::InvalidUrl {
        url: media_url.to_string(),
    })?;

    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();

    let decoded = match urlencoding::decode(segment) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(segment.as_bytes()))
            .into_owned(),
    };
    let name = neutralise_separators(&decoded.replace("%20", " "));

    if name.is_empty() || name == "." || name == ".." {
        return Err(FilenameError::NoFilename {
            url: media_url.to_string(),
        });
    }
    Ok(name)
}

/// Joins the derived filename for `media_url` onto `output_dir`.
///
/// # Errors
///
/// Same as [`local_filename`].
pub fn local_path(media_url: &str, output_dir: &Path) -> Result<PathBuf, FilenameError> {
    Ok(output_dir.join(local_filename(media_url)?))
}

fn neutralise_separators(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
