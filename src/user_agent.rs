//! User-Agent string sent with every page and media request.

/// Builds the User-Agent identifying this tool and its version.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");
    format!("{name}/{version} (media-archive-mirror)")
}
