#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

/// Version string shown by `adpa --version`.
#[must_use]
pub fn long_version() -> String {
    format!("{} ({GIT_COMMIT_HASH})", env!("CARGO_PKG_VERSION"))
}
