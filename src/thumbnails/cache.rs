use color_eyre::eyre::{WrapErr, eyre};
use md5::{Digest, Md5};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_encode};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

/// Bytes escaped in a file URI path: everything except `A-Za-z0-9 / - _ . ~`.
const URI_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The cache sizes this tool fills, following the freedesktop.org thumbnail specification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbnailSize {
    /// 128 pixels, stored in `normal/`.
    Normal,
    /// 512 pixels, stored in `large/`.
    Large,
}

impl ThumbnailSize {
    /// Generation order for every file.
    pub const ALL: [ThumbnailSize; 2] = [ThumbnailSize::Normal, ThumbnailSize::Large];

    pub fn pixels(self) -> u32 {
        match self {
            ThumbnailSize::Normal => 128,
            ThumbnailSize::Large => 512,
        }
    }

    pub fn directory_name(self) -> &'static str {
        match self {
            ThumbnailSize::Normal => "normal",
            ThumbnailSize::Large => "large",
        }
    }
}

/// `file://` URI of an absolute path. Every raw byte of the path outside
/// `A-Za-z0-9 / - _ . ~` is percent-encoded, the same URI desktop readers hash.
pub fn file_uri(absolute: &Path) -> color_eyre::Result<String> {
    if !absolute.is_absolute() {
        return Err(eyre!("cannot build a file URI for {}", absolute.display()));
    }
    Ok(format!("file://{}", percent_encode(&path_bytes(absolute), URI_PATH)))
}

#[cfg(unix)]
fn path_bytes(path: &Path) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> Cow<'_, [u8]> {
    Cow::Owned(path.to_string_lossy().replace('\\', "/").into_bytes())
}

/// Lowercase hex MD5 of the URI, the cache file stem.
pub fn cache_key(uri: &str) -> String {
    hex::encode(Md5::digest(uri.as_bytes()))
}

/// One thumbnail to produce: a source file at one cache size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThumbnailRequest {
    pub file: PathBuf,
    pub uri: String,
    pub size: ThumbnailSize,
    pub out_path: PathBuf,
}

impl ThumbnailRequest {
    /// `file` is made absolute (without resolving symlinks) before anything is derived from it.
    pub fn new(file: &Path, size: ThumbnailSize, cache_root: &Path) -> color_eyre::Result<Self> {
        let file = std::path::absolute(file)
            .wrap_err_with(|| format!("cannot make {} absolute", file.display()))?;
        let uri = file_uri(&file)?;
        let out_path = cache_root
            .join(size.directory_name())
            .join(format!("{}.png", cache_key(&uri)));
        Ok(Self {
            file,
            uri,
            size,
            out_path,
        })
    }

    /// Whether a regular file already sits at the output path.
    pub fn is_cached(&self) -> bool {
        self.out_path.is_file()
    }
}

/// Creates `<cache_root>/<size>` if needed. New directories are private to the user.
pub fn ensure_size_dir(cache_root: &Path, size: ThumbnailSize) -> color_eyre::Result<PathBuf> {
    let dir = cache_root.join(size.directory_name());
    if dir.is_dir() {
        return Ok(dir);
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder
        .create(&dir)
        .wrap_err_with(|| format!("cannot create {}", dir.display()))?;
    Ok(dir)
}
