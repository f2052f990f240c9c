use crate::thumbnails::cache::ThumbnailRequest;
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};

/// Expands a thumbnailer `Exec` line into an argument vector.
///
/// The line is split on whitespace and each token gets plain string replacement,
/// in this order: `%i` input path, `%o` output path, `%s` size in pixels,
/// `%u` input URI, `%%` a literal percent sign. There is no quoting, so a path
/// containing spaces still ends up in a single argument.
///
/// Paths are substituted as raw bytes, so file names that are not valid UTF-8
/// reach the thumbnailer unchanged.
pub fn expand_exec(exec: &str, request: &ThumbnailRequest) -> Vec<OsString> {
    let input = os_bytes(request.file.as_os_str());
    let output = os_bytes(request.out_path.as_os_str());
    let size = request.size.pixels().to_string();

    exec.split_whitespace()
        .map(|token| {
            let arg = replace_bytes(token.as_bytes(), b"%i", &input);
            let arg = replace_bytes(&arg, b"%o", &output);
            let arg = replace_bytes(&arg, b"%s", size.as_bytes());
            let arg = replace_bytes(&arg, b"%u", request.uri.as_bytes());
            let arg = replace_bytes(&arg, b"%%", b"%");
            os_string(arg)
        })
        .collect()
}

/// Replaces every non-overlapping `from`, scanning left to right like `str::replace`.
fn replace_bytes(haystack: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(haystack.len());
    let mut rest = haystack;
    while let Some(at) = rest.windows(from.len()).position(|w| w == from) {
        out.extend_from_slice(&rest[..at]);
        out.extend_from_slice(to);
        rest = &rest[at + from.len()..];
    }
    out.extend_from_slice(rest);
    out
}

#[cfg(unix)]
fn os_bytes(s: &OsStr) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(s.as_bytes())
}

#[cfg(unix)]
fn os_string(bytes: Vec<u8>) -> OsString {
    use std::os::unix::ffi::OsStringExt;
    OsString::from_vec(bytes)
}

#[cfg(not(unix))]
fn os_bytes(s: &OsStr) -> Cow<'_, [u8]> {
    match s.to_string_lossy() {
        Cow::Borrowed(text) => Cow::Borrowed(text.as_bytes()),
        Cow::Owned(text) => Cow::Owned(text.into_bytes()),
    }
}

#[cfg(not(unix))]
fn os_string(bytes: Vec<u8>) -> OsString {
    String::from_utf8_lossy(&bytes).into_owned().into()
}
