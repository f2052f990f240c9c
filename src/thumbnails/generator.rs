use crate::command::run_captured;
use crate::registry::ThumbnailerDefinition;
use crate::thumbnails::cache::{ThumbnailRequest, ThumbnailSize, ensure_size_dir};
use crate::thumbnails::template::expand_exec;
use std::ffi::OsString;
use std::path::Path;

/// What happened to one cache size of one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ThumbnailOutcome {
    Generated(ThumbnailSize),
    /// `skip_if_exists` was set and the thumbnail was already in the cache.
    SkippedExisting(ThumbnailSize),
    Failed(ThumbnailSize),
}

impl ThumbnailOutcome {
    pub fn size(&self) -> ThumbnailSize {
        match self {
            ThumbnailOutcome::Generated(size)
            | ThumbnailOutcome::SkippedExisting(size)
            | ThumbnailOutcome::Failed(size) => *size,
        }
    }
}

/// Runs the thumbnailer for the normal and then the large cache size of `file`.
///
/// A failure for one size is logged and does not stop the other. The returned
/// outcomes are in generation order.
pub async fn generate_thumbnails(
    definition: &ThumbnailerDefinition,
    file: &Path,
    cache_root: &Path,
    skip_if_exists: bool,
) -> Vec<ThumbnailOutcome> {
    let mut outcomes = Vec::with_capacity(ThumbnailSize::ALL.len());
    for size in ThumbnailSize::ALL {
        outcomes.push(generate_size(definition, file, cache_root, size, skip_if_exists).await);
    }
    outcomes
}

async fn generate_size(
    definition: &ThumbnailerDefinition,
    file: &Path,
    cache_root: &Path,
    size: ThumbnailSize,
    skip_if_exists: bool,
) -> ThumbnailOutcome {
    let label = size.directory_name();
    let request = match ThumbnailRequest::new(file, size, cache_root) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!("Generating {label} thumbnail for {} failed! {e:#}", file.display());
            return ThumbnailOutcome::Failed(size);
        }
    };

    if skip_if_exists && request.is_cached() {
        tracing::info!("Skipping existing {label} thumbnail for {}", file.display());
        return ThumbnailOutcome::SkippedExisting(size);
    }

    if let Err(e) = ensure_size_dir(cache_root, size) {
        tracing::error!("Generating {label} thumbnail for {} failed! {e:#}", file.display());
        return ThumbnailOutcome::Failed(size);
    }

    let args = expand_exec(&definition.exec, &request);
    match run_captured(&args).await {
        Ok(output) if output.status.success() => {
            tracing::info!("Successfully generated {label} thumbnail for {}", file.display());
            ThumbnailOutcome::Generated(size)
        }
        Ok(output) => {
            tracing::error!("Generating {label} thumbnail for {} failed!", file.display());
            tracing::debug!("Attempted command: {}", command_line(&args));
            tracing::debug!(
                "Thumbnailer exited with {}. stdout: {} stderr: {}",
                output.status,
                String::from_utf8_lossy(&output.stdout).trim(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            ThumbnailOutcome::Failed(size)
        }
        Err(e) => {
            tracing::error!("Generating {label} thumbnail for {} failed!", file.display());
            tracing::debug!("Attempted command: {}", command_line(&args));
            tracing::debug!("{e:#}");
            ThumbnailOutcome::Failed(size)
        }
    }
}

fn command_line(args: &[OsString]) -> String {
    args.iter()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
