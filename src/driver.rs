use crate::config::ThumbnailerOptions;
use crate::mime::TypeResolver;
use crate::registry::{Registry, load_registry};
use crate::thumbnails::{ThumbnailOutcome, generate_thumbnails};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What happened to a single file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileReport {
    /// No thumbnailer handles the file's MIME type.
    Unsupported { mime_type: String },
    Thumbnailed {
        mime_type: String,
        outcomes: Vec<ThumbnailOutcome>,
    },
}

/// Totals for one run, logged when the run ends.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub files: usize,
    pub thumbnailed: usize,
    pub unsupported: usize,
    pub generated: usize,
    pub skipped_existing: usize,
    pub failed: usize,
}

impl RunSummary {
    fn record(&mut self, report: &FileReport) {
        self.files += 1;
        match report {
            FileReport::Unsupported { .. } => self.unsupported += 1,
            FileReport::Thumbnailed { outcomes, .. } => {
                self.thumbnailed += 1;
                for outcome in outcomes {
                    match outcome {
                        ThumbnailOutcome::Generated(_) => self.generated += 1,
                        ThumbnailOutcome::SkippedExisting(_) => self.skipped_existing += 1,
                        ThumbnailOutcome::Failed(_) => self.failed += 1,
                    }
                }
            }
        }
    }
}

/// The registry, type resolver and options of one run, loaded once and shared by every file.
pub struct Thumbnailer {
    options: ThumbnailerOptions,
    registry: Registry,
    resolver: TypeResolver,
}

impl Thumbnailer {
    /// Loads the thumbnailer registry from `options.thumbnailer_dirs`.
    pub fn new(options: ThumbnailerOptions) -> color_eyre::Result<Self> {
        let registry = load_registry(&options)?;
        Ok(Self::with_registry(options, registry))
    }

    pub fn with_registry(options: ThumbnailerOptions, registry: Registry) -> Self {
        let resolver = TypeResolver::new(&options);
        Self {
            options,
            registry,
            resolver,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolves the type of `file` and, when a thumbnailer is registered for it,
    /// generates both cache sizes.
    pub async fn process_file(&self, file: &Path) -> FileReport {
        let mime_type = self.resolver.resolve_mime_type(file).await;
        let Some(definition) = self.registry.lookup(&mime_type) else {
            tracing::info!(
                "Skipped {}, no thumbnailer found for {mime_type:?}.",
                file.display()
            );
            return FileReport::Unsupported { mime_type };
        };

        tracing::debug!(
            "{} is {mime_type}, using {}",
            file.display(),
            definition.source.display()
        );
        let outcomes = generate_thumbnails(
            definition,
            file,
            &self.options.cache_root,
            self.options.skip_if_exists,
        )
        .await;
        FileReport::Thumbnailed {
            mime_type,
            outcomes,
        }
    }

    /// Thumbnails `target`, which is either a single file or a directory walked recursively.
    ///
    /// Up to `options.jobs` files are in flight at once; with one job files are
    /// handled strictly in traversal order. A target that does not exist yields an
    /// empty summary.
    pub async fn run(&self, target: &Path) -> color_eyre::Result<RunSummary> {
        let mut summary = RunSummary::default();

        if target.is_file() {
            summary.record(&self.process_file(target).await);
        } else if target.is_dir() {
            let jobs = self.options.jobs.max(1);
            let mut reports = stream::iter(regular_files(target))
                .map(|file| async move { self.process_file(&file).await })
                .buffer_unordered(jobs);
            while let Some(report) = reports.next().await {
                summary.record(&report);
            }
        } else {
            tracing::warn!("{} is neither a file nor a directory, nothing to do", target.display());
        }

        tracing::info!(
            "Processed {} files: {} thumbnails generated, {} already present, {} failed, {} files without thumbnailer",
            summary.files,
            summary.generated,
            summary.skipped_existing,
            summary.failed,
            summary.unsupported
        );
        Ok(summary)
    }
}

/// Regular files below `root` (symlinks to regular files included), in walk order.
/// Entries that cannot be read are logged and left out.
fn regular_files(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root).into_iter().filter_map(|entry| match entry {
        Ok(entry) => {
            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());
            is_file.then(|| entry.into_path())
        }
        Err(e) => {
            tracing::warn!("Skipping unreadable entry: {e}");
            None
        }
    })
}
