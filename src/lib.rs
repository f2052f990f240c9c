//! # XDG Thumbnailer
//!
//! Fills the freedesktop.org thumbnail cache for files and directory trees, using the
//! thumbnailers other applications install under `/usr/share/thumbnailers`,
//! `/usr/local/share/thumbnailers` and `~/.local/share/thumbnailers`.
//!
//! A run has three steps:
//! - Every `.thumbnailer` definition is read into a [`Registry`] mapping MIME types to
//!   the command that renders them. Later definitions replace earlier ones.
//! - Each file's MIME type is guessed from its extension, falling back to `file` and
//!   then `mimetype`.
//! - The matching thumbnailer is run twice per file, for the 128px `normal` and 512px
//!   `large` cache sizes. Output goes to `<cache>/<size>/<md5 of file URI>.png`.
//!
//! The crate never decodes images itself; thumbnailers are plain subprocesses.
//!
//! ## Requirements
//!
//! - **file** (optional): used when the extension does not identify the file.
//! - **mimetype** (optional): asked when `file` only says `application/octet-stream`.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use xdg_thumbnailer::{Thumbnailer, ThumbnailerOptions};
//! use color_eyre::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let options = ThumbnailerOptions {
//!         skip_if_exists: true,
//!         ..Default::default()
//!     };
//!
//!     let thumbnailer = Thumbnailer::new(options)?;
//!     let summary = thumbnailer.run(Path::new("path/to/photos")).await?;
//!     println!("{} thumbnails generated", summary.generated);
//!
//!     Ok(())
//! }
//! ```

// Running external programs with captured output.
mod command;
// Run options and default locations.
pub mod config;
// Walking a target and feeding files through the pipeline.
mod driver;
// Extension and content based MIME detection.
pub mod mime;
// Loading `.thumbnailer` definitions.
pub mod registry;
// Cache paths, `Exec` expansion and running thumbnailers.
pub mod thumbnails;

pub use config::{ThumbnailerOptions, TryExecPolicy};
pub use driver::{FileReport, RunSummary, Thumbnailer};
pub use mime::TypeResolver;
pub use registry::{Registry, ThumbnailerDefinition, load_registry};
pub use thumbnails::{ThumbnailOutcome, ThumbnailRequest, ThumbnailSize, generate_thumbnails};
