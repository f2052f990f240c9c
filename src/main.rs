use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use xdg_thumbnailer::{Thumbnailer, ThumbnailerOptions, TryExecPolicy};

/// Generate thumbnails according to the freedesktop.org specification.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File or directory to process
    #[arg(required_unless_present = "list")]
    location: Option<PathBuf>,
    /// Show debugging info
    #[arg(short, long)]
    debug: bool,
    /// Stay quiet
    #[arg(short, long, conflicts_with = "debug")]
    quiet: bool,
    /// Skip already existing thumbnails
    #[arg(short, long)]
    skip: bool,
    /// Number of files processed at the same time
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    jobs: u16,
    /// Thumbnail cache root (defaults to $XDG_CACHE_HOME/thumbnails)
    #[arg(long)]
    cache_dir: Option<PathBuf>,
    /// Directory with .thumbnailer files; repeat to search several, replacing the defaults
    #[arg(long = "thumbnailers-dir")]
    thumbnailers_dirs: Vec<PathBuf>,
    /// Only use thumbnailers whose TryExec program is installed
    #[arg(long)]
    check_try_exec: bool,
    /// Print the registered thumbnailers as JSON and exit
    #[arg(long)]
    list: bool,
}

impl Cli {
    fn log_level(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::DEBUG
        } else if self.quiet {
            LevelFilter::OFF
        } else {
            LevelFilter::INFO
        }
    }

    fn options(&self) -> ThumbnailerOptions {
        let mut options = ThumbnailerOptions {
            skip_if_exists: self.skip,
            jobs: usize::from(self.jobs),
            ..Default::default()
        };
        if let Some(cache_dir) = &self.cache_dir {
            options.cache_root = cache_dir.clone();
        }
        if !self.thumbnailers_dirs.is_empty() {
            options.thumbnailer_dirs = self.thumbnailers_dirs.clone();
        }
        if self.check_try_exec {
            options.try_exec = TryExecPolicy::Require;
        }
        options
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(cli.log_level().into())
                .from_env_lossy(),
        )
        .with_target(false)
        .init();

    let thumbnailer = Thumbnailer::new(cli.options())?;
    if cli.list {
        println!("{}", thumbnailer.registry().to_json()?);
        return Ok(());
    }

    let location = cli.location.as_deref().ok_or_else(|| eyre!("no location given"))?;
    thumbnailer.run(location).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_onto_options() {
        let cli = Cli::try_parse_from([
            "xdg_thumbnailer",
            "-s",
            "-j",
            "3",
            "--cache-dir",
            "/tmp/thumbs",
            "--thumbnailers-dir",
            "/a",
            "--thumbnailers-dir",
            "/b",
            "--check-try-exec",
            "photos",
        ])
        .expect("valid arguments");
        let options = cli.options();

        assert!(options.skip_if_exists);
        assert_eq!(options.jobs, 3);
        assert_eq!(options.cache_root, PathBuf::from("/tmp/thumbs"));
        assert_eq!(options.thumbnailer_dirs, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(options.try_exec, TryExecPolicy::Require);
        assert_eq!(cli.log_level(), LevelFilter::INFO);
    }

    #[test]
    fn verbosity_flags() {
        let debug = Cli::try_parse_from(["xdg_thumbnailer", "-d", "."]).expect("valid arguments");
        assert_eq!(debug.log_level(), LevelFilter::DEBUG);
        let quiet = Cli::try_parse_from(["xdg_thumbnailer", "-q", "."]).expect("valid arguments");
        assert_eq!(quiet.log_level(), LevelFilter::OFF);
        assert!(Cli::try_parse_from(["xdg_thumbnailer", "-d", "-q", "."]).is_err());
    }

    #[test]
    fn location_is_required_unless_listing() {
        assert!(Cli::try_parse_from(["xdg_thumbnailer"]).is_err());
        assert!(Cli::try_parse_from(["xdg_thumbnailer", "--list"]).is_ok());
        assert!(Cli::try_parse_from(["xdg_thumbnailer", "-j", "0", "."]).is_err());
    }
}
