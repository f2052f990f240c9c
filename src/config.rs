use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// System-wide thumbnailer directories, searched before the per-user one.
pub const SYSTEM_THUMBNAILER_DIRS: [&str; 2] =
    ["/usr/share/thumbnailers", "/usr/local/share/thumbnailers"];

/// What to do with the `TryExec` key of a thumbnailer definition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TryExecPolicy {
    /// Read the key but register the thumbnailer regardless.
    #[default]
    Ignore,
    /// Only register thumbnailers whose `TryExec` program can be found.
    Require,
}

/// An external MIME classifier, invoked as `program args... <file>`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ClassifierCommand {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|x| x.to_string()).collect(),
        }
    }
}

/// Everything the registry loader, type resolver and generator need for a run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThumbnailerOptions {
    /// Root of the thumbnail cache; `normal/` and `large/` live below it.
    pub cache_root: PathBuf,
    /// Directories scanned for `*.thumbnailer` definitions, in load order.
    pub thumbnailer_dirs: Vec<PathBuf>,
    /// Leave thumbnails that already exist in the cache alone.
    pub skip_if_exists: bool,
    pub try_exec: TryExecPolicy,
    /// How many files are processed at once. `1` keeps strict traversal order.
    pub jobs: usize,
    /// Content sniffer used when the extension gives no answer.
    pub classifier: Option<ClassifierCommand>,
    /// Second opinion asked when `classifier` only reports `application/octet-stream`.
    pub fallback_classifier: Option<ClassifierCommand>,
}

impl Default for ThumbnailerOptions {
    fn default() -> Self {
        Self {
            cache_root: default_cache_root(),
            thumbnailer_dirs: default_thumbnailer_dirs(),
            skip_if_exists: false,
            try_exec: TryExecPolicy::Ignore,
            jobs: 1,
            classifier: Some(ClassifierCommand::new("file", &["--mime-type", "-Lb"])),
            fallback_classifier: Some(ClassifierCommand::new(
                "mimetype",
                &["--output-format", "%m"],
            )),
        }
    }
}

/// `$XDG_CACHE_HOME/thumbnails`, falling back to `~/.cache/thumbnails`.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("thumbnails")
}

/// The system directories followed by `$XDG_DATA_HOME/thumbnailers`.
pub fn default_thumbnailer_dirs() -> Vec<PathBuf> {
    let mut search: Vec<PathBuf> = SYSTEM_THUMBNAILER_DIRS.iter().map(PathBuf::from).collect();
    if let Some(data_dir) = dirs::data_dir() {
        search.push(data_dir.join("thumbnailers"));
    }
    search
}
