pub mod key_file;

use crate::config::{ThumbnailerOptions, TryExecPolicy};
use crate::registry::key_file::{KeyFile, KeyFileError};
use color_eyre::eyre::WrapErr;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const GROUP: &str = "Thumbnailer Entry";

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("cannot read {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("malformed thumbnailer {0}: {1}")]
    Parse(PathBuf, #[source] KeyFileError),
    #[error("{0} has no [Thumbnailer Entry] group")]
    MissingGroup(PathBuf),
    #[error("{0} is missing the required `{1}` key")]
    MissingKey(PathBuf, &'static str),
    #[error("TryExec program `{1}` of {0} was not found")]
    TryExecNotFound(PathBuf, String),
}

/// One `.thumbnailer` file: which MIME types it handles and how to run it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ThumbnailerDefinition {
    /// The file the definition was read from.
    pub source: PathBuf,
    pub mime_types: Vec<String>,
    /// Command template, with `%i %o %s %u %%` left unexpanded.
    pub exec: String,
    /// Program looked up for availability; only checked under `TryExecPolicy::Require`.
    pub try_exec: String,
}

impl ThumbnailerDefinition {
    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        let text = fs::read_to_string(path).map_err(|e| RegistryError::Read(path.into(), e))?;
        Self::parse(path, &text)
    }

    pub fn parse(source: &Path, text: &str) -> Result<Self, RegistryError> {
        let file = KeyFile::parse(text).map_err(|e| RegistryError::Parse(source.into(), e))?;
        if !file.has_group(GROUP) {
            return Err(RegistryError::MissingGroup(source.into()));
        }
        let mime_types = file
            .get_list(GROUP, "MimeType")
            .ok_or(RegistryError::MissingKey(source.into(), "MimeType"))?;
        let exec = file
            .get(GROUP, "Exec")
            .filter(|exec| !exec.is_empty())
            .ok_or(RegistryError::MissingKey(source.into(), "Exec"))?
            .to_string();
        let try_exec = file
            .get(GROUP, "TryExec")
            .ok_or(RegistryError::MissingKey(source.into(), "TryExec"))?
            .to_string();

        Ok(Self {
            source: source.into(),
            mime_types,
            exec,
            try_exec,
        })
    }

    /// Whether the `TryExec` program exists, either as a path or on `PATH`.
    pub fn is_available(&self) -> bool {
        which::which(&self.try_exec).is_ok()
    }
}

/// MIME type to thumbnailer map; the definition loaded last wins a MIME type.
#[derive(Debug, Default)]
pub struct Registry {
    definitions: Vec<ThumbnailerDefinition>,
    by_mime: BTreeMap<String, usize>,
}

impl Registry {
    pub fn insert(&mut self, definition: ThumbnailerDefinition) {
        let idx = self.definitions.len();
        for mime in &definition.mime_types {
            if let Some(previous) = self.by_mime.insert(mime.clone(), idx) {
                tracing::debug!(
                    "{mime} moves from {} to {}",
                    self.definitions[previous].source.display(),
                    definition.source.display()
                );
            }
        }
        self.definitions.push(definition);
    }

    pub fn lookup(&self, mime_type: &str) -> Option<&ThumbnailerDefinition> {
        self.by_mime.get(mime_type).map(|&idx| &self.definitions[idx])
    }

    /// Number of registered MIME types.
    pub fn len(&self) -> usize {
        self.by_mime.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_mime.is_empty()
    }

    pub fn mime_types(&self) -> impl Iterator<Item = &str> {
        self.by_mime.keys().map(String::as_str)
    }

    /// The registry as a `{ mime type: definition }` JSON object, sorted by MIME type.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let view: BTreeMap<&str, &ThumbnailerDefinition> = self
            .by_mime
            .iter()
            .map(|(mime, &idx)| (mime.as_str(), &self.definitions[idx]))
            .collect();
        serde_json::to_string_pretty(&view)
    }
}

/// Every regular file directly inside `dir`, in the order the filesystem lists them.
/// A directory that does not exist yields nothing.
pub fn thumbnailer_files(dir: &Path) -> color_eyre::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(vec![]);
    }
    let mut files = vec![];
    let entries =
        fs::read_dir(dir).wrap_err_with(|| format!("cannot list {}", dir.display()))?;
    for entry in entries {
        let path = entry
            .wrap_err_with(|| format!("cannot list {}", dir.display()))?
            .path();
        // `is_file` follows symlinks, so linked definitions count too.
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

/// Builds the registry from the configured thumbnailer directories.
///
/// Broken definition files are logged and skipped. An existing directory that
/// cannot be listed is an error.
pub fn load_registry(options: &ThumbnailerOptions) -> color_eyre::Result<Registry> {
    let mut registry = Registry::default();

    for dir in &options.thumbnailer_dirs {
        for file in thumbnailer_files(dir)? {
            tracing::debug!("Reading thumbnailer {}", file.display());
            match load_definition(&file, options.try_exec) {
                Ok(definition) => {
                    tracing::debug!("Registered MIME types: {:?}", definition.mime_types);
                    registry.insert(definition);
                }
                Err(e) => tracing::warn!("Skipping thumbnailer: {e}"),
            }
        }
    }

    tracing::debug!("{} MIME types have a thumbnailer", registry.len());
    Ok(registry)
}

fn load_definition(
    file: &Path,
    policy: TryExecPolicy,
) -> Result<ThumbnailerDefinition, RegistryError> {
    let definition = ThumbnailerDefinition::from_file(file)?;
    if policy == TryExecPolicy::Require && !definition.is_available() {
        return Err(RegistryError::TryExecNotFound(
            definition.source,
            definition.try_exec,
        ));
    }
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use temp_dir::TempDir;

    fn options_for(dirs: &[&Path]) -> ThumbnailerOptions {
        ThumbnailerOptions {
            thumbnailer_dirs: dirs.iter().map(|d| d.to_path_buf()).collect(),
            ..Default::default()
        }
    }

    fn write_thumbnailer(dir: &Path, name: &str, mime: &str, exec: &str) -> PathBuf {
        let path = dir.join(name);
        let text = format!("[Thumbnailer Entry]\nTryExec=true\nExec={exec}\nMimeType={mime}\n");
        fs::write(&path, text).expect("write thumbnailer");
        path
    }

    #[test]
    fn later_directory_overrides_mime_type() -> color_eyre::Result<()> {
        let system = TempDir::new()?;
        let user = TempDir::new()?;
        write_thumbnailer(system.path(), "a.thumbnailer", "image/png;image/gif;", "a %i %o");
        let b = write_thumbnailer(user.path(), "b.thumbnailer", "image/png;", "b %u %o");

        let registry = load_registry(&options_for(&[system.path(), user.path()]))?;

        assert_eq!(registry.len(), 2);
        let png = registry.lookup("image/png").expect("png registered");
        assert_eq!(png.source, b);
        assert_eq!(png.exec, "b %u %o");
        assert_eq!(registry.lookup("image/gif").map(|d| d.exec.as_str()), Some("a %i %o"));
        assert!(registry.lookup("image/jpeg").is_none());
        Ok(())
    }

    #[test]
    fn insert_keeps_last_definition_for_shared_type() {
        let first = ThumbnailerDefinition {
            source: "first.thumbnailer".into(),
            mime_types: vec!["image/png".into()],
            exec: "first %o".into(),
            try_exec: "true".into(),
        };
        let second = ThumbnailerDefinition {
            source: "second.thumbnailer".into(),
            exec: "second %o".into(),
            ..first.clone()
        };

        let mut registry = Registry::default();
        registry.insert(first);
        registry.insert(second.clone());

        assert_eq!(registry.mime_types().collect::<Vec<_>>(), vec!["image/png"]);
        assert_eq!(registry.lookup("image/png"), Some(&second));
    }

    #[test]
    fn broken_files_are_skipped() -> color_eyre::Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("no-group.thumbnailer"), "[Desktop Entry]\nExec=x\n")?;
        fs::write(
            dir.path().join("no-exec.thumbnailer"),
            "[Thumbnailer Entry]\nMimeType=text/plain\n",
        )?;
        fs::write(dir.path().join("garbage.thumbnailer"), "not a key file")?;
        fs::create_dir(dir.path().join("subdir"))?;
        write_thumbnailer(dir.path(), "ok.thumbnailer", "video/mp4", "ok %i %o");

        let registry = load_registry(&options_for(&[dir.path()]))?;

        assert_eq!(registry.mime_types().collect::<Vec<_>>(), vec!["video/mp4"]);
        Ok(())
    }

    #[test]
    fn missing_directories_are_ignored() -> color_eyre::Result<()> {
        let dir = TempDir::new()?;
        let missing = dir.path().join("nope");
        let registry = load_registry(&options_for(&[&missing]))?;
        assert!(registry.is_empty());
        Ok(())
    }

    #[test]
    fn parse_reports_missing_pieces() {
        let src = Path::new("x.thumbnailer");
        assert!(matches!(
            ThumbnailerDefinition::parse(src, "[Other]\nExec=a\n"),
            Err(RegistryError::MissingGroup(_))
        ));
        assert!(matches!(
            ThumbnailerDefinition::parse(src, "[Thumbnailer Entry]\nExec=a\n"),
            Err(RegistryError::MissingKey(_, "MimeType"))
        ));
        assert!(matches!(
            ThumbnailerDefinition::parse(src, "[Thumbnailer Entry]\nMimeType=a/b\nExec=\n"),
            Err(RegistryError::MissingKey(_, "Exec"))
        ));
    }

    #[test]
    fn missing_try_exec_rejects_the_file() -> color_eyre::Result<()> {
        assert!(matches!(
            ThumbnailerDefinition::parse(
                Path::new("x.thumbnailer"),
                "[Thumbnailer Entry]\nMimeType=a/b\nExec=tool %i %o\n",
            ),
            Err(RegistryError::MissingKey(_, "TryExec"))
        ));

        let dir = TempDir::new()?;
        fs::write(
            dir.path().join("no-try-exec.thumbnailer"),
            "[Thumbnailer Entry]\nExec=tool %i %o\nMimeType=image/x-untried\n",
        )?;
        assert!(load_registry(&options_for(&[dir.path()]))?.is_empty());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn require_policy_drops_unavailable_thumbnailers() -> color_eyre::Result<()> {
        let dir = TempDir::new()?;
        fs::write(
            dir.path().join("missing.thumbnailer"),
            "[Thumbnailer Entry]\nTryExec=/nonexistent/bin/thumbnailer\nExec=x %o\nMimeType=image/x-missing\n",
        )?;
        write_thumbnailer(dir.path(), "present.thumbnailer", "image/x-present", "true %o");

        let mut options = options_for(&[dir.path()]);
        let lenient = load_registry(&options)?;
        assert_eq!(lenient.len(), 2);

        options.try_exec = TryExecPolicy::Require;
        let strict = load_registry(&options)?;
        assert!(strict.lookup("image/x-missing").is_none());
        assert!(strict.lookup("image/x-present").is_some());
        Ok(())
    }

    #[test]
    fn json_listing_is_keyed_by_mime_type() -> color_eyre::Result<()> {
        let mut registry = Registry::default();
        registry.insert(ThumbnailerDefinition {
            source: "t.thumbnailer".into(),
            mime_types: vec!["image/png".into()],
            exec: "t %o".into(),
            try_exec: "true".into(),
        });
        let value: serde_json::Value = serde_json::from_str(&registry.to_json()?)?;
        assert_eq!(value["image/png"]["exec"], "t %o");
        Ok(())
    }
}
