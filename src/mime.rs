use crate::command::stdout_of;
use crate::config::{ClassifierCommand, ThumbnailerOptions};
use std::ffi::OsStr;
use std::path::Path;

/// What content sniffers answer when they cannot tell.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Works out a file's MIME type: extension table first, then external classifiers.
#[derive(Clone, Debug, Default)]
pub struct TypeResolver {
    classifier: Option<ClassifierCommand>,
    fallback_classifier: Option<ClassifierCommand>,
}

impl TypeResolver {
    pub fn new(options: &ThumbnailerOptions) -> Self {
        Self {
            classifier: options.classifier.clone(),
            fallback_classifier: options.fallback_classifier.clone(),
        }
    }

    /// Never fails. When nothing can classify the file the result is the best
    /// guess so far, which may be empty.
    pub async fn resolve_mime_type(&self, path: &Path) -> String {
        if let Some(mime) = mime_guess::from_path(path).first_raw() {
            return mime.to_string();
        }

        let mut mime = match &self.classifier {
            Some(classifier) => classify(classifier, path).await.unwrap_or_default(),
            None => String::new(),
        };

        if mime == OCTET_STREAM {
            if let Some(fallback) = &self.fallback_classifier {
                if let Some(better) = classify(fallback, path).await.filter(|m| !m.is_empty()) {
                    mime = better;
                }
            }
        }

        tracing::debug!("{} sniffed as {mime:?}", path.display());
        mime
    }
}

async fn classify(classifier: &ClassifierCommand, path: &Path) -> Option<String> {
    let mut args: Vec<&OsStr> = Vec::with_capacity(classifier.args.len() + 2);
    args.push(OsStr::new(&classifier.program));
    args.extend(classifier.args.iter().map(OsStr::new));
    args.push(path.as_os_str());
    stdout_of(&args).await
}
