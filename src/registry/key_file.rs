use std::collections::HashMap;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyFileError {
    #[error("line {0}: entry outside of any group")]
    EntryOutsideGroup(usize),
    #[error("line {0}: unterminated group header")]
    BadGroupHeader(usize),
    #[error("line {0}: expected `Key=Value`")]
    BadEntry(usize),
}

/// A parsed freedesktop key file (the format of `.desktop` and `.thumbnailer` files).
#[derive(Debug, Default)]
pub struct KeyFile {
    groups: HashMap<String, HashMap<String, String>>,
}

impl KeyFile {
    pub fn parse(text: &str) -> Result<Self, KeyFileError> {
        let mut groups: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current: Option<String> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let name = header
                    .strip_suffix(']')
                    .ok_or(KeyFileError::BadGroupHeader(line_no))?;
                groups.entry(name.to_string()).or_default();
                current = Some(name.to_string());
                continue;
            }

            let group = current
                .as_ref()
                .ok_or(KeyFileError::EntryOutsideGroup(line_no))?;
            let (key, value) = line.split_once('=').ok_or(KeyFileError::BadEntry(line_no))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(KeyFileError::BadEntry(line_no));
            }
            groups
                .entry(group.clone())
                .or_default()
                .insert(key.to_string(), value.trim().to_string());
        }

        Ok(Self { groups })
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    /// The raw value of `key` in `group`, with no escape or `%` processing.
    pub fn get(&self, group: &str, key: &str) -> Option<&str> {
        self.groups.get(group)?.get(key).map(String::as_str)
    }

    /// A `;`-separated list value with empty items removed.
    pub fn get_list(&self, group: &str, key: &str) -> Option<Vec<String>> {
        self.get(group, key).map(|value| {
            value
                .split(';')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}
