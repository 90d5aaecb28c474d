use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use keyprompt_tui::PasteConfig;
use toml_edit::DocumentMut;
use toml_edit::Item as TomlItem;
use toml_edit::Table as TomlTable;
use toml_edit::value;

use crate::atomic_write::write_atomic_secret;

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn new_default() -> anyhow::Result<Self> {
        let Some(home) = dirs::home_dir() else {
            anyhow::bail!("cannot determine home directory for config path");
        };
        Ok(Self::new(default_config_path(&home)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Paste tuning from `[paste]`. Missing, invalid or zero values keep the defaults.
    pub fn paste_config(&self) -> anyhow::Result<PasteConfig> {
        let mut config = PasteConfig::default();
        let Some(content) = read_document_string(&self.path)? else {
            return Ok(config);
        };

        let read_ms = |key: &str| -> Option<u64> {
            let raw = match content.parse::<DocumentMut>() {
                Ok(doc) => doc
                    .get("paste")
                    .and_then(TomlItem::as_table)
                    .and_then(|paste| paste.get(key))
                    .and_then(TomlItem::as_value)
                    .and_then(|v| v.as_integer())
                    .and_then(|v| u64::try_from(v).ok()),
                Err(_) => parse_table_value_fallback(&content, "paste", key)
                    .and_then(|token| token.parse::<u64>().ok()),
            };
            raw.filter(|ms| *ms > 0)
        };

        if let Some(ms) = read_ms("focus_freshness_ms") {
            config.focus_freshness = Duration::from_millis(ms);
        }
        if let Some(ms) = read_ms("clipboard_timeout_ms") {
            config.clipboard_timeout = Duration::from_millis(ms);
        }
        Ok(config)
    }

    pub fn provider_api_key(&self, provider_id: &str) -> anyhow::Result<Option<String>> {
        let Some(content) = read_document_string(&self.path)? else {
            return Ok(None);
        };

        let key = match content.parse::<DocumentMut>() {
            Ok(doc) => read_provider_api_key(&doc, provider_id),
            Err(_) => {
                let table = format!("providers.{provider_id}");
                parse_table_value_fallback(&content, &table, "api_key").map(unquote)
            }
        };
        Ok(key.filter(|key| !key.is_empty()))
    }

    pub fn set_provider_api_key(&self, provider_id: &str, api_key: &str) -> anyhow::Result<()> {
        // If the existing file can't be read, don't clobber it.
        let content = read_document_string(&self.path)?.unwrap_or_default();

        let updated = match content.parse::<DocumentMut>() {
            Ok(mut doc) => {
                set_provider_api_key(&mut doc, provider_id, api_key);
                doc.to_string()
            }
            Err(_) => append_provider_fallback(&content, provider_id, api_key),
        };

        write_atomic_secret(&self.path, &updated)
    }
}

/// Table name used under `[providers]`, e.g. `OpenAI` -> `openai`.
pub fn provider_id(provider_name: &str) -> String {
    provider_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

fn default_config_path(home: &Path) -> PathBuf {
    home.join(".keyprompt").join("config.toml")
}

fn read_provider_api_key(doc: &DocumentMut, provider_id: &str) -> Option<String> {
    doc.get("providers")
        .and_then(TomlItem::as_table)
        .and_then(|providers| providers.get(provider_id))
        .and_then(TomlItem::as_table)
        .and_then(|provider| provider.get("api_key"))
        .and_then(TomlItem::as_value)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn set_provider_api_key(doc: &mut DocumentMut, provider_id: &str, api_key: &str) {
    let providers = ensure_table_for_write(doc.as_table_mut(), "providers");
    // Render as `[providers.<id>]` only.
    providers.set_implicit(true);
    let provider = ensure_table_for_write(providers, provider_id);
    provider["api_key"] = value(api_key);
}

/// Line-based lookup of `key = token` inside `[table]`, used when the file is not valid TOML.
/// Returns the raw token with any trailing comment removed.
fn parse_table_value_fallback<'a>(contents: &'a str, table: &str, key: &str) -> Option<&'a str> {
    let mut in_table = false;
    let mut result = None;

    for line in contents.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            in_table = parse_table_header_name(trimmed) == Some(table);
            continue;
        }

        if !in_table {
            continue;
        }

        let Some(line) = strip_toml_comment(trimmed) else {
            continue;
        };
        let Some((line_key, token)) = line.split_once('=') else {
            continue;
        };
        if line_key.trim() != key {
            continue;
        }

        let token = token.trim();
        if !token.is_empty() {
            result = Some(token);
        }
    }

    result
}

fn unquote(token: &str) -> String {
    let stripped = token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .or_else(|| token.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')));
    stripped.unwrap_or(token).to_string()
}

fn parse_table_header_name(line: &str) -> Option<&str> {
    let line = line.trim_start();
    if !line.starts_with('[') {
        return None;
    }
    let end = line.find(']')?;
    if end <= 1 {
        return None;
    }
    let name = line[1..end].trim();
    if name.is_empty() {
        return None;
    }
    Some(name)
}

fn strip_toml_comment(line: &str) -> Option<&str> {
    let line = line.split_once('#').map_or(line, |(head, _)| head).trim();
    if line.is_empty() { None } else { Some(line) }
}

fn ensure_table_for_write<'a>(parent: &'a mut TomlTable, key: &str) -> &'a mut TomlTable {
    if !parent.get(key).is_some_and(TomlItem::is_table) {
        let mut table = TomlTable::new();
        table.set_implicit(false);
        parent.insert(key, TomlItem::Table(table));
    }
    match parent.get_mut(key).and_then(TomlItem::as_table_mut) {
        Some(table) => table,
        None => unreachable!("expected `{key}` to be a table"),
    }
}

fn append_provider_fallback(existing: &str, provider_id: &str, api_key: &str) -> String {
    let mut out = existing.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&format!("[providers.{provider_id}]\n"));
    out.push_str(&format!("api_key = {}\n", value(api_key)));
    out
}

fn read_document_string(path: &Path) -> anyhow::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(anyhow::Error::new(err).context("read config.toml")),
    }
}
