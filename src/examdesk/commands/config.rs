//! `config.json` inspection and edits. Keys are checked against
//! [`KEYS`] before the file is touched.

use crate::commands::{CmdMessage, CmdResult};
use crate::config::{AppConfig, KEYS};
use crate::error::Result;
use std::path::Path;

#[derive(Debug, Clone)]
pub enum ConfigAction {
    ShowAll,
    ShowKey(String),
    /// An empty value unsets optional keys.
    Set(String, String),
}

pub fn run(root: &Path, action: ConfigAction) -> Result<CmdResult> {
    let key = match &action {
        ConfigAction::ShowAll => None,
        ConfigAction::ShowKey(key) | ConfigAction::Set(key, _) => Some(key.as_str()),
    };
    if let Some(key) = key.filter(|k| !KEYS.contains(k)) {
        return Ok(unknown_key(key));
    }

    let mut config = AppConfig::load(root)?;
    let mut result = CmdResult::default();
    match action {
        ConfigAction::ShowAll => return Ok(result.with_config(config)),
        ConfigAction::ShowKey(key) => {
            result.add_message(CmdMessage::info(describe(&config, &key)));
        }
        ConfigAction::Set(key, value) => {
            if let Err(e) = config.set(&key, &value) {
                result.add_message(CmdMessage::error(e));
                return Ok(result);
            }
            config.save(root)?;
            let message = if value.is_empty() {
                format!("{} unset", key)
            } else {
                format!("{} set to {}", key, config.get(&key).unwrap_or(value))
            };
            result.add_message(CmdMessage::success(message));
        }
    }
    Ok(result)
}

fn describe(config: &AppConfig, key: &str) -> String {
    match config.get(key).filter(|v| !v.is_empty()) {
        Some(value) => format!("{} = {}", key, value),
        None => format!("{} is not set", key),
    }
}

fn unknown_key(key: &str) -> CmdResult {
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::error(format!(
        "Unknown config key: {} (known: {})",
        key,
        KEYS.join(", ")
    )));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_set_persists() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), ConfigAction::Set("tab-leave-limit".into(), "5".into())).unwrap();

        let result = run(dir.path(), ConfigAction::ShowKey("tab-leave-limit".into())).unwrap();
        assert_eq!(result.messages[0].content, "tab-leave-limit = 5");
    }

    #[test]
    fn test_invalid_set_is_reported_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(dir.path(), ConfigAction::Set("tab-leave-limit".into(), "x".into())).unwrap();
        assert!(result.has_errors());
        assert!(!dir.path().join("config.json").exists());
    }

    #[test]
    fn test_unknown_key_does_not_read_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.json"), "{broken").unwrap();

        let result = run(dir.path(), ConfigAction::ShowKey("colour".into())).unwrap();
        assert!(result.has_errors());
        assert!(result.messages[0].content.contains("tab-leave-limit"));
    }

    #[test]
    fn test_unset_optional_key() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), ConfigAction::Set("log-filter".into(), "debug".into())).unwrap();

        let result = run(dir.path(), ConfigAction::Set("log-filter".into(), "".into())).unwrap();
        assert_eq!(result.messages[0].content, "log-filter unset");

        let result = run(dir.path(), ConfigAction::ShowKey("log-filter".into())).unwrap();
        assert_eq!(result.messages[0].content, "log-filter is not set");
    }

    #[test]
    fn test_show_all_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(dir.path(), ConfigAction::ShowAll).unwrap();
        assert_eq!(result.config, Some(AppConfig::default()));
    }
}
