use crate::commands::{CmdMessage, CmdResult};
use crate::data::DataManager;
use crate::error::Result;
use crate::model::{settings, Partition};
use crate::store::backend::StorageBackend;
use serde_json::Value;

#[derive(Debug, Clone)]
pub enum SettingsAction {
    ShowAll,
    Show(String),
    Set(String, String),
}

pub fn run<B: StorageBackend>(data: &DataManager<B>, action: SettingsAction) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    match action {
        SettingsAction::ShowAll => Ok(result.with_settings(data.user_settings())),
        SettingsAction::Show(name) => {
            // A stored null is a value; only an absent record is unset.
            match data.store().partition(Partition::UserSettings).get::<Value>(&name) {
                Ok(Some(value)) => {
                    result.add_message(CmdMessage::info(format!("{} = {}", name, value)))
                }
                Ok(None) => result.add_message(CmdMessage::warning(format!("{} is not set", name))),
                Err(e) => result.add_message(CmdMessage::error(format!(
                    "Could not read {}: {}",
                    name, e
                ))),
            }
            Ok(result)
        }
        SettingsAction::Set(name, raw) => {
            let value = match parse_value(&name, &raw) {
                Ok(value) => value,
                Err(msg) => {
                    result.add_message(CmdMessage::error(msg));
                    return Ok(result);
                }
            };
            if data.set_user_setting(&name, &value) {
                result.add_message(CmdMessage::success(format!("{} set to {}", name, value)));
            } else {
                result.add_message(CmdMessage::error(format!("Could not save {}", name)));
            }
            Ok(result)
        }
    }
}

/// Typed parsing for the settings the app understands; anything else is
/// stored as JSON when it parses, else as a string.
fn parse_value(name: &str, raw: &str) -> std::result::Result<Value, String> {
    match name {
        settings::TIME_LIMIT => match raw.parse::<u64>() {
            Ok(0) | Err(_) => Err(format!("{} must be a positive number of minutes", name)),
            Ok(minutes) => Ok(Value::from(minutes)),
        },
        settings::PRACTICE_MODE | settings::DARK_MODE | settings::MIGRATION_COMPLETED => {
            match raw {
                "true" | "on" | "yes" => Ok(Value::Bool(true)),
                "false" | "off" | "no" => Ok(Value::Bool(false)),
                _ => Err(format!("{} must be true or false", name)),
            }
        }
        _ => Ok(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;
    use crate::store::mem_backend::MemBackend;

    fn manager() -> DataManager<MemBackend> {
        let mut data = DataManager::open(MemBackend::new()).unwrap();
        data.initialize_app();
        data
    }

    #[test]
    fn test_stored_null_is_not_reported_as_unset() {
        let data = manager();
        run(&data, SettingsAction::Set("lastImport".into(), "null".into())).unwrap();

        let result = run(&data, SettingsAction::Show("lastImport".into())).unwrap();
        assert_eq!(result.messages[0].level, MessageLevel::Info);
        assert_eq!(result.messages[0].content, "lastImport = null");

        let result = run(&data, SettingsAction::Show("neverSet".into())).unwrap();
        assert_eq!(result.messages[0].level, MessageLevel::Warning);
    }

    #[test]
    fn test_show_all_lists_defaults() {
        let data = manager();
        let result = run(&data, SettingsAction::ShowAll).unwrap();
        let settings = result.settings.unwrap();
        assert_eq!(settings["timeLimit"], Value::from(60));
        assert_eq!(settings["darkMode"], Value::Bool(false));
    }

    #[test]
    fn test_set_typed_setting() {
        let data = manager();
        let result = run(
            &data,
            SettingsAction::Set("practiceMode".into(), "on".into()),
        )
        .unwrap();
        assert_eq!(result.messages[0].level, MessageLevel::Success);
        assert!(data.get_user_setting("practiceMode", false));
    }

    #[test]
    fn test_rejects_invalid_time_limit() {
        let data = manager();
        let result = run(&data, SettingsAction::Set("timeLimit".into(), "0".into())).unwrap();
        assert!(result.has_errors());
        assert_eq!(data.get_user_setting("timeLimit", 0), 60);
    }

    #[test]
    fn test_free_form_setting() {
        let data = manager();
        run(&data, SettingsAction::Set("fontSize".into(), "14".into())).unwrap();
        run(&data, SettingsAction::Set("theme".into(), "solarized".into())).unwrap();
        assert_eq!(data.get_user_setting("fontSize", 0), 14);
        assert_eq!(data.get_user_setting("theme", String::new()), "solarized");
    }

    #[test]
    fn test_show_missing_setting() {
        let data = manager();
        let result = run(&data, SettingsAction::Show("nope".into())).unwrap();
        assert_eq!(result.messages[0].level, MessageLevel::Warning);
    }
}
