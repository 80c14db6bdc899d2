use crate::app::StartupReport;
use crate::commands::migrate::summarize;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use std::path::Path;

/// Report what the startup sequence did. Startup itself already ran.
pub fn run(startup: &StartupReport, root: &Path) -> Result<CmdResult> {
    let mut result = CmdResult::default();

    if startup.volatile {
        result.add_message(CmdMessage::warning(format!(
            "Storage at {} is unavailable; changes will be lost when this command exits",
            root.display()
        )));
    } else {
        result.add_message(CmdMessage::success(format!(
            "Initialized examdesk store at {}",
            root.display()
        )));
    }

    if let Some(report) = &startup.migration {
        for message in summarize(report) {
            result.add_message(message);
        }
    }

    if startup.defaults_written.is_empty() {
        result.add_message(CmdMessage::info("Settings already initialized"));
    } else {
        result.add_message(CmdMessage::info(format!(
            "Wrote default settings: {}",
            startup.defaults_written.join(", ")
        )));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;

    #[test]
    fn test_reports_defaults() {
        let startup = StartupReport {
            defaults_written: vec!["timeLimit", "darkMode"],
            ..Default::default()
        };
        let result = run(&startup, Path::new("/data")).unwrap();
        assert_eq!(result.messages[0].level, MessageLevel::Success);
        assert!(result.messages[1].content.contains("timeLimit, darkMode"));
    }

    #[test]
    fn test_warns_when_volatile() {
        let startup = StartupReport {
            volatile: true,
            ..Default::default()
        };
        let result = run(&startup, Path::new("/data")).unwrap();
        assert_eq!(result.messages[0].level, MessageLevel::Warning);
        assert_eq!(result.messages[1].content, "Settings already initialized");
    }
}
