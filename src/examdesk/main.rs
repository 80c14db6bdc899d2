use chrono::{DateTime, Utc};
use clap::Parser;
use colored::*;
use examdesk::app::{App, ConfigAction, ExamAction, SettingsAction};
use examdesk::commands::exam::{parse_option, question_index};
use examdesk::commands::{option_label, CmdMessage, CmdResult, MessageLevel, QuestionView};
use examdesk::config::{self, AppConfig, KEYS};
use examdesk::error::Result;
use examdesk::exam::report::Outcome;
use examdesk::exam::{ExamReport, ExamStatus, TimeLeft};
use examdesk::logging::{init_logging, LogConfig};

mod args;
use args::{Cli, Commands, ExamCommand};

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns false when the command reported an error message.
fn run() -> Result<bool> {
    let cli = Cli::parse();

    let root = config::data_root()?;
    let mut config = AppConfig::load(&root)?;
    if let Commands::Migrate { file } = &cli.command {
        // Migrate before defaults are seeded so legacy settings win.
        config.legacy_import = Some(file.clone());
    }
    init_logging(&LogConfig::new(cli.verbose, config.log_filter.clone()));

    let app = App::start(root, config)?;
    if app.startup().volatile && !matches!(cli.command, Commands::Init) {
        print_messages(&[CmdMessage::warning(
            "Storage unavailable; changes will not be kept",
        )]);
    }

    let result = match cli.command {
        Commands::Init => app.init()?,
        Commands::Settings { name, value } => app.settings(match (name, value) {
            (None, _) => SettingsAction::ShowAll,
            (Some(name), None) => SettingsAction::Show(name),
            (Some(name), Some(value)) => SettingsAction::Set(name, value),
        })?,
        Commands::Import { file, levels } => app.import(&file, &levels)?,
        Commands::Exam(command) => app.exam(exam_action(command)?)?,
        Commands::Results { clear: true } => app.clear_results()?,
        Commands::Results { clear: false } => app.results()?,
        Commands::Clear { exam } => app.clear(exam)?,
        Commands::Migrate { file } => app.migrate(&file)?,
        Commands::Config { key, value } => app.config_command(match (key, value) {
            (None, _) => ConfigAction::ShowAll,
            (Some(key), None) => ConfigAction::ShowKey(key),
            (Some(key), Some(value)) => ConfigAction::Set(key, value),
        })?,
    };

    print_result(&result);
    Ok(!result.has_errors())
}

fn exam_action(command: ExamCommand) -> Result<ExamAction> {
    Ok(match command {
        ExamCommand::Start => ExamAction::Start,
        ExamCommand::Status => ExamAction::Status,
        ExamCommand::Answer { question, option } => ExamAction::Answer {
            question: question_index(question)?,
            option: parse_option(&option)?,
        },
        ExamCommand::Clear { question } => ExamAction::Clear(question_index(question)?),
        ExamCommand::Review { question } => ExamAction::Review(question_index(question)?),
        ExamCommand::Fifty { question } => ExamAction::FiftyFifty(question_index(question)?),
        ExamCommand::Next => ExamAction::Next,
        ExamCommand::Prev => ExamAction::Previous,
        ExamCommand::Goto { question } => ExamAction::GoTo(question_index(question)?),
        ExamCommand::Leave => ExamAction::Leave,
        ExamCommand::Submit => ExamAction::Submit,
    })
}

fn print_result(result: &CmdResult) {
    print_messages(&result.messages);

    if let Some(settings) = &result.settings {
        if settings.is_empty() {
            println!("No settings stored.");
        }
        for (name, value) in settings {
            println!("{} = {}", name, value);
        }
    }
    if let Some(config) = &result.config {
        for key in KEYS {
            println!("{} = {}", key, config.get(key).unwrap_or_default());
        }
    }
    if let Some(question) = &result.question {
        print_question(question);
    }
    if let Some(status) = &result.status {
        print_status(status);
    }
    if let Some(report) = &result.report {
        print_report(report);
    }
}

fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

fn print_question(view: &QuestionView) {
    let header = format!("Question {}/{}", view.index + 1, view.total);
    let marker = if view.marked { " ⚑" } else { "" };
    println!("\n{}{}", header.bold(), marker.yellow());
    println!("{}\n", view.text);

    for (i, option) in view.options.iter().enumerate() {
        let line = format!("{}. {}", option_label(i), option);
        if view.hidden.contains(&i) {
            println!("    {}", line.dimmed().strikethrough());
        } else if view.selected == Some(i) {
            println!("  › {}", line.green().bold());
        } else {
            println!("    {}", line);
        }
    }
    println!();
}

fn print_status(status: &ExamStatus) {
    let time = match status.time_left {
        TimeLeft::Unbounded => "practice".to_string(),
        left => left.to_string(),
    };
    let time = if status.time_expired {
        time.red()
    } else {
        time.normal()
    };
    println!(
        "{} answered · {} marked · {} left · {} · started {}",
        format!("{}/{}", status.answered, status.question_count).bold(),
        status.marked_for_review,
        time,
        status.phase,
        format_time_ago(status.started_at).dimmed()
    );
}

fn print_report(report: &ExamReport) {
    println!(
        "\n{} {}/{} ({:.1}%)",
        "Score".bold(),
        report.correct,
        report.total,
        report.percentage
    );
    println!(
        "{} correct · {} incorrect · {} unanswered · {} marked for review",
        report.correct.to_string().green(),
        report.incorrect.to_string().red(),
        report.unanswered.to_string().yellow(),
        report.marked_for_review
    );

    if report.levels.len() > 1 {
        println!();
        for level in &report.levels {
            println!("  Level {}: {}/{}", level.level, level.correct, level.total);
        }
    }

    println!();
    for q in &report.questions {
        let selected = q
            .selected
            .map(|s| option_label(s).to_string())
            .unwrap_or_else(|| "-".to_string());
        let line = match q.outcome {
            Outcome::Correct => format!("{:>3}. {} {}", q.index + 1, "✓".green(), selected),
            Outcome::Incorrect => format!(
                "{:>3}. {} {} (answer {})",
                q.index + 1,
                "✗".red(),
                selected,
                option_label(q.correct)
            ),
            Outcome::Unanswered => format!(
                "{:>3}. {} (answer {})",
                q.index + 1,
                "·".yellow(),
                option_label(q.correct)
            ),
        };
        let marker = if q.marked_for_review { " ⚑" } else { "" };
        println!("{}{}", line, marker.yellow());
    }
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    timeago::Formatter::new().convert(duration.to_std().unwrap_or_default())
}
