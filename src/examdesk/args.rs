use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "examdesk")]
#[command(about = "Timed multiple-choice exams that survive restarts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the store and default settings
    Init,

    /// List, get or set user settings
    Settings {
        /// Setting name (e.g. timeLimit, practiceMode)
        name: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },

    /// Import a question set from a JSON file
    Import {
        file: PathBuf,

        /// Only keep questions of these levels (repeatable)
        #[arg(short, long = "level")]
        levels: Vec<u32>,
    },

    /// Take the exam
    #[command(subcommand)]
    Exam(ExamCommand),

    /// Show the results of the last submitted exam
    Results {
        /// Delete stored results instead
        #[arg(long)]
        clear: bool,
    },

    /// Clear stored data
    Clear {
        /// Only clear exam data (question sets, exam in progress)
        #[arg(long)]
        exam: bool,
    },

    /// Migrate a legacy key/value dump
    Migrate { file: PathBuf },

    /// Get or set configuration
    Config {
        /// Configuration key (e.g., tab-leave-limit)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}

/// Question numbers start at 1.
#[derive(Subcommand, Debug)]
pub enum ExamCommand {
    /// Start a new exam or resume the one in progress
    Start,
    /// Show the current question and timer
    Status,
    /// Answer a question (option as letter or number)
    Answer { question: usize, option: String },
    /// Clear the answer to a question
    Clear { question: usize },
    /// Toggle the review mark on a question
    Review { question: usize },
    /// Remove two wrong options from a question
    Fifty { question: usize },
    /// Go to the next question
    #[command(alias = "n")]
    Next,
    /// Go to the previous question
    #[command(alias = "p")]
    Prev,
    /// Jump to a question
    Goto { question: usize },
    /// Record leaving the exam
    Leave,
    /// Submit the exam
    Submit,
}
