//! CLI module for the daybook application
//!
//! This module handles the command-line interface for interacting with the
//! entry store. The CLI owns no persistence logic; it is a pure consumer
//! of [`EntryStore`] and is responsible for translating store failures
//! into user-visible messages.
use std::{
    fs::{read_to_string, OpenOptions},
    io::{stdin, stdout, Write},
    path::Path,
    process::Command,
};

use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use shell_words::split;
use tempfile::Builder;

use crate::{
    Commands, Config, DaybookError, EditEntryOptions, Entry, EntryPatch, EntryStore, FileMirror,
    FileStore, ListEntriesOptions, Result,
};

/// The production store: file-backed primary with a file-backed mirror.
pub type JournalStore = EntryStore<FileStore, FileMirror>;

/// CLI application handler - processes CLI commands and interfaces with
/// the entry store
pub struct App {
    /// The entry store backend
    store: JournalStore,

    /// Application configuration
    config: Config,
}

impl App {
    /// Create a new CLI application with the given store and config
    pub fn new(store: JournalStore, config: Config) -> Self {
        Self { store, config }
    }

    /// Run the CLI application with the given command
    pub async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::New {
                content,
                file,
                no_editor,
            } => self.handle_new(content, file, no_editor).await?,

            Commands::Show { id, json } => self.handle_show(id, json).await?,

            Commands::List(options) => self.handle_list(options).await?,

            Commands::Search { query, limit, json } => {
                self.handle_search(query, limit, json).await?
            }

            Commands::Edit(options) => self.handle_edit(options).await?,

            Commands::Delete { id, force } => self.handle_delete(id, force).await?,

            Commands::Count => self.handle_count().await?,

            Commands::Range { start, end, json } => self.handle_range(start, end, json).await?,
        }

        Ok(())
    }

    async fn handle_new(
        &self,
        content: Option<String>,
        file: Option<std::path::PathBuf>,
        no_editor: bool,
    ) -> Result<()> {
        // Get content based on the provided options
        let content = match (content, file) {
            (Some(c), _) => c,
            (_, Some(file_path)) => {
                if !file_path.exists() {
                    return Err(DaybookError::FileNotFound {
                        file_path: file_path.display().to_string(),
                    });
                }
                read_to_string(file_path)?
            }
            (None, None) => {
                if no_editor {
                    String::new()
                } else {
                    self.open_editor_for_content()?
                }
            }
        };

        // The store tolerates empty drafts; an explicit save does not.
        if content.trim().is_empty() {
            return Err(DaybookError::ApplicationError {
                message: "Refusing to save an empty entry".to_string(),
            });
        }

        let entry = self.store.new_entry(content);
        self.store.save_entry(&entry).await?;
        println!("Entry created with ID: {}", entry.id);
        Ok(())
    }

    async fn handle_show(&self, id: String, json: bool) -> Result<()> {
        let entry = self
            .store
            .get_entry(&id)
            .await
            .ok_or(DaybookError::EntryNotFound { id })?;

        if json {
            println!("{}", serde_json::to_string_pretty(&entry)?);
        } else {
            self.print_entry_header(&entry);
            println!("\n{}", entry.content);
        }
        Ok(())
    }

    /// List entries according to provided options
    async fn handle_list(&self, options: ListEntriesOptions) -> Result<()> {
        let limit = if options.all {
            None
        } else {
            Some(options.limit)
        };
        let entries = self.store.list_entries(limit).await;
        self.display_entries(&entries, options.json, options.brief)?;
        Ok(())
    }

    async fn handle_search(&self, query: String, limit: usize, json: bool) -> Result<()> {
        let mut results = self.store.search_entries(&query).await;

        // Apply limit if specified (0 means no limit)
        if limit > 0 && results.len() > limit {
            results.truncate(limit);
        }

        if results.is_empty() {
            println!("No entries found matching query: \"{}\"", query);
            return Ok(());
        }

        self.display_entries(&results, json, false)?;
        Ok(())
    }

    async fn handle_edit(&self, options: EditEntryOptions) -> Result<()> {
        // Validate input - check for conflicting content sources
        let content_sources =
            [options.content.is_some(), options.file.is_some(), options.edit]
                .iter()
                .filter(|&&set| set)
                .count();
        if content_sources > 1 {
            return Err(DaybookError::ApplicationError {
                message: "Specify at most one of --content, --file, and --edit".to_string(),
            });
        }

        if let Some(score) = options.mood_score {
            if !(0.0..=1.0).contains(&score) {
                return Err(DaybookError::ApplicationError {
                    message: format!("Mood score must be in [0, 1], got {}", score),
                });
            }
        }

        // Determine the new content, if any
        let content = if let Some(content) = options.content {
            Some(content)
        } else if let Some(file_path) = options.file {
            Some(self.read_content_from_file(&file_path)?)
        } else if options.edit {
            let entry = self.store.get_entry(&options.id).await.ok_or_else(|| {
                DaybookError::EntryNotFound {
                    id: options.id.clone(),
                }
            })?;
            Some(self.open_editor_with_content(&entry.content)?)
        } else {
            None
        };

        if let Some(new_content) = &content {
            if new_content.trim().is_empty() {
                return Err(DaybookError::ApplicationError {
                    message: "Refusing to save an empty entry".to_string(),
                });
            }
        }

        let patch = EntryPatch {
            content,
            mood: options.mood,
            mood_score: options.mood_score,
            summary: options.summary,
        };

        match self.store.update_entry(&options.id, patch).await? {
            Some(entry) => {
                println!("Entry {} updated successfully", entry.id);
                Ok(())
            }
            None => Err(DaybookError::EntryNotFound { id: options.id }),
        }
    }

    async fn handle_delete(&self, id: String, force: bool) -> Result<()> {
        // Fetch the entry first to verify it exists and show it in the prompt
        let entry = match self.store.get_entry(&id).await {
            Some(entry) => entry,
            None => {
                return Err(DaybookError::EntryNotFound { id });
            }
        };

        if !force {
            println!("You are about to delete the following entry:");
            println!("ID:      {}", entry.id);
            println!("Created: {}", format_millis(entry.created_at));

            if !entry.content.is_empty() {
                let preview = entry.content.lines().take(2).collect::<Vec<_>>().join("\n");
                println!("\nContent preview:");
                println!(
                    "{}{}",
                    preview,
                    if entry.content.lines().count() > 2 {
                        "..."
                    } else {
                        ""
                    }
                );
            }

            println!("\nThis action cannot be undone!");
            print!("Are you sure you want to delete this entry? [y/N]: ");
            stdout().flush().map_err(DaybookError::Io)?;

            let mut input = String::new();
            stdin().read_line(&mut input).map_err(DaybookError::Io)?;

            let input = input.trim().to_lowercase();
            if input != "y" && input != "yes" {
                println!("Deletion cancelled.");
                return Ok(());
            }
        }

        self.store.delete_entry(&id).await?;
        println!("Entry {} has been permanently deleted.", id);
        Ok(())
    }

    async fn handle_count(&self) -> Result<()> {
        let count = self.store.entries_count().await;
        println!(
            "{} entr{} stored",
            count,
            if count == 1 { "y" } else { "ies" }
        );
        Ok(())
    }

    async fn handle_range(&self, start: String, end: String, json: bool) -> Result<()> {
        let start = parse_range_bound(&start, false)?;
        let end = parse_range_bound(&end, true)?;
        if start > end {
            return Err(DaybookError::ApplicationError {
                message: "Range start is after range end".to_string(),
            });
        }

        let entries = self.store.entries_by_date_range(start, end).await;
        if entries.is_empty() {
            println!("No entries in the given range.");
            return Ok(());
        }
        self.display_entries(&entries, json, false)?;
        Ok(())
    }

    /// Display entries in the requested format
    fn display_entries(&self, entries: &[Entry], json: bool, brief: bool) -> Result<()> {
        if entries.is_empty() {
            println!("No entries found.");
            return Ok(());
        }

        if json {
            println!("{}", serde_json::to_string_pretty(entries)?);
        } else {
            self.display_entries_text(entries, brief)?;
        }

        println!(
            "\nFound {} entr{}",
            entries.len(),
            if entries.len() == 1 { "y" } else { "ies" }
        );
        Ok(())
    }

    /// Display entries in text format
    fn display_entries_text(&self, entries: &[Entry], brief: bool) -> Result<()> {
        // Use terminal width for the separator if available
        let term_width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);

        for (i, entry) in entries.iter().enumerate() {
            if i > 0 {
                println!("{}", "-".repeat(term_width.min(50)));
            }

            self.print_entry_header(entry);

            if !brief {
                let preview = content_preview(&entry.content, 100);
                if !preview.is_empty() {
                    println!("\n{}", preview);
                }
            }
        }

        Ok(())
    }

    fn print_entry_header(&self, entry: &Entry) {
        println!(
            "ID: {} | Created: {}",
            console::style(&entry.id).bold(),
            format_millis(entry.created_at)
        );

        if let Some(mood) = entry.mood {
            let label = match mood {
                crate::Mood::Positive => console::style(mood.to_string()).green(),
                crate::Mood::Negative => console::style(mood.to_string()).red(),
                crate::Mood::Neutral => console::style(mood.to_string()).dim(),
            };
            match entry.mood_score {
                Some(score) => println!("Mood: {} ({:.0}%)", label, score * 100.0),
                None => println!("Mood: {}", label),
            }
        }

        if let Some(summary) = &entry.summary {
            println!("Summary: {}", console::style(summary).italic());
        }
    }

    fn open_editor_for_content(&self) -> Result<String> {
        // Create a temporary file with .md extension
        let temp_file = Builder::new().suffix(".md").tempfile()?;
        let temp_path = temp_file.path().to_path_buf();

        // Write template to the temp file
        self.write_editor_template(&temp_path)?;

        let editor_cmd = self.config.get_editor_command();

        info!("Opening editor to write entry content. Save and exit when done...");
        self.launch_editor(&editor_cmd, &temp_path)?;

        let content = read_to_string(&temp_path)?;
        Ok(process_editor_content(content))
    }

    fn write_editor_template(&self, path: &Path) -> Result<()> {
        let mut file = OpenOptions::new().write(true).open(path)?;

        writeln!(file, "<!-- ")?;
        writeln!(
            file,
            "Write your journal entry below. Markdown is supported."
        )?;
        writeln!(
            file,
            "Lines that start with <!-- and end with --> are comments and will be ignored."
        )?;
        writeln!(file, "Save and exit the editor when you're done.")?;
        writeln!(file, "-->")?;
        writeln!(file)?;

        Ok(())
    }

    // Helper function to open editor with existing content
    fn open_editor_with_content(&self, existing_content: &str) -> Result<String> {
        let temp_file = Builder::new().suffix(".md").tempfile()?;
        let temp_path = temp_file.path().to_path_buf();

        let mut file = OpenOptions::new().write(true).open(&temp_path)?;
        writeln!(file, "<!-- Edit your entry below this line -->")?;
        writeln!(file, "\n{}", existing_content)?;

        let editor_cmd = self.config.get_editor_command();
        self.launch_editor(&editor_cmd, &temp_path)?;

        let content = read_to_string(&temp_path)?;
        Ok(process_editor_content(content))
    }

    fn launch_editor(&self, editor_cmd: &str, file_path: &Path) -> Result<()> {
        let path_str = file_path.to_string_lossy();

        // Handle shell-like command parsing
        let args = split(editor_cmd).map_err(|e| DaybookError::EditorError {
            message: format!("Failed to parse editor command: {}", e),
        })?;

        if args.is_empty() {
            return Err(DaybookError::EditorError {
                message: "Empty editor command".to_string(),
            });
        }

        // First word is the program name, rest are arguments
        let program = &args[0];
        let mut command = Command::new(program);
        if args.len() > 1 {
            command.args(&args[1..]);
        }
        command.arg(path_str.as_ref());

        let status = command.status()?;
        if !status.success() {
            return Err(DaybookError::EditorError {
                message: "Editor exited with non-zero status".to_string(),
            });
        }

        Ok(())
    }

    // Helper function for reading content from file
    fn read_content_from_file(&self, file_path: &Path) -> Result<String> {
        if !file_path.exists() {
            return Err(DaybookError::FileNotFound {
                file_path: file_path.display().to_string(),
            });
        }

        if !file_path.is_file() {
            return Err(DaybookError::ApplicationError {
                message: format!("Not a file: {}", file_path.display()),
            });
        }

        read_to_string(file_path).map_err(DaybookError::Io)
    }
}

/// Strips HTML comment lines left over from the editor template
fn process_editor_content(content: String) -> String {
    content
        .lines()
        .filter(|line| {
            !line.trim_start().starts_with("<!--") && !line.trim_end().ends_with("-->")
        })
        .collect::<Vec<&str>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Generate a content preview for displaying brief entries
fn content_preview(content: &str, max_len: usize) -> String {
    // Get first non-empty line
    let first_line = content
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");

    if first_line.chars().count() <= max_len {
        first_line.to_string()
    } else {
        let cut: String = first_line.chars().take(max_len).collect();
        format!("{}...", cut)
    }
}

fn format_millis(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}

/// Parses a range bound given either as epoch milliseconds or as a
/// calendar date. A date used as the end bound covers its whole day.
fn parse_range_bound(value: &str, is_end: bool) -> Result<i64> {
    if let Ok(millis) = value.parse::<i64>() {
        return Ok(millis);
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        DaybookError::ApplicationError {
            message: format!(
                "Invalid range bound '{}': expected epoch milliseconds or YYYY-MM-DD",
                value
            ),
        }
    })?;

    let midnight = date
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc()
        .timestamp_millis();

    if is_end {
        // inclusive through the end of the day
        Ok(midnight + 86_400_000 - 1)
    } else {
        Ok(midnight)
    }
}
