use crate::error::{UserFriendlyError, ZipStampError};
use crate::extractor::{EntryKind, ExtractedRecord, ExtractionReport};
use console::{style, Emoji, Term};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static PACKAGE: Emoji = Emoji("📦 ", "> ");

pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors = match mode {
            OutputMode::Human => Term::stdout().features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn success(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Success, message),
                OutputMode::Json => self.print_json_message("success", message),
                OutputMode::Plain => println!("SUCCESS: {}", message),
            }
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => println!("WARNING: {}", message),
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", PACKAGE, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &ZipStampError) {
        self.error(&error.user_message());

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => eprintln!("SUGGESTION: {}", suggestion),
            }
        }
    }

    pub fn print_extraction_report(&self, report: &ExtractionReport) {
        match self.mode {
            OutputMode::Human => {
                if !self.quiet {
                    self.print_human_report(report);
                }
            }
            OutputMode::Json => {
                let json_output =
                    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string());
                println!("{}", json_output);
            }
            OutputMode::Plain => {
                if !self.quiet {
                    self.print_plain_report(report);
                }
            }
        }
    }

    pub fn print_plan(&self, planned: &[ExtractedRecord]) {
        match self.mode {
            OutputMode::Json => {
                let json_output = serde_json::to_string_pretty(&serde_json::json!({
                    "type": "plan",
                    "records": planned,
                }))
                .unwrap_or_else(|_| "{}".to_string());
                println!("{}", json_output);
            }
            OutputMode::Human | OutputMode::Plain => {
                for record in planned {
                    println!("  {}", describe_record(record));
                }
            }
        }
    }

    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}", style("─".repeat(60)).dim());
                } else {
                    println!("{}", "-".repeat(60));
                }
            }
            OutputMode::Plain => println!("{}", "-".repeat(60)),
            OutputMode::Json => {}
        }
    }

    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        if self.use_colors {
            let (emoji, styled) = match msg_type {
                MessageType::Success => (&CHECKMARK, style(message).green().bold()),
                MessageType::Error => (&CROSS, style(message).red().bold()),
                MessageType::Warning => (&WARNING, style(message).yellow().bold()),
                MessageType::Info => (&INFO, style(message).cyan()),
            };

            match msg_type {
                MessageType::Error => eprintln!("{}{}", emoji, styled),
                _ => println!("{}{}", emoji, styled),
            }
        } else {
            let prefix = match msg_type {
                MessageType::Success => "✓",
                MessageType::Error => "✗",
                MessageType::Warning => "!",
                MessageType::Info => "i",
            };

            match msg_type {
                MessageType::Error => eprintln!("{} {}", prefix, message),
                _ => println!("{} {}", prefix, message),
            }
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn print_human_report(&self, report: &ExtractionReport) {
        self.print_separator();

        if self.use_colors {
            println!(
                "{} {}",
                style("Extraction completed!").green().bold(),
                CHECKMARK
            );
        } else {
            println!("✓ Extraction completed!");
        }

        println!();
        println!("  Archive:             {}", report.archive);
        println!("  Manifest:            {}", report.manifest);
        println!("  Rows processed:      {}", self.highlight(report.total_rows()));
        println!("  Files written:       {}", self.highlight(report.files_written));
        println!("  Directories ensured: {}", self.highlight(report.directories_ensured));
        println!(
            "  Bytes written:       {}",
            self.highlight(format_bytes(report.bytes_written))
        );
        println!(
            "  Time taken:          {}",
            self.highlight(format_duration(report.duration))
        );

        if self.verbose_level >= 2 {
            println!();
            for record in &report.records {
                println!("  {}", describe_record(record));
            }
        }

        self.print_separator();
    }

    fn print_plain_report(&self, report: &ExtractionReport) {
        println!("COMPLETED: Extraction");
        println!("Archive: {}", report.archive);
        println!("Manifest: {}", report.manifest);
        println!("Rows: {}", report.total_rows());
        println!("Files: {}", report.files_written);
        println!("Directories: {}", report.directories_ensured);
        println!("Size: {} bytes", report.bytes_written);
        println!("Duration: {:?}", report.duration);
    }

    fn highlight<T: ToString>(&self, value: T) -> String {
        if self.use_colors {
            style(value.to_string()).cyan().bold().to_string()
        } else {
            value.to_string()
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}

fn describe_record(record: &ExtractedRecord) -> String {
    match record.kind {
        EntryKind::Directory => format!(
            "[{}] {} -> {} (directory)",
            record.row_index, record.entry, record.destination
        ),
        EntryKind::File => format!(
            "[{}] {} -> {} ({}, created {}, modified {})",
            record.row_index,
            record.entry,
            record.destination,
            format_bytes(record.bytes),
            record.creation_epoch,
            record.modified_epoch
        ),
    }
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}
