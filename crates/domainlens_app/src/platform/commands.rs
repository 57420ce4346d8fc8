//! Input parsing for the terminal prompt.
//!
//! Anything that is not a known command is treated as an email address to
//! analyze; the core rejects it inline if it does not look like one.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Analyze a single email address.
    Analyze(String),
    /// Send free-form chat text; the reply arrives over the push channel.
    Say(String),
    /// Preview a CSV file for bulk upload.
    Upload(String),
    /// Submit the previously previewed file.
    Confirm,
    /// Stop watching the active batch.
    Cancel,
    /// Print the current session status.
    Status,
    Help,
    Quit,
    Empty,
}

pub fn parse_line(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Empty;
    }
    let (head, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (trimmed, ""),
    };
    match head {
        "quit" | "exit" => Command::Quit,
        "help" => Command::Help,
        "status" => Command::Status,
        "confirm" => Command::Confirm,
        "cancel" => Command::Cancel,
        "upload" if !rest.is_empty() => Command::Upload(rest.to_string()),
        "say" if !rest.is_empty() => Command::Say(rest.to_string()),
        _ => Command::Analyze(trimmed.to_string()),
    }
}
