/// Operator commands for a running live session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiveCommand {
    /// End the session after the current frame.
    Quit,
    /// Save the current annotated frame as a snapshot.
    Snapshot,
}

impl LiveCommand {
    /// Parses an operator input line: `q`/`quit` or `s`/`snapshot`.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "q" | "quit" => Some(LiveCommand::Quit),
            "s" | "snapshot" => Some(LiveCommand::Snapshot),
            _ => None,
        }
    }
}
