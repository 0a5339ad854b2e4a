pub const TELEMETRY_PREFIX: &str = "{";
pub const CONFIG_PREFIX: &str = "CFG:";
pub const MESSAGE_PREFIX: &str = "MSG:";

/// A trimmed serial line tagged with the handler it belongs to.
///
/// Each variant borrows the whole line, prefix included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    Telemetry(&'a str),
    Config(&'a str),
    SystemMessage(&'a str),
    Unformatted(&'a str),
}

impl<'a> Line<'a> {
    /// Prefix checks run in wire-contract order; anything unmatched is
    /// `Unformatted`, never an error.
    pub fn classify(line: &'a str) -> Self {
        if line.starts_with(TELEMETRY_PREFIX) {
            Line::Telemetry(line)
        } else if line.starts_with(CONFIG_PREFIX) {
            Line::Config(line)
        } else if line.starts_with(MESSAGE_PREFIX) {
            Line::SystemMessage(line)
        } else {
            Line::Unformatted(line)
        }
    }

    pub fn text(&self) -> &'a str {
        match *self {
            Line::Telemetry(s)
            | Line::Config(s)
            | Line::SystemMessage(s)
            | Line::Unformatted(s) => s,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Line::Telemetry(_) => "telemetry",
            Line::Config(_) => "config",
            Line::SystemMessage(_) => "message",
            Line::Unformatted(_) => "unformatted",
        }
    }
}
