use racs_groundstation_shared::FcCommand;
use thiserror::Error;

pub const LINE_TERMINATOR: char = '\n';

/// Payload of the wake command: the terminator alone.
pub const WAKE: &str = "";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("command is empty")]
    Empty,
}

/// Frame a command for the wire: the text as-is plus one newline.
///
/// The flight controller's command language is not interpreted here.
pub fn encode_command(command: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(command.len() + 1);
    bytes.extend_from_slice(command.as_bytes());
    bytes.push(LINE_TERMINATOR as u8);
    bytes
}

pub fn encode_fc_command(command: &FcCommand) -> Vec<u8> {
    encode_command(&command.wire_text())
}

/// Clean up a command typed by the operator. Blank input never reaches the
/// encoder.
pub fn prepare_manual_command(input: &str) -> Result<String, CommandError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CommandError::Empty);
    }
    Ok(trimmed.to_string())
}
