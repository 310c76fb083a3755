use crate::models::BatchId;

use super::MonitorError;

/// One line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Bare batch number: start watching it, or stop if it is already live.
    Toggle(BatchId),
    Stop,
    Show(i64),
    Status,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, MonitorError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(MonitorError::InvalidInput);
    };

    match head {
        "stop" => Ok(Command::Stop),
        "status" => Ok(Command::Status),
        "quit" | "exit" => Ok(Command::Quit),
        "show" => {
            let seq = words
                .next()
                .and_then(|word| word.trim_start_matches('#').parse::<i64>().ok())
                .ok_or_else(|| MonitorError::InvalidCommand(line.trim().to_string()))?;
            Ok(Command::Show(seq))
        }
        _ => Ok(Command::Toggle(BatchId::parse(line)?)),
    }
}
