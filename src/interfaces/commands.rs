use super::requests::OpenAccountRequest;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::BufRead;

/// A transfer instruction in a command stream, addressing accounts by their
/// public nine-digit numbers (internal ids are not known to the authors of
/// a command file).
#[derive(Debug, Clone, Deserialize)]
pub struct TransferCommand {
    pub sender: u32,
    pub receiver: u32,
    pub amount: Decimal,
}

/// One line of a JSON-lines command file.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    OpenAccount(OpenAccountRequest),
    Transfer(TransferCommand),
}

/// Streams commands out of a JSON-lines source.
///
/// Lazily reads one line at a time so large command files are never held in
/// memory. Blank lines are skipped; a malformed line yields an `Err` item
/// and the stream continues.
pub struct CommandReader<R: BufRead> {
    source: R,
}

impl<R: BufRead> CommandReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.source
            .lines()
            .filter(|line| match line {
                Ok(line) => !line.trim().is_empty(),
                Err(_) => true,
            })
            .map(|line| {
                let line = line?;
                Ok(serde_json::from_str(&line)?)
            })
    }
}
