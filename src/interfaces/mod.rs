//! Collaborator-facing request types and the CLI's command/report formats.

pub mod commands;
pub mod csv;
pub mod requests;
