pub mod account_writer;

pub use account_writer::AccountWriter;
