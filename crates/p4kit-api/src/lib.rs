// p4kit-api: blocking process + marshal client for the Perforce `p4` CLI

pub mod connection;
pub mod error;
pub mod marshal;
pub mod record;
pub mod runner;

pub use connection::Connection;
pub use error::Error;
pub use marshal::{RecordReader, WireError};
pub use record::{MarshalCode, MessageLevel, Record, RecordExt, Severity};
pub use runner::{DEFAULT_PROGRAM, Execute, Runner};
