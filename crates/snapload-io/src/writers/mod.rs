//! Row set encoders.

pub mod csv;
pub mod jsonl;

pub use self::csv::{encode_csv, CsvWriter};
pub use self::jsonl::{encode_jsonl, JsonlWriter};
