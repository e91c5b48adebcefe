//! Streaming NDJSON writer.

use std::io::{BufWriter, Write};

use crate::error::Result;
use snapload_core::types::{RowSet, Scalar};

pub struct JsonlWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> JsonlWriter<W> {
    pub fn to_writer(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// One JSON object per row. Keys follow the row set's column order.
    pub fn write_rowset(&mut self, rows: &RowSet) -> Result<u64> {
        for row in &rows.rows {
            let mut line = String::from("{");
            for (ci, (name, val)) in rows.columns.iter().zip(row).enumerate() {
                if ci > 0 {
                    line.push(',');
                }
                line.push_str(&serde_json::to_string(name)?);
                line.push(':');
                line.push_str(&serde_json::to_string(&scalar_to_json(val))?);
            }
            line.push('}');
            writeln!(self.writer, "{}", line)?;
        }
        self.writer.flush()?;
        Ok(rows.num_rows() as u64)
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::error::Error::Io(e.into_error()))
    }
}

pub fn encode_jsonl(rows: &RowSet) -> Result<Vec<u8>> {
    let mut w = JsonlWriter::to_writer(Vec::new());
    w.write_rowset(rows)?;
    w.into_inner()
}

fn scalar_to_json(v: &Scalar) -> serde_json::Value {
    use Scalar::*;
    match v {
        Null => serde_json::Value::Null,
        Bool(b) => serde_json::Value::Bool(*b),
        I64(i) => serde_json::Value::from(*i),
        F64(f) => serde_json::Value::from(*f),
        Str(s) => serde_json::Value::String(s.clone()),
        Bin(_) => serde_json::Value::String(v.to_text()), // hex
    }
}
