//! CSV encoder for row sets: one header line, then rows in source order.

use std::io::Write;

use snapload_core::types::RowSet;

use crate::error::Result;

pub struct CsvWriter<W: Write> {
    inner: ::csv::Writer<W>,
}

impl<W: Write> CsvWriter<W> {
    pub fn to_writer(writer: W) -> Self {
        Self {
            inner: ::csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(writer),
        }
    }

    /// Write the header and every row. Returns the number of data rows.
    pub fn write_rowset(&mut self, rows: &RowSet) -> Result<u64> {
        if rows.columns.is_empty() {
            // Nothing describable; leave the file empty.
            return Ok(0);
        }
        self.inner.write_record(&rows.columns)?;
        let mut record: Vec<String> = Vec::with_capacity(rows.num_columns());
        for row in &rows.rows {
            record.clear();
            record.extend(row.iter().map(|v| v.to_text()));
            self.inner.write_record(&record)?;
        }
        self.inner.flush()?;
        Ok(rows.num_rows() as u64)
    }

    pub fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| crate::error::Error::Csv(e.to_string()))
    }
}

/// Encode a whole row set into memory.
pub fn encode_csv(rows: &RowSet) -> Result<Vec<u8>> {
    let mut w = CsvWriter::to_writer(Vec::new());
    w.write_rowset(rows)?;
    w.into_inner()
}
