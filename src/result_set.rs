use std::io;

use crate::connection::{MariaDbConnection, Pending};
use crate::error::Result;
use crate::io::Buf;
use crate::protocol::{Column, Status};
use crate::value::{DecodePlan, MariaDbValue};

/// Outcome of one response stream: either an OK packet or a result set.
#[derive(Debug)]
pub enum QueryResult {
    Ok(OkResult),
    ResultSet(ResultSet),
}

impl QueryResult {
    pub fn as_result_set(&self) -> Option<&ResultSet> {
        match self {
            QueryResult::ResultSet(rs) => Some(rs),
            QueryResult::Ok(_) => None,
        }
    }

    pub fn into_result_set(self) -> Option<ResultSet> {
        match self {
            QueryResult::ResultSet(rs) => Some(rs),
            QueryResult::Ok(_) => None,
        }
    }

    /// Affected rows reported by an OK response; `0` for result sets.
    pub fn affected_rows(&self) -> u64 {
        match self {
            QueryResult::Ok(ok) => ok.affected_rows,
            QueryResult::ResultSet(_) => 0,
        }
    }
}

/// Row-less command outcome.
#[derive(Debug, Clone, Copy)]
pub struct OkResult {
    pub affected_rows: u64,
    pub last_insert_id: u64,
    pub warnings: u16,
}

/// One decoded result-set row.
#[derive(Debug, Clone, PartialEq)]
pub struct MariaDbRow {
    values: Vec<MariaDbValue>,
}

impl MariaDbRow {
    pub(crate) fn new(values: Vec<MariaDbValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&MariaDbValue> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[MariaDbValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<MariaDbValue> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl IntoIterator for MariaDbRow {
    type Item = MariaDbValue;
    type IntoIter = std::vec::IntoIter<MariaDbValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// A fully buffered result set with cursor-style fetch operations.
#[derive(Debug)]
pub struct ResultSet {
    pub(crate) columns: Vec<Column>,
    pub(crate) rows: Vec<MariaDbRow>,
    pub(crate) pos: usize,
    pub(crate) output_parameters: bool,
}

impl ResultSet {
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[MariaDbRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// This set carries stored-procedure output parameters.
    pub fn has_output_parameters(&self) -> bool {
        self.output_parameters
    }

    pub fn fetch_one(&mut self) -> Option<&MariaDbRow> {
        if self.pos >= self.rows.len() {
            return None;
        }

        self.pos += 1;
        Some(&self.rows[self.pos - 1])
    }

    pub fn fetch_many(&mut self, size: usize) -> &[MariaDbRow] {
        let start = self.pos;
        self.pos = (self.pos + size).min(self.rows.len());
        &self.rows[start..self.pos]
    }

    pub fn fetch_all(&self) -> &[MariaDbRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<MariaDbRow> {
        self.rows
    }
}

impl IntoIterator for ResultSet {
    type Item = MariaDbRow;
    type IntoIter = std::vec::IntoIter<MariaDbRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// A lazily read result set borrowing its connection.
///
/// Rows are pulled off the socket one packet at a time; while the stream
/// is live no other command can use the connection. Dropping it
/// mid-stream leaves the remaining packets to be drained before the next
/// command is sent.
pub struct RowStream<'c> {
    conn: &'c mut MariaDbConnection,
    columns: Vec<Column>,
    plans: Vec<DecodePlan>,
    done: bool,
    output_parameters: bool,
}

impl<'c> RowStream<'c> {
    pub(crate) fn new(
        conn: &'c mut MariaDbConnection,
        columns: Vec<Column>,
        plans: Vec<DecodePlan>,
    ) -> Self {
        Self {
            conn,
            columns,
            plans,
            done: false,
            output_parameters: false,
        }
    }

    /// A stream for a row-less response (the command answered with OK).
    pub(crate) fn finished(conn: &'c mut MariaDbConnection) -> Self {
        Self {
            conn,
            columns: Vec::new(),
            plans: Vec::new(),
            done: true,
            output_parameters: false,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Whether the finished set carried stored-procedure out-parameters.
    /// Meaningful once the stream has been read to the end.
    pub fn has_output_parameters(&self) -> bool {
        self.output_parameters
    }

    /// Read the next row, or `None` once the set is finished.
    pub fn next_row(&mut self) -> Result<Option<MariaDbRow>> {
        if self.done {
            return Ok(None);
        }

        let packet = self.conn.stream.recv_packet()?;

        if packet[0] == 0xff {
            self.done = true;
            self.conn.pending = Pending::None;
            return Err(self.conn.handle_err_packet(&packet, None));
        }

        if self.conn.is_end_packet(&packet) {
            self.output_parameters = self.conn.apply_terminator(&packet)?;
            self.done = true;

            self.conn.pending = if self
                .conn
                .server_status()
                .contains(Status::MORE_RESULTS_EXISTS)
            {
                Pending::MoreResults
            } else {
                Pending::None
            };

            return Ok(None);
        }

        Ok(Some(decode_text_row(&packet, &self.plans)?))
    }

    /// Read up to `size` rows.
    pub fn fetch_many(&mut self, size: usize) -> Result<Vec<MariaDbRow>> {
        let mut rows = Vec::with_capacity(size);

        while rows.len() < size {
            match self.next_row()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }

        Ok(rows)
    }

    /// Read every remaining row.
    pub fn fetch_all(&mut self) -> Result<Vec<MariaDbRow>> {
        let mut rows = Vec::new();

        while let Some(row) = self.next_row()? {
            rows.push(row);
        }

        Ok(rows)
    }
}

/// Decode a text-protocol row: one length-encoded field per column, with
/// 0xfb standing for NULL.
pub(crate) fn decode_text_row(
    mut buf: &[u8],
    plans: &[DecodePlan],
) -> io::Result<MariaDbRow> {
    let mut values = Vec::with_capacity(plans.len());

    for plan in plans {
        values.push(plan.decode(&mut buf)?);
    }

    Ok(MariaDbRow::new(values))
}

/// Decode a binary-protocol row: a 0x00 header, a NULL bitmap of
/// `(columns + 9) / 8` bytes with a two-bit offset, then the values.
pub(crate) fn decode_binary_row(
    buf: &[u8],
    plans: &[DecodePlan],
) -> io::Result<MariaDbRow> {
    let mut buf = buf;

    let header = buf.get_u8()?;
    if header != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("expected binary row (0x00), got 0x{:X}", header),
        ));
    }

    let bitmap_len = (plans.len() + 9) / 8;
    let bitmap = buf.get_bytes(bitmap_len)?;

    let mut values = Vec::with_capacity(plans.len());

    for (i, plan) in plans.iter().enumerate() {
        let bit = i + 2;
        if bitmap[bit / 8] & (1 << (bit % 8)) != 0 {
            values.push(MariaDbValue::Null);
        } else {
            values.push(plan.decode(&mut buf)?);
        }
    }

    Ok(MariaDbRow::new(values))
}

#[cfg(test)]
mod tests {
    use super::{decode_binary_row, decode_text_row, MariaDbRow, ResultSet};
    use crate::value::{DecodePlan, MariaDbValue};

    fn result_set(n: i64) -> ResultSet {
        ResultSet {
            columns: Vec::new(),
            rows: (1..=n)
                .map(|i| MariaDbRow::new(vec![MariaDbValue::Int(i)]))
                .collect(),
            pos: 0,
            output_parameters: false,
        }
    }

    #[test]
    fn it_fetches_with_cursor_semantics() {
        let mut rs = result_set(3);

        assert_eq!(rs.fetch_one().unwrap().values(), [MariaDbValue::Int(1)]);
        assert_eq!(rs.fetch_many(2).len(), 2);
        assert!(rs.fetch_one().is_none());

        // fetch_all is position independent
        assert_eq!(rs.fetch_all().len(), 3);

        let mut rs = result_set(3);
        assert_eq!(rs.fetch_many(10).len(), 3);
        assert!(rs.fetch_many(1).is_empty());
    }

    #[test]
    fn it_decodes_a_text_row() {
        let plans = [
            DecodePlan::IntText { unsigned: false },
            DecodePlan::StrText,
            DecodePlan::StrText,
        ];

        // "1", NULL, "abc"
        let row = decode_text_row(b"\x011\xfb\x03abc", &plans).unwrap();

        assert_eq!(
            row.values(),
            [
                MariaDbValue::Int(1),
                MariaDbValue::Null,
                MariaDbValue::Text("abc".into()),
            ]
        );
    }

    #[test]
    fn it_decodes_a_binary_row_with_the_bitmap_offset() {
        let plans = [
            DecodePlan::Int { unsigned: false },
            DecodePlan::Int { unsigned: false },
        ];

        // header, bitmap (bit 3 set -> column 1 is NULL), one i32
        let row = decode_binary_row(&[0x00, 0b0000_1000, 5, 0, 0, 0], &plans).unwrap();

        assert_eq!(
            row.values(),
            [MariaDbValue::Int(5), MariaDbValue::Null]
        );
    }

    #[test]
    fn it_rejects_a_bad_binary_row_header() {
        assert!(decode_binary_row(&[0x01, 0x00], &[]).is_err());
    }
}
