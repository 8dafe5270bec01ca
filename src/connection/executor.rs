use std::io::{Read, Write};

use byteorder::LittleEndian;

use crate::connection::stream::MariaDbStream;
use crate::connection::{MariaDbConnection, Pending};
use crate::error::{Error, MariaDbDatabaseError, Result};
use crate::io::{Buf, BufExt, BufMut};
use crate::placeholders::parameter_parts;
use crate::protocol::statement::{
    ComStmtClose, ComStmtExecute, ComStmtPrepare, ComStmtPrepareOk, ComStmtSendLongData,
};
use crate::protocol::text::ComQuery;
use crate::protocol::{Capabilities, Column, DataType, EofPacket, OkPacket, Status};
use crate::result_set::{
    decode_binary_row, decode_text_row, MariaDbRow, OkResult, QueryResult, ResultSet, RowStream,
};
use crate::statement::PrepareResult;
use crate::value::{DecodePlan, MariaDbValue};

/// EXECUTE against the most recently prepared statement, used when
/// pipelining PREPARE with the EXECUTE that follows it.
const LAST_PREPARED: u32 = 0xffff_ffff;

// lock wait timeout / deadlock / statement timeout
const DEADLOCK_CODES: [u16; 3] = [1205, 1213, 1614];

// statements longer than this are never cached
const MAX_CACHEABLE_SQL: usize = 8192;

impl MariaDbConnection {
    /// Run a text-protocol query and read every response stream.
    pub fn execute(&mut self, sql: &str) -> Result<Vec<QueryResult>> {
        self.drain_pending()?;

        log::debug!("conn={} execute query: {}", self.context.thread_id, sql);

        self.stream.send_packet(ComQuery { query: sql })?;
        let result = self.recv_response(Some(sql), None);

        self.finish(result)
    }

    /// Run a query and return its first result set.
    pub fn query(&mut self, sql: &str) -> Result<ResultSet> {
        self.execute(sql)?
            .into_iter()
            .find_map(QueryResult::into_result_set)
            .ok_or_else(|| err_protocol!("query returned no result set"))
    }

    /// Run a parameterised statement. With `use_binary` (the default) this
    /// goes through a prepared statement and the binary protocol; without
    /// it the parameters are substituted into the SQL text client-side.
    pub fn execute_with_params(
        &mut self,
        sql: &str,
        params: &[MariaDbValue],
    ) -> Result<Vec<QueryResult>> {
        if params.is_empty() {
            return self.execute(sql);
        }

        self.drain_pending()?;

        log::debug!("conn={} execute query: {}", self.context.thread_id, sql);

        let result = if self.options.use_binary {
            self.execute_binary(sql, params)
        } else {
            self.execute_client_side(sql, params)
        };

        self.finish(result)
    }

    /// Run one statement against many parameter rows, using
    /// COM_STMT_BULK_EXECUTE or pipelined EXECUTEs when possible.
    pub fn execute_batch(
        &mut self,
        sql: &str,
        rows: &[Vec<MariaDbValue>],
    ) -> Result<Vec<QueryResult>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let arity = rows[0].len();
        if rows.iter().any(|row| row.len() != arity) {
            return Err(err_protocol!("batched parameter rows have unequal arity"));
        }

        self.drain_pending()?;

        log::debug!("conn={} execute batch: {}", self.context.thread_id, sql);

        if !self.options.use_binary {
            let mut results = Vec::new();
            for row in rows {
                match self.execute_client_side(sql, row) {
                    Ok(r) => results.extend(r),
                    Err(err) => return self.finish(Err(err)),
                }
            }
            return Ok(results);
        }

        for row in rows {
            for param in row {
                param.binary_type()?;
            }
        }

        let mut prepare = match self.cache.take(sql) {
            Some(prepare) => prepare,
            None => {
                self.stream.send_packet(ComStmtPrepare { query: sql })?;
                match self.recv_prepare_result(sql) {
                    Ok(prepare) => prepare,
                    Err(err) => return self.finish(Err(err)),
                }
            }
        };

        let result = self.execute_batch_prepared(sql, &mut prepare, rows);
        self.finish_prepare(sql, prepare);
        self.finish(result)
    }

    /// Run a text-protocol query, streaming the rows of its first result
    /// set instead of buffering them.
    pub fn fetch(&mut self, sql: &str) -> Result<RowStream<'_>> {
        self.drain_pending()?;

        log::debug!("conn={} execute query: {}", self.context.thread_id, sql);

        self.stream.send_packet(ComQuery { query: sql })?;

        loop {
            let packet = self.stream.recv_packet()?;

            match packet[0] {
                0x00 => {
                    // row-less statement; nothing to stream
                    self.handle_ok(&packet)?;
                    self.pending = if self
                        .context
                        .server_status
                        .contains(Status::MORE_RESULTS_EXISTS)
                    {
                        Pending::MoreResults
                    } else {
                        Pending::None
                    };

                    return Ok(RowStream::finished(self));
                }

                0xff => return Err(self.handle_err_packet(&packet, Some(sql))),

                0xfb => {
                    self.send_local_infile(&packet, Some(sql))?;
                }

                _ => {
                    let (columns, plans) = self.recv_result_meta(&packet, None)?;
                    self.pending = Pending::Rows;

                    return Ok(RowStream::new(self, columns, plans));
                }
            }
        }
    }

    // ---------------------------------------------------------------- binary

    fn execute_binary(&mut self, sql: &str, params: &[MariaDbValue]) -> Result<Vec<QueryResult>> {
        // reject parameter types the binary protocol cannot carry before
        // anything is written to the socket
        for param in params {
            param.binary_type()?;
        }

        if let Some(mut prepare) = self.cache.take(sql) {
            self.send_execute_packet(prepare.statement_id, params)?;
            let result = self.recv_response(Some(sql), Some(&mut prepare));
            self.finish_prepare(sql, prepare);
            return result;
        }

        if self.pipeline_enabled() {
            // PREPARE and EXECUTE leave together; the server resolves the
            // -1 statement id to the statement it just prepared
            self.stream.send_packet(ComStmtPrepare { query: sql })?;
            self.send_execute_packet(LAST_PREPARED, params)?;

            let mut prepare = match self.recv_prepare_result(sql) {
                Ok(prepare) => prepare,
                Err(err) => {
                    // the pipelined EXECUTE answers with its own error
                    let _ = self.discard_response(true);
                    return Err(err);
                }
            };

            let result = self.recv_response(Some(sql), Some(&mut prepare));
            self.finish_prepare(sql, prepare);
            result
        } else {
            self.stream.send_packet(ComStmtPrepare { query: sql })?;
            let mut prepare = self.recv_prepare_result(sql)?;

            self.send_execute_packet(prepare.statement_id, params)?;
            let result = self.recv_response(Some(sql), Some(&mut prepare));
            self.finish_prepare(sql, prepare);
            result
        }
    }

    fn execute_batch_prepared(
        &mut self,
        sql: &str,
        prepare: &mut PrepareResult,
        rows: &[Vec<MariaDbValue>],
    ) -> Result<Vec<QueryResult>> {
        let bulk = self.options.use_bulk
            && self
                .stream
                .capabilities
                .contains(Capabilities::MARIADB_CLIENT_STMT_BULK_OPERATIONS);

        if bulk {
            let mut sent = 0;
            let send_result = send_bulk(&mut self.stream, prepare.statement_id, rows, &mut sent);

            if let Err(send_err) = send_result {
                for _ in 0..sent {
                    let _ = self.discard_response(true);
                }
                return Err(send_err);
            }

            self.read_pipeline_responses(sent, sql, prepare)
        } else if self.pipeline_enabled() {
            for row in rows {
                self.send_execute_packet(prepare.statement_id, row)?;
            }

            self.read_pipeline_responses(rows.len(), sql, prepare)
        } else {
            let mut results = Vec::new();
            for row in rows {
                self.send_execute_packet(prepare.statement_id, row)?;
                results.extend(self.recv_response(Some(sql), Some(&mut *prepare))?);
            }
            Ok(results)
        }
    }

    fn pipeline_enabled(&self) -> bool {
        !self.options.disable_pipeline
            && self
                .stream
                .capabilities
                .contains(Capabilities::MARIADB_CLIENT_STMT_BULK_OPERATIONS)
    }

    fn read_pipeline_responses(
        &mut self,
        count: usize,
        sql: &str,
        prepare: &mut PrepareResult,
    ) -> Result<Vec<QueryResult>> {
        let mut results = Vec::new();
        let mut first_error = None;

        for _ in 0..count {
            if first_error.is_none() {
                match self.recv_response(Some(sql), Some(&mut *prepare)) {
                    Ok(r) => results.extend(r),
                    Err(err) => first_error = Some(err),
                }
            } else {
                // stay in sync with the remaining responses
                let _ = self.discard_response(true);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(results),
        }
    }

    fn send_execute_packet(&mut self, statement_id: u32, params: &[MariaDbValue]) -> Result<()> {
        // byte-sequence parameters travel ahead of the EXECUTE body
        for (index, param) in params.iter().enumerate() {
            if let MariaDbValue::Bytes(data) = param {
                self.stream.send_packet(ComStmtSendLongData {
                    statement_id,
                    param_index: index as u16,
                    data,
                })?;
            }
        }

        self.stream.begin_command();
        ComStmtExecute {
            statement_id,
            params,
        }
        .encode(&mut self.stream.wbuf)?;
        self.stream.flush_command()
    }

    fn recv_prepare_result(&mut self, sql: &str) -> Result<PrepareResult> {
        let packet = self.stream.recv_packet()?;

        if packet[0] == 0xff {
            let description = format!("PREPARE {}", sql);
            return Err(self.handle_err_packet(&packet, Some(&description)));
        }

        let ok = ComStmtPrepareOk::read(&packet)?;

        // parameter definitions carry no information we retain
        if ok.params > 0 {
            for _ in 0..ok.params {
                self.stream.recv_packet()?;
            }
            self.recv_intermediate_eof()?;
        }

        let mut columns = Vec::with_capacity(ok.columns as usize);
        if ok.columns > 0 {
            for _ in 0..ok.columns {
                let packet = self.stream.recv_packet()?;
                columns.push(Column::read(&packet, self.context.extended_info)?);
            }
            self.recv_intermediate_eof()?;
        }

        Ok(PrepareResult::new(ok.statement_id, ok.params, columns))
    }

    /// Return a prepared statement to the cache, or close it server-side
    /// when it cannot be cached (or lost its place to a duplicate).
    fn finish_prepare(&mut self, sql: &str, prepare: PrepareResult) {
        let cacheable = self.options.use_binary
            && self.options.prep_stmt_cache_size > 0
            && sql.len() < MAX_CACHEABLE_SQL;

        if cacheable {
            for dropped in self.cache.put(sql, prepare) {
                self.close_statement(dropped);
            }
        } else {
            self.close_statement(prepare);
        }
    }

    /// COM_STMT_CLOSE the statement. The server never replies; send
    /// failures are tolerated.
    fn close_statement(&mut self, mut prepare: PrepareResult) {
        if prepare.closing {
            return;
        }
        prepare.closing = true;

        if let Err(err) = self.stream.send_packet(ComStmtClose {
            statement_id: prepare.statement_id,
        }) {
            log::warn!(
                "conn={} failed to close prepared statement {}: {}",
                self.context.thread_id,
                prepare.statement_id,
                err
            );
        }
    }

    // ------------------------------------------------------------------ text

    fn execute_client_side(
        &mut self,
        sql: &str,
        params: &[MariaDbValue],
    ) -> Result<Vec<QueryResult>> {
        let no_backslash_escapes = self
            .context
            .server_status
            .contains(Status::NO_BACKSLASH_ESCAPES);

        let parsed = parameter_parts(sql, no_backslash_escapes);
        if parsed.param_count() != params.len() {
            return Err(err_protocol!(
                "statement has {} placeholders but {} parameters were given",
                parsed.param_count(),
                params.len()
            ));
        }

        self.stream.begin_command();
        self.stream.wbuf.put_u8(0x03);
        self.stream.wbuf.put_bytes(&parsed.parts()[0]);

        for (i, param) in params.iter().enumerate() {
            param.encode_text(&mut self.stream.wbuf, no_backslash_escapes)?;
            self.stream.wbuf.put_bytes(&parsed.parts()[i + 1]);
        }

        self.stream.flush_command()?;
        self.recv_response(Some(sql), None)
    }

    // ------------------------------------------------------- response stream

    fn recv_response(
        &mut self,
        description: Option<&str>,
        mut prepared: Option<&mut PrepareResult>,
    ) -> Result<Vec<QueryResult>> {
        let mut results = Vec::new();

        results.push(self.recv_query_result(description, prepared.as_deref_mut())?);

        while self
            .context
            .server_status
            .contains(Status::MORE_RESULTS_EXISTS)
        {
            results.push(self.recv_query_result(description, prepared.as_deref_mut())?);
        }

        Ok(results)
    }

    fn recv_query_result(
        &mut self,
        description: Option<&str>,
        prepared: Option<&mut PrepareResult>,
    ) -> Result<QueryResult> {
        let mut prepared = prepared;

        loop {
            let packet = self.stream.recv_packet()?;

            match packet[0] {
                0x00 => return Ok(QueryResult::Ok(self.handle_ok(&packet)?)),

                0xff => return Err(self.handle_err_packet(&packet, description)),

                0xfb => {
                    self.send_local_infile(&packet, description)?;
                }

                _ => {
                    let (columns, plans) =
                        self.recv_result_meta(&packet, prepared.as_deref_mut())?;

                    let binary = prepared.is_some();
                    let (rows, output_parameters) =
                        self.recv_rows(&plans, binary, description)?;

                    return Ok(QueryResult::ResultSet(ResultSet {
                        columns,
                        rows,
                        pos: 0,
                        output_parameters,
                    }));
                }
            }
        }
    }

    pub(crate) fn recv_result_meta(
        &mut self,
        packet: &[u8],
        prepared: Option<&mut PrepareResult>,
    ) -> Result<(Vec<Column>, Vec<DecodePlan>)> {
        let mut buf: &[u8] = packet;
        let field_count = buf.get_uint_lenenc_not_null::<LittleEndian>()? as usize;

        let binary = prepared.is_some();

        // re-executable commands carry a one-byte "metadata follows" flag
        // when the skip-meta optimisation was negotiated
        let meta_skipped = self.context.skip_meta && binary && buf.get_u8()? == 0;

        let columns = match prepared {
            Some(prepare) if meta_skipped => prepare.columns.clone(),

            prepared => {
                let mut columns = Vec::with_capacity(field_count);
                for _ in 0..field_count {
                    let packet = self.stream.recv_packet()?;
                    columns.push(Column::read(&packet, self.context.extended_info)?);
                }

                if let Some(prepare) = prepared {
                    prepare.columns = columns.clone();
                }

                columns
            }
        };

        self.recv_intermediate_eof()?;

        let plans = columns.iter().map(|c| c.parser(binary)).collect();

        Ok((columns, plans))
    }

    fn recv_rows(
        &mut self,
        plans: &[DecodePlan],
        binary: bool,
        description: Option<&str>,
    ) -> Result<(Vec<MariaDbRow>, bool)> {
        let mut rows = Vec::new();

        loop {
            let packet = self.stream.recv_packet()?;

            if packet[0] == 0xff {
                return Err(self.handle_err_packet(&packet, description));
            }

            if self.is_end_packet(&packet) {
                let output_parameters = self.apply_terminator(&packet)?;
                return Ok((rows, output_parameters));
            }

            rows.push(if binary {
                decode_binary_row(&packet, plans)?
            } else {
                decode_text_row(&packet, plans)?
            });
        }
    }

    /// An end-of-rows packet is 0xfe-headed and short: under the frame
    /// limit for the OK form, under 8 bytes for a legacy EOF.
    pub(crate) fn is_end_packet(&self, packet: &[u8]) -> bool {
        packet[0] == 0xfe
            && if self.context.eof_deprecated {
                packet.len() < 0xff_ff_ff
            } else {
                packet.len() < 8
            }
    }

    /// Parse an end-of-rows packet, updating the server status. Returns
    /// whether the finished set carries stored-procedure out-parameters.
    pub(crate) fn apply_terminator(&mut self, packet: &[u8]) -> Result<bool> {
        if self.context.eof_deprecated {
            self.handle_ok(packet)?;
        } else {
            let eof = EofPacket::read(packet)?;
            self.context.server_status = eof.status;
        }

        Ok(self
            .context
            .server_status
            .contains(Status::PS_OUT_PARAMETERS))
    }

    fn recv_intermediate_eof(&mut self) -> Result<()> {
        if !self.context.eof_deprecated {
            let packet = self.stream.recv_packet()?;
            EofPacket::read(&packet)?;
        }

        Ok(())
    }

    fn handle_ok(&mut self, packet: &[u8]) -> Result<OkResult> {
        let ok = OkPacket::read(packet, self.stream.capabilities)?;

        self.context.server_status = ok.status;

        if let Some(schema) = ok.schema {
            self.context.database = if schema.is_empty() {
                None
            } else {
                Some(schema.into_string())
            };
        }

        Ok(OkResult {
            affected_rows: ok.affected_rows,
            last_insert_id: ok.last_insert_id,
            warnings: ok.warnings,
        })
    }

    pub(crate) fn recv_ok(&mut self, description: Option<&str>) -> Result<OkResult> {
        let packet = self.stream.recv_packet()?;

        match packet[0] {
            0x00 | 0xfe => self.handle_ok(&packet),
            0xff => Err(self.handle_err_packet(&packet, description)),
            header => Err(err_protocol!(
                "unexpected packet 0x{:X} when expecting OK",
                header
            )),
        }
    }

    pub(crate) fn handle_err_packet(
        &mut self,
        packet: &[u8],
        description: Option<&str>,
    ) -> Error {
        match self.context.on_err_packet(packet) {
            Ok(err) => {
                let mut db = MariaDbDatabaseError::new(err, self.context.thread_id);

                if self.options.dump_queries_on_exception {
                    if let Some(sql) = description {
                        db.append_sql(sql, self.options.max_query_size_to_log);
                    }
                }

                db.into()
            }

            Err(err) => err,
        }
    }

    // -------------------------------------------------------------- INFILE

    /// Answer a LOCAL_INFILE request: stream the named file as raw frames
    /// and finish with an empty frame. An unreadable file still sends the
    /// terminator so the protocol stays in sync.
    fn send_local_infile(&mut self, packet: &[u8], description: Option<&str>) -> Result<()> {
        let mut buf: &[u8] = packet;
        buf.advance(1)?;
        let file_name = std::str::from_utf8(buf)
            .map_err(|_| err_protocol!("malformed LOCAL INFILE file name"))?
            .to_owned();

        log::debug!(
            "conn={} sending local file: {}",
            self.context.thread_id,
            file_name
        );

        match std::fs::read(&file_name) {
            Ok(contents) => {
                if !contents.is_empty() {
                    self.stream.wbuf.put_bytes(&contents);
                    self.stream.flush_payload(false)?;
                }
                self.stream.send_empty_packet()?;

                Ok(())
            }

            Err(source) => {
                self.stream.send_empty_packet()?;

                // the server acknowledges the empty transfer; consume it
                let _ = self.recv_ok(description);

                Err(Error::LocalInfile {
                    path: file_name,
                    source,
                })
            }
        }
    }

    // ------------------------------------------------------------- draining

    /// Read and discard whatever the previous command still has in flight
    /// so a new command can be sent.
    pub(crate) fn drain_pending(&mut self) -> Result<()> {
        match self.pending {
            Pending::None => Ok(()),

            Pending::Rows => {
                self.pending = Pending::None;
                self.skip_rows()?;

                if self
                    .context
                    .server_status
                    .contains(Status::MORE_RESULTS_EXISTS)
                {
                    self.discard_response(false)?;
                }

                Ok(())
            }

            Pending::MoreResults => {
                self.pending = Pending::None;
                self.discard_response(false)
            }
        }
    }

    /// Discard one response stream (and any chained MORE_RESULTS streams).
    /// Server errors are swallowed; only transport errors surface.
    pub(crate) fn discard_response(&mut self, can_skip_meta: bool) -> Result<()> {
        loop {
            let packet = self.stream.recv_packet()?;

            match packet[0] {
                0x00 => {
                    let _ = self.handle_ok(&packet);
                }

                0xff => {
                    let _ = self.context.on_err_packet(&packet);
                    self.context
                        .server_status
                        .remove(Status::MORE_RESULTS_EXISTS);
                    return Ok(());
                }

                0xfb => {
                    // cannot satisfy an INFILE request while discarding
                    self.stream.send_empty_packet()?;
                }

                _ => {
                    let mut buf: &[u8] = &packet;
                    let field_count =
                        buf.get_uint_lenenc_not_null::<LittleEndian>()? as usize;

                    let meta_skipped =
                        self.context.skip_meta && can_skip_meta && buf.get_u8()? == 0;

                    if !meta_skipped {
                        for _ in 0..field_count {
                            self.stream.recv_packet()?;
                        }
                    }

                    self.recv_intermediate_eof()?;
                    self.skip_rows()?;
                }
            }

            if !self
                .context
                .server_status
                .contains(Status::MORE_RESULTS_EXISTS)
            {
                return Ok(());
            }
        }
    }

    /// Skip row packets up to the end of the current set.
    pub(crate) fn skip_rows(&mut self) -> Result<()> {
        loop {
            let packet = self.stream.recv_packet()?;

            if packet[0] == 0xff {
                let _ = self.context.on_err_packet(&packet);
                self.context
                    .server_status
                    .remove(Status::MORE_RESULTS_EXISTS);
                return Ok(());
            }

            if self.is_end_packet(&packet) {
                self.apply_terminator(&packet)?;
                return Ok(());
            }
        }
    }

    // ----------------------------------------------------------- diagnostics

    /// Decorate deadlock errors with engine status when configured.
    fn finish(&mut self, result: Result<Vec<QueryResult>>) -> Result<Vec<QueryResult>> {
        match result {
            Err(Error::Database(err)) => Err(self.enrich_database_error(err)),
            other => other,
        }
    }

    fn enrich_database_error(&mut self, mut err: Box<MariaDbDatabaseError>) -> Error {
        if self.options.show_innodb_dead_lock && DEADLOCK_CODES.contains(&err.code()) {
            if let Ok(info) = self.innodb_status() {
                err.append_deadlock_info(&info);
            }
        }

        Error::Database(err)
    }

    fn innodb_status(&mut self) -> Result<String> {
        self.stream.send_packet(ComQuery {
            query: "SHOW ENGINE INNODB STATUS",
        })?;

        for result in self.recv_response(None, None)? {
            if let QueryResult::ResultSet(rs) = result {
                if let Some(row) = rs.rows().first() {
                    if let Some(MariaDbValue::Text(status)) = row.get(2) {
                        return Ok(status.clone());
                    }
                }
            }
        }

        Err(err_protocol!("missing engine status"))
    }
}

/// Encode and send `rows` as one or more BULK_EXECUTE commands.
///
/// A new command starts whenever the parameter type signature changes or
/// the running payload would reach `max_allowed_packet`; in the latter
/// case a half-written row is carried over into the fresh command.
/// `sent` counts commands actually flushed, so the caller can collect the
/// matching number of responses even when encoding fails part-way.
pub(crate) fn send_bulk<S: Read + Write>(
    stream: &mut MariaDbStream<S>,
    statement_id: u32,
    rows: &[Vec<MariaDbValue>],
    sent: &mut usize,
) -> Result<()> {
    let mut signature = bulk_signature(&rows[0])?;

    stream.begin_command();
    write_bulk_header(&mut stream.wbuf, statement_id, &signature);
    let mut header_len = stream.wbuf.len();

    for row in rows {
        if signature_changed(&signature, row)? {
            stream.flush_command()?;
            *sent += 1;

            signature = bulk_signature(row)?;
            stream.begin_command();
            write_bulk_header(&mut stream.wbuf, statement_id, &signature);
            header_len = stream.wbuf.len();
        }

        let row_start = stream.wbuf.len();

        for value in row {
            if value.is_null() {
                stream.wbuf.put_u8(0x01);
            } else {
                stream.wbuf.put_u8(0x00);
                value.encode_binary(&mut stream.wbuf)?;
            }
        }

        if stream.wbuf.len() >= stream.max_allowed_packet {
            if row_start == header_len {
                // a single row cannot be split across commands
                let size = stream.wbuf.len();
                stream.wbuf.clear();

                return Err(Error::MaxAllowedPacket {
                    size,
                    max_allowed_packet: stream.max_allowed_packet,
                });
            }

            // flush the complete rows, carry the straddling one over
            let tail = stream.wbuf.split_off(row_start);
            stream.flush_command()?;
            *sent += 1;

            stream.begin_command();
            write_bulk_header(&mut stream.wbuf, statement_id, &signature);
            header_len = stream.wbuf.len();
            stream.wbuf.extend_from_slice(&tail);

            if stream.wbuf.len() >= stream.max_allowed_packet {
                let size = stream.wbuf.len();
                stream.wbuf.clear();

                return Err(Error::MaxAllowedPacket {
                    size,
                    max_allowed_packet: stream.max_allowed_packet,
                });
            }
        }
    }

    stream.flush_command()?;
    *sent += 1;

    Ok(())
}

fn write_bulk_header(buf: &mut Vec<u8>, statement_id: u32, signature: &[DataType]) {
    // COM_STMT_BULK_EXECUTE : int<1>
    buf.put_u8(0xfa);

    // statement id : int<4>
    buf.put_u32::<LittleEndian>(statement_id);

    // flags (SEND_TYPES_TO_SERVER) : int<2>
    buf.put_u16::<LittleEndian>(0x0080);

    // one field type per parameter column : int<2>
    for data_type in signature {
        buf.put_u16::<LittleEndian>(*data_type as u8 as u16);
    }
}

// A NULL parameter carries no type of its own: the first row defaults it
// to VARSTRING and later rows never count it as a signature change.
fn bulk_signature(row: &[MariaDbValue]) -> Result<Vec<DataType>> {
    row.iter()
        .map(|value| {
            Ok(if value.is_null() {
                DataType::VarString
            } else {
                value.binary_type()?.0
            })
        })
        .collect()
}

fn signature_changed(signature: &[DataType], row: &[MariaDbValue]) -> Result<bool> {
    for (expected, value) in signature.iter().zip(row) {
        if !value.is_null() && value.binary_type()?.0 != *expected {
            return Ok(true);
        }
    }

    Ok(false)
}
