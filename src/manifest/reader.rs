//! Strict comma-separated record reader.
//!
//! Accepts the common quoting rules: a field wrapped in double quotes may hold
//! commas, newlines and doubled quotes (`""`). Anything looser, such as a quote
//! in the middle of an unquoted field, is rejected with a line number so the
//! operator can fix the manifest instead of downloading from a garbled row.

use super::error::ManifestError;

/// How a field ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    Comma,
    EndOfRecord,
}

/// Reads every record from `input`, skipping blank lines.
///
/// # Errors
///
/// Returns [`ManifestError::Format`] for a bare quote inside an unquoted field,
/// an unterminated quoted field, or text directly after a closing quote.
pub(crate) fn read_records(input: &str) -> Result<Vec<Vec<String>>, ManifestError> {
    let mut reader = RecordReader::new(input);
    let mut records = Vec::new();
    while let Some(record) = reader.next_record()? {
        records.push(record);
    }
    Ok(records)
}

struct RecordReader<'a> {
    rest: &'a str,
    /// 1-based line of the next unread character.
    line: usize,
}

impl<'a> RecordReader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            rest: input,
            line: 1,
        }
    }

    fn next_record(&mut self) -> Result<Option<Vec<String>>, ManifestError> {
        while self.eat_newline() {}
        if self.rest.is_empty() {
            return Ok(None);
        }

        let mut fields = Vec::new();
        loop {
            let (field, terminator) = if self.rest.starts_with('"') {
                self.quoted_field()?
            } else {
                self.unquoted_field()?
            };
            fields.push(field);
            if terminator == Terminator::EndOfRecord {
                return Ok(Some(fields));
            }
        }
    }

    fn unquoted_field(&mut self) -> Result<(String, Terminator), ManifestError> {
        let end = self.rest.find([',', '\n']).unwrap_or(self.rest.len());
        let raw = &self.rest[..end];
        if raw.contains('"') {
            return Err(ManifestError::format(
                self.line,
                "bare quote in unquoted field",
            ));
        }
        self.rest = &self.rest[end..];

        if let Some(after_comma) = self.rest.strip_prefix(',') {
            self.rest = after_comma;
            return Ok((raw.to_string(), Terminator::Comma));
        }

        let field = raw.strip_suffix('\r').unwrap_or(raw).to_string();
        self.eat_newline();
        Ok((field, Terminator::EndOfRecord))
    }

    fn quoted_field(&mut self) -> Result<(String, Terminator), ManifestError> {
        let start_line = self.line;
        self.rest = &self.rest[1..];
        let mut field = String::new();

        loop {
            let Some(close) = self.rest.find('"') else {
                return Err(ManifestError::format(
                    start_line,
                    "unterminated quoted field",
                ));
            };
            let chunk = &self.rest[..close];
            self.line += chunk.matches('\n').count();
            field.push_str(&chunk.replace("\r\n", "\n"));
            self.rest = &self.rest[close + 1..];

            if let Some(after_escape) = self.rest.strip_prefix('"') {
                field.push('"');
                self.rest = after_escape;
                continue;
            }
            if let Some(after_comma) = self.rest.strip_prefix(',') {
                self.rest = after_comma;
                return Ok((field, Terminator::Comma));
            }
            if self.rest.is_empty() || self.eat_newline() {
                return Ok((field, Terminator::EndOfRecord));
            }
            return Err(ManifestError::format(
                self.line,
                "unexpected text after closing quote",
            ));
        }
    }

    /// Consumes one `\n` or `\r\n`, returning whether anything was consumed.
    fn eat_newline(&mut self) -> bool {
        let stripped = self
            .rest
            .strip_prefix("\r\n")
            .or_else(|| self.rest.strip_prefix('\n'));
        match stripped {
            Some(rest) => {
                self.rest = rest;
                self.line += 1;
                true
            }
            None => false,
        }
    }
}
