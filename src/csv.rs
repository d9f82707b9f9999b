// src/csv.rs
// Separator-delimited records with RFC 4180 quoting, as used by the store files.
use std::borrow::Cow;
use std::mem::take;

/// One parsed line. `line` is 1-based and points at where the record starts, so a quoted
/// field spanning lines still reports its first line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Quote-aware split into records. CRLF and LF both end a record; blank lines are skipped;
/// an unterminated quote runs to the end of the text.
pub fn parse_records(text: &str, sep: char) -> Vec<Record> {
    let mut out = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = s!();
    let mut quoted = false;
    let mut line = 1usize;
    let mut start = 1usize;
    let mut chars = text.chars().peekable();

    let mut flush = |fields: &mut Vec<String>, field: &mut String, start: usize| {
        fields.push(take(field));
        let blank = fields.len() == 1 && fields[0].is_empty();
        if blank {
            fields.clear();
        } else {
            out.push(Record { line: start, fields: take(fields) });
        }
    };

    while let Some(ch) = chars.next() {
        match ch {
            '"' if quoted && chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            '"' => quoted = !quoted,
            c if c == sep && !quoted => fields.push(take(&mut field)),
            '\r' | '\n' if !quoted => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                flush(&mut fields, &mut field, start);
                line += 1;
                start = line;
            }
            c => {
                if c == '\n' {
                    line += 1;
                }
                field.push(c);
            }
        }
    }
    if !fields.is_empty() || !field.is_empty() {
        flush(&mut fields, &mut field, start);
    }
    out
}

fn quote(field: &str, sep: char) -> Cow<'_, str> {
    if field.contains([sep, '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// One record, newline-terminated.
pub fn format_record<S: AsRef<str>>(fields: &[S], sep: char) -> String {
    let mut line = fields
        .iter()
        .map(|f| quote(f.as_ref(), sep))
        .collect::<Vec<_>>()
        .join(&sep.to_string());
    line.push('\n');
    line
}

pub fn records_to_string<S: AsRef<str>>(rows: &[Vec<S>], sep: char) -> String {
    rows.iter().map(|r| format_record(r, sep)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(recs: &[Record]) -> Vec<Vec<&str>> {
        recs.iter().map(|r| r.fields.iter().map(String::as_str).collect()).collect()
    }

    #[test]
    fn quoted_fields_survive() {
        let rows = vec![vec!["a,b", "say \"hi\"", "plain"]];
        let text = records_to_string(&rows, ',');
        assert_eq!(text, "\"a,b\",\"say \"\"hi\"\"\",plain\n");
        assert_eq!(fields(&parse_records(&text, ',')), vec![vec!["a,b", "say \"hi\"", "plain"]]);
    }

    #[test]
    fn blank_lines_and_trailing_newline() {
        assert_eq!(parse_records("k,v\r\n\n", ',').len(), 1);
        assert_eq!(fields(&parse_records("k,v", ',')), vec![vec!["k", "v"]]);
        assert!(parse_records("", ',').is_empty());
        // empty value is still two fields
        assert_eq!(fields(&parse_records("k,\n", ',')), vec![vec!["k", ""]]);
    }

    #[test]
    fn line_numbers_skip_blanks_and_multiline_fields() {
        let recs = parse_records("a,b\n\n\"x\ny\",z\nlast,1\n", ',');
        let lines: Vec<usize> = recs.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![1, 3, 5]);
        assert_eq!(recs[1].fields[0], "x\ny");
    }
}
