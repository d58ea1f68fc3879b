//! CSV parsing for spreadsheet exports.
//!
//! Two dialects are handled. Sheet exports may embed multi-line post bodies
//! inside quoted fields, so [`parse_sheet`] runs a full quote-aware scanner
//! over the whole text. Analytics exports are one record per physical line,
//! so [`parse_lines`] applies the same quote-escape rule line by line.
//!
//! Both return rows keyed by the header record; missing trailing fields
//! resolve to the empty string rather than being absent. Malformed or empty
//! input yields an empty result, never an error.

/// A parsed row: header names paired positionally with trimmed values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    headers: std::sync::Arc<Vec<String>>,
    values: Vec<String>,
}

impl CsvRow {
    /// Value for a header, or `""` if the column is missing.
    #[must_use]
    pub fn get(&self, header: &str) -> &str {
        self.headers
            .iter()
            .position(|h| h == header)
            .and_then(|i| self.values.get(i))
            .map_or("", String::as_str)
    }

    /// First non-empty value among several header spellings.
    #[must_use]
    pub fn get_any(&self, headers: &[&str]) -> &str {
        headers
            .iter()
            .map(|h| self.get(h))
            .find(|v| !v.is_empty())
            .unwrap_or("")
    }

    /// Leading-digits integer value, defaulting to 0 on anything unparseable.
    #[must_use]
    pub fn num(&self, header: &str) -> u64 {
        parse_leading_u64(self.get(header))
    }

    /// Leading-digits integer across several header spellings.
    #[must_use]
    pub fn num_any(&self, headers: &[&str]) -> u64 {
        headers
            .iter()
            .map(|h| parse_leading_u64(self.get(h)))
            .find(|n| *n > 0)
            .unwrap_or(0)
    }
}

/// Result of parsing a full sheet export.
#[derive(Debug, Clone, Default)]
pub struct SheetCsv {
    pub headers: Vec<String>,
    pub rows: Vec<CsvRow>,
}

/// Parse a sheet tab export: quote-aware, multi-line fields, `""` escapes.
///
/// The header record defines the keys for every subsequent row. Fully-blank
/// records are skipped. A trailing content filter drops stray rows that
/// carry neither a post text (> 2 chars) nor a category (> 1 char), which
/// spreadsheet exports produce around merged or half-filled ranges.
#[must_use]
pub fn parse_sheet(text: &str) -> SheetCsv {
    let records = scan_records(text);
    let Some((header_rec, rest)) = records.split_first() else {
        return SheetCsv::default();
    };

    let headers = std::sync::Arc::new(header_rec.clone());
    let rows = rest
        .iter()
        .map(|rec| {
            let mut values = rec.clone();
            values.resize(headers.len(), String::new());
            CsvRow {
                headers: headers.clone(),
                values,
            }
        })
        .filter(|row| {
            let post = row.get_any(&["Post", "Post text"]);
            let cat = row.get("Category");
            post.len() > 2 || cat.len() > 1
        })
        .collect();

    SheetCsv {
        headers: header_rec.clone(),
        rows,
    }
}

/// Parse a one-record-per-line analytics export.
///
/// Lines that resolve to fewer than 2 fields are dropped; so is everything
/// when the input has no data line under the header.
#[must_use]
pub fn parse_lines(text: &str) -> Vec<CsvRow> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return Vec::new();
    }

    let headers: Vec<String> = scan_line(lines[0])
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();
    let headers = std::sync::Arc::new(headers);

    lines[1..]
        .iter()
        .filter_map(|line| {
            let fields = scan_line(line);
            if fields.len() < 2 {
                return None;
            }
            let mut values: Vec<String> =
                fields.into_iter().map(|f| f.trim().to_string()).collect();
            values.resize(headers.len(), String::new());
            Some(CsvRow {
                headers: headers.clone(),
                values,
            })
        })
        .collect()
}

/// Scan raw text into records of trimmed fields, honoring quoted fields
/// with embedded commas, newlines and doubled-quote escapes.
fn scan_records(text: &str) -> Vec<Vec<String>> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut records = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if in_quotes {
            if ch == '"' {
                if chars.get(i + 1) == Some(&'"') {
                    field.push('"');
                    i += 1;
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(ch);
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == ',' {
            current.push(field.trim().to_string());
            field.clear();
        } else if ch == '\n' || ch == '\r' {
            if ch == '\r' && chars.get(i + 1) == Some(&'\n') {
                i += 1;
            }
            current.push(field.trim().to_string());
            field.clear();
            if current.iter().any(|f| !f.is_empty()) {
                records.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        } else {
            field.push(ch);
        }
        i += 1;
    }
    current.push(field.trim().to_string());
    if current.iter().any(|f| !f.is_empty()) {
        records.push(current);
    }

    records
}

/// Split one physical line into fields, honoring `""` escapes inside quotes.
fn scan_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if ch == '"' {
            if in_quotes && chars.get(i + 1) == Some(&'"') {
                field.push('"');
                i += 1;
            } else {
                in_quotes = !in_quotes;
            }
        } else if ch == ',' && !in_quotes {
            fields.push(std::mem::take(&mut field));
        } else {
            field.push(ch);
        }
        i += 1;
    }
    fields.push(field);
    fields
}

fn parse_leading_u64(value: &str) -> u64 {
    let digits: String = value
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        let parsed = parse_sheet("");
        assert!(parsed.headers.is_empty());
        assert!(parsed.rows.is_empty());
        assert!(parse_sheet("   \n  \n").rows.is_empty());
    }

    #[test]
    fn test_multiline_quoted_field() {
        let parsed = parse_sheet("Post text,Impressions\n\"multi\nline post\",120\n");
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].get("Post text"), "multi\nline post");
        assert_eq!(parsed.rows[0].get("Impressions"), "120");
    }

    #[test]
    fn test_doubled_quote_escape() {
        let parsed = parse_sheet("Post,Category\n\"he said \"\"gm\"\" today\",growth\n");
        assert_eq!(parsed.rows[0].get("Post"), "he said \"gm\" today");
    }

    #[test]
    fn test_embedded_comma() {
        let parsed = parse_sheet("Post,Category\n\"one, two, three\",market\n");
        assert_eq!(parsed.rows[0].get("Post"), "one, two, three");
        assert_eq!(parsed.rows[0].get("Category"), "market");
    }

    #[test]
    fn test_crlf_endings() {
        let parsed = parse_sheet("Post,Category\r\nhello world,growth\r\n");
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].get("Post"), "hello world");
    }

    #[test]
    fn test_missing_trailing_fields_become_empty() {
        let parsed = parse_sheet("Post,Category,Score\nsome post text\n");
        assert_eq!(parsed.rows[0].get("Post"), "some post text");
        assert_eq!(parsed.rows[0].get("Category"), "");
        assert_eq!(parsed.rows[0].get("Score"), "");
    }

    #[test]
    fn test_blank_records_skipped() {
        let parsed = parse_sheet("Post,Category\n,\nreal post,growth\n , \n");
        assert_eq!(parsed.rows.len(), 1);
    }

    #[test]
    fn test_content_filter_drops_stray_rows() {
        // "ab" is not > 2 chars and "g" is not > 1 char
        let parsed = parse_sheet("Post,Category\nab,g\nabc,\n,growth\n");
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].get("Post"), "abc");
        assert_eq!(parsed.rows[1].get("Category"), "growth");
    }

    #[test]
    fn test_field_roundtrip() {
        let original = "line one\nline two, with comma and \"quotes\"";
        let escaped = original.replace('"', "\"\"");
        let text = format!("Post,Category\n\"{escaped}\",growth\n");
        let parsed = parse_sheet(&text);
        assert_eq!(parsed.rows[0].get("Post"), original);
    }

    #[test]
    fn test_parse_lines_basic() {
        let rows = parse_lines("Date,Impressions,Likes\nFeb 12 2026,1200,40\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].num("Impressions"), 1200);
    }

    #[test]
    fn test_parse_lines_drops_short_rows() {
        let rows = parse_lines("Date,Impressions\njunk\nFeb 12 2026,1200\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Date"), "Feb 12 2026");
    }

    #[test]
    fn test_parse_lines_header_only() {
        assert!(parse_lines("Date,Impressions\n").is_empty());
    }

    #[test]
    fn test_get_any_prefers_first_nonempty() {
        let rows = parse_lines("Tweet text,Post text\n,actual\n");
        assert_eq!(rows[0].get_any(&["Post text", "Tweet text"]), "actual");
    }

    #[test]
    fn test_num_parses_leading_digits() {
        let rows = parse_lines("Impressions,Likes\n1200 views,n/a\n");
        assert_eq!(rows[0].num("Impressions"), 1200);
        assert_eq!(rows[0].num("Likes"), 0);
    }
}
