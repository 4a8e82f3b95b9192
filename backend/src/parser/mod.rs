//! CSV reader with encoding and delimiter auto-detection.
//!
//! Turns raw CSV bytes into ordered [`Row`]s keyed by the header line.
//! No token-specific logic here.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::Row;

/// Numbers as a spreadsheet export writes them: optional sign, decimals, exponent.
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?(\d+\.?|\.\d+|\d+\.\d+)([eE][-+]?\d+)?$").expect("valid number regex")
});

/// Options for the row parser.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    /// Fixed delimiter; auto-detected from the header line when `None`.
    pub delimiter: Option<char>,
    /// Turn numeric-looking cells into JSON numbers.
    ///
    /// When off every cell stays a string and every token is typed `string`.
    pub dynamic_typing: bool,
    /// Columns always kept as source text, whatever `dynamic_typing` says.
    pub untyped_columns: Vec<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            dynamic_typing: true,
            untyped_columns: Vec::new(),
        }
    }
}

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed rows, in file order
    pub records: Vec<Row>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers, in file order
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" | "utf-8-sig" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// A leading byte-order mark is dropped.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match String::from_utf8(bytes.to_vec()) {
            Ok(s) => s,
            Err(_) => String::from_utf8_lossy(bytes).to_string(),
        },
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        other => match encoding_rs::Encoding::for_label(other.as_bytes()) {
            Some(enc) => enc.decode(bytes).0.to_string(),
            None => String::from_utf8_lossy(bytes).to_string(),
        },
    };

    Ok(decoded.trim_start_matches('\u{feff}').to_string())
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// Falls back to `,` when none of the candidates appear.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Convert a raw cell to a JSON value.
///
/// Empty cells become empty strings; numbers are only sniffed when asked.
/// A number that would lose digits as `f64` stays a string.
pub fn type_cell(raw: &str, dynamic_typing: bool) -> Value {
    if dynamic_typing && NUMBER_RE.is_match(raw) {
        if let Some(n) = lossless_number(raw) {
            return Value::Number(n);
        }
    }
    Value::String(raw.to_string())
}

/// Integers up to this magnitude are exact in an `f64` (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Digits an `f64` always round-trips.
const MAX_SIGNIFICANT_DIGITS: usize = 15;

fn lossless_number(raw: &str) -> Option<Number> {
    if let Ok(i) = raw.parse::<i64>() {
        return (i.unsigned_abs() as f64 <= MAX_SAFE_INTEGER).then(|| Number::from(i));
    }

    let f = raw.parse::<f64>().ok()?;
    if f.abs() > MAX_SAFE_INTEGER || significant_digits(raw) > MAX_SIGNIFICANT_DIGITS {
        return None;
    }
    Number::from_f64(f)
}

/// Significant digits of the mantissa, leading and trailing zeros excluded.
fn significant_digits(raw: &str) -> usize {
    let mantissa = raw.split(['e', 'E']).next().unwrap_or(raw);
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    digits.trim_start_matches('0').trim_end_matches('0').len()
}

fn reader(content: &str, delimiter: char) -> CsvResult<csv::Reader<&[u8]>> {
    let delimiter = u8::try_from(delimiter).map_err(|_| CsvError::ParseError {
        line: 1,
        message: format!("Delimiter '{}' is not a single-byte character", delimiter),
    })?;

    Ok(csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes()))
}

/// Read the header line.
///
/// Repeated header names get a `_1`, `_2`... suffix so no column is lost.
pub fn parse_header(content: &str, delimiter: char) -> CsvResult<Vec<String>> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut rdr = reader(content, delimiter)?;
    let raw = rdr.headers()?.clone();

    if raw.is_empty() || raw.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut headers: Vec<String> = Vec::with_capacity(raw.len());
    for name in raw.iter() {
        let mut candidate = name.to_string();
        let mut n = 1;
        while headers.contains(&candidate) {
            candidate = format!("{}_{}", name, n);
            n += 1;
        }
        headers.push(candidate);
    }

    Ok(headers)
}

/// Parse every data line into a [`Row`].
///
/// Short lines are padded with empty cells, extra cells are ignored and
/// blank lines are skipped.
pub fn parse_all(content: &str, delimiter: char, dynamic_typing: bool) -> CsvResult<Vec<Row>> {
    parse_rows(content, delimiter, dynamic_typing, &[])
}

fn parse_rows(
    content: &str,
    delimiter: char,
    dynamic_typing: bool,
    untyped_columns: &[String],
) -> CsvResult<Vec<Row>> {
    let headers = parse_header(content, delimiter)?;
    let typed: Vec<bool> = headers
        .iter()
        .map(|h| dynamic_typing && !untyped_columns.contains(h))
        .collect();
    let mut rdr = reader(content, delimiter)?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;

        if record.iter().all(|c| c.is_empty()) && record.len() <= 1 {
            continue;
        }

        let mut row = Row::new();
        for (i, header) in headers.iter().enumerate() {
            let raw = record.get(i).unwrap_or("");
            row.insert(header.clone(), type_cell(raw, typed[i]));
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Parse CSV text with explicit options and return metadata.
pub fn parse_string_with_metadata(
    content: &str,
    options: &ParseOptions,
    encoding: String,
) -> CsvResult<ParseResult> {
    let delimiter = options
        .delimiter
        .unwrap_or_else(|| detect_delimiter(content));

    let headers = parse_header(content, delimiter)?;
    let records = parse_rows(
        content,
        delimiter,
        options.dynamic_typing,
        &options.untyped_columns,
    )?;

    Ok(ParseResult {
        records,
        encoding,
        delimiter,
        headers,
    })
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8], options: &ParseOptions) -> CsvResult<ParseResult> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;

    parse_string_with_metadata(&content, options, encoding)
}

/// Parse CSV file with auto-detection of encoding and delimiter.
///
/// # Example
/// ```ignore
/// let result = parse_csv_file_auto("/path/to/themes.csv", &ParseOptions::default())?;
/// println!("Encoding: {}, Delimiter: '{}'", result.encoding, result.delimiter);
/// println!("Rows: {}", result.records.len());
/// ```
pub fn parse_csv_file_auto<P: AsRef<Path>>(
    path: P,
    options: &ParseOptions,
) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_csv() {
        let csv = "Theme,Color\nLight,#fff\nDark,#000";
        let rows = parse_all(csv, ',', true).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Theme"], "Light");
        assert_eq!(rows[0]["Color"], "#fff");
        assert_eq!(rows[1]["Theme"], "Dark");
        assert_eq!(rows[1]["Color"], "#000");
    }

    #[test]
    fn test_header_order_preserved() {
        let csv = "Zeta,Alpha,Mid\n1,2,3";
        let rows = parse_all(csv, ',', false).unwrap();
        let keys: Vec<&String> = rows[0].keys().collect();
        assert_eq!(keys, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_quoted_values() {
        let csv = "Theme,Font\n\"Light\",\"Inter, sans-serif\"";
        let rows = parse_all(csv, ',', true).unwrap();

        assert_eq!(rows[0]["Theme"], "Light");
        assert_eq!(rows[0]["Font"], "Inter, sans-serif");
    }

    #[test]
    fn test_empty_lines_skipped() {
        let csv = "a,b\nx,2\n\ny,4\n";
        let rows = parse_all(csv, ',', true).unwrap();

        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_missing_values() {
        let csv = "a;b;c\nx;;z";
        let rows = parse_all(csv, ';', true).unwrap();

        assert_eq!(rows[0]["a"], "x");
        assert_eq!(rows[0]["b"], "");
        assert_eq!(rows[0]["c"], "z");
    }

    #[test]
    fn test_short_and_long_rows() {
        let csv = "a,b,c\nx\ny,2,3,4";
        let rows = parse_all(csv, ',', false).unwrap();

        assert_eq!(rows[0]["b"], "");
        assert_eq!(rows[0]["c"], "");
        assert_eq!(rows[1].len(), 3);
    }

    #[test]
    fn test_dynamic_typing() {
        let csv = "Theme,Size,Ratio,Code\nLight,12,1.5,007a";
        let rows = parse_all(csv, ',', true).unwrap();

        assert_eq!(rows[0]["Size"], json!(12));
        assert_eq!(rows[0]["Ratio"], json!(1.5));
        assert_eq!(rows[0]["Code"], json!("007a"));
    }

    #[test]
    fn test_without_dynamic_typing() {
        let csv = "Theme,Size\nLight,12";
        let rows = parse_all(csv, ',', false).unwrap();

        assert_eq!(rows[0]["Size"], json!("12"));
    }

    #[test]
    fn test_type_cell() {
        assert_eq!(type_cell("-3", true), json!(-3));
        assert_eq!(type_cell(".5", true), json!(0.5));
        assert_eq!(type_cell("1e3", true), json!(1000.0));
        assert_eq!(type_cell("", true), json!(""));
        assert_eq!(type_cell("#fff", true), json!("#fff"));
        assert_eq!(type_cell("12px", true), json!("12px"));
    }

    #[test]
    fn test_type_cell_keeps_digits() {
        assert_eq!(type_cell("12345678901234567890", true), json!("12345678901234567890"));
        assert_eq!(type_cell("9007199254740993", true), json!("9007199254740993"));
        assert_eq!(type_cell("9007199254740992", true), json!(9007199254740992i64));
        assert_eq!(type_cell("0.12345678901234567", true), json!("0.12345678901234567"));
        assert_eq!(type_cell("1e300", true), json!("1e300"));
        assert_eq!(type_cell("1.50", true), json!(1.5));
        assert_eq!(type_cell("0.000123", true), json!(0.000123));
    }

    #[test]
    fn test_untyped_columns() {
        let options = ParseOptions {
            untyped_columns: vec!["Size".into()],
            ..ParseOptions::default()
        };
        let result = parse_string_with_metadata("Size,Gap\n01,4\n1.50,8", &options, "utf-8".into()).unwrap();

        assert_eq!(result.records[0]["Size"], json!("01"));
        assert_eq!(result.records[1]["Size"], json!("1.50"));
        assert_eq!(result.records[0]["Gap"], json!(4));
    }

    #[test]
    fn test_duplicate_headers_renamed() {
        let headers = parse_header("Name,Name,Name\n", ',').unwrap();
        assert_eq!(headers, vec!["Name", "Name_1", "Name_2"]);
    }

    #[test]
    fn test_empty_csv_error() {
        let result = parse_header("", ',');
        assert!(matches!(result, Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_header_only() {
        let csv = "Theme,Color\n";
        let result = parse_bytes_auto(csv.as_bytes(), &ParseOptions::default()).unwrap();
        assert_eq!(result.headers, vec!["Theme", "Color"]);
        assert!(result.records.is_empty());
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        let content = "a;b;c\n1;2;3";
        assert_eq!(detect_delimiter(content), ';');
    }

    #[test]
    fn test_detect_delimiter_comma() {
        let content = "a,b,c\n1,2,3";
        assert_eq!(detect_delimiter(content), ',');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        let content = "a\tb\tc\n1\t2\t3";
        assert_eq!(detect_delimiter(content), '\t');
    }

    #[test]
    fn test_detect_delimiter_single_column() {
        assert_eq!(detect_delimiter("Theme\nLight"), ',');
    }

    #[test]
    fn test_auto_parse() {
        let csv = "Theme;Spacing\nLight;4\nDark;8";
        let result = parse_bytes_auto(csv.as_bytes(), &ParseOptions::default()).unwrap();

        assert_eq!(result.delimiter, ';');
        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.headers, vec!["Theme", "Spacing"]);
    }

    #[test]
    fn test_bom_stripped() {
        let bytes = b"\xEF\xBB\xBFTheme,Color\nLight,#fff";
        let result = parse_bytes_auto(bytes, &ParseOptions::default()).unwrap();
        assert_eq!(result.headers[0], "Theme");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }
}
