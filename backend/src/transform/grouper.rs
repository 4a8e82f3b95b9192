//! Group parsed rows by mode and fold each group into one token document.
//!
//! ```text
//! Rows                                  Documents
//! ┌─────────────────────────────┐      ┌──────────────────────────────┐
//! │ Theme: Light, Color: #fff   │      │ Light: { Theme, Color: #fff }│
//! │ Theme: Light, Color: ""     │  →   ├──────────────────────────────┤
//! │ Theme: Dark,  Color: #000   │      │ Dark:  { Theme, Color: #000 }│
//! └─────────────────────────────┘      └──────────────────────────────┘
//! ```
//!
//! Within a group later rows win per column, but blank cells never
//! overwrite a value set by an earlier row.

use std::collections::HashMap;

use crate::models::{cell_text, is_blank, AnomalyWarning, Row, Token, TokenDocument};
use crate::parser::type_cell;

/// Mode name carried by a row, if its mode-key cell is present and non-blank.
pub fn mode_of(row: &Row, mode_key: &str) -> Option<String> {
    row.get(mode_key)
        .filter(|cell| !is_blank(cell))
        .map(cell_text)
}

/// Distinct non-blank mode values in first-seen order.
pub fn extract_modes(rows: &[Row], mode_key: &str) -> Vec<String> {
    let mut modes: Vec<String> = Vec::new();
    for mode in rows.iter().filter_map(|row| mode_of(row, mode_key)) {
        if !modes.contains(&mode) {
            modes.push(mode);
        }
    }
    modes
}

/// Numeric and repeated mode values, in mode order.
///
/// Numeric warnings come first for a given mode.
pub fn detect_anomalies(rows: &[Row], mode_key: &str) -> Vec<AnomalyWarning> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for mode in rows.iter().filter_map(|row| mode_of(row, mode_key)) {
        *counts.entry(mode).or_default() += 1;
    }

    let mut warnings = Vec::new();
    for mode in extract_modes(rows, mode_key) {
        if type_cell(mode.trim(), true).is_number() {
            warnings.push(AnomalyWarning::NumericMode { mode: mode.clone() });
        }
        let occurrences = counts.get(&mode).copied().unwrap_or(0);
        if occurrences > 1 {
            warnings.push(AnomalyWarning::RepeatedMode { mode, occurrences });
        }
    }
    warnings
}

/// Rows belonging to `mode`, in original order.
pub fn rows_for_mode<'a>(rows: &'a [Row], mode_key: &str, mode: &str) -> Vec<&'a Row> {
    rows.iter()
        .filter(|row| mode_of(row, mode_key).as_deref() == Some(mode))
        .collect()
}

/// Fold rows into one document: last non-blank cell wins per column.
pub fn fold_rows<'a>(rows: impl IntoIterator<Item = &'a Row>) -> TokenDocument {
    let mut document = TokenDocument::new();
    for row in rows {
        for (column, cell) in row {
            if is_blank(cell) {
                continue;
            }
            document.set(column.clone(), Token::from_cell(cell));
        }
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenType;
    use serde_json::{json, Value};

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("row must be an object"),
        }
    }

    #[test]
    fn test_modes_first_seen_order() {
        let rows = vec![
            row(json!({ "Theme": "Dark" })),
            row(json!({ "Theme": "" })),
            row(json!({ "Theme": "Light" })),
            row(json!({ "Theme": "Dark" })),
            row(json!({ "Other": "x" })),
        ];

        assert_eq!(extract_modes(&rows, "Theme"), vec!["Dark", "Light"]);
    }

    #[test]
    fn test_numeric_mode_cells_named_by_text() {
        let rows = vec![row(json!({ "Size": 1 })), row(json!({ "Size": 2.5 }))];
        assert_eq!(extract_modes(&rows, "Size"), vec!["1", "2.5"]);
    }

    #[test]
    fn test_numeric_anomalies() {
        let rows = vec![
            row(json!({ "Mode": "1" })),
            row(json!({ "Mode": "2" })),
            row(json!({ "Mode": "Dark" })),
        ];

        let warnings = detect_anomalies(&rows, "Mode");
        assert_eq!(
            warnings,
            vec![
                AnomalyWarning::NumericMode { mode: "1".into() },
                AnomalyWarning::NumericMode { mode: "2".into() },
            ]
        );
    }

    #[test]
    fn test_repeated_anomalies() {
        let rows = vec![
            row(json!({ "Theme": "Light" })),
            row(json!({ "Theme": "Light" })),
            row(json!({ "Theme": "Dark" })),
        ];

        let warnings = detect_anomalies(&rows, "Theme");
        assert_eq!(
            warnings,
            vec![AnomalyWarning::RepeatedMode {
                mode: "Light".into(),
                occurrences: 2
            }]
        );
    }

    #[test]
    fn test_fold_last_non_blank_wins() {
        let rows = vec![
            row(json!({ "Theme": "Light", "Color": "#fff", "Size": 1 })),
            row(json!({ "Theme": "Light", "Color": "", "Size": 2 })),
            row(json!({ "Theme": "Light", "Color": null, "Size": "" })),
        ];

        let doc = fold_rows(&rows);
        assert_eq!(doc.get("Color").unwrap().value, json!("#fff"));
        assert_eq!(doc.get("Size").unwrap().value, json!(2));
        assert_eq!(doc.get("Size").unwrap().kind, TokenType::Number);
    }

    #[test]
    fn test_fold_blank_rows_give_empty_document() {
        let rows = vec![
            row(json!({ "A": "", "B": null })),
            row(json!({ "A": "  ", "B": "" })),
        ];
        assert!(fold_rows(&rows).is_empty());
    }

    #[test]
    fn test_rows_for_mode_keeps_order() {
        let rows = vec![
            row(json!({ "Theme": "Light", "n": "a" })),
            row(json!({ "Theme": "Dark", "n": "b" })),
            row(json!({ "Theme": "Light", "n": "c" })),
        ];

        let light = rows_for_mode(&rows, "Theme", "Light");
        assert_eq!(light.len(), 2);
        assert_eq!(light[0]["n"], "a");
        assert_eq!(light[1]["n"], "c");
    }
}
