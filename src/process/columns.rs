// src/process/columns.rs
use calamine::Data;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static NON_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_]").expect("column name regexes are valid"));
static UNDERSCORE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_+").expect("column name regexes are valid"));

/// Spreadsheet headers carry unit and format annotations that SQL column
/// names cannot; rewrite the common ones into words before stripping.
static ANNOTATIONS: &[(&str, &str)] = &[
    ("(mm/dd/yyyy)", "date"),
    ("($)", "usd"),
    ("(#)", "number"),
    ("(type)", "type"),
    ("(current)", "current"),
    ("[current]", "current"),
    ("&", "and"),
    ("@", "at"),
];

/// Lowercase a raw header into a SQL-safe identifier.
pub fn clean_name(raw: &str) -> String {
    let mut name = raw.to_lowercase().trim().to_string();
    for (pattern, replacement) in ANNOTATIONS {
        name = name.replace(pattern, replacement);
    }

    let name = NON_IDENT.replace_all(&name, "_");
    let name = UNDERSCORE_RUNS.replace_all(&name, "_");
    let name = name.trim_matches('_').to_string();

    if name.chars().next().map_or(false, |c| c.is_ascii_digit()) {
        format!("col_{}", name)
    } else {
        name
    }
}

/// Normalize every header cell of a sheet: blank or unusable headers become
/// `col_<index>`, and duplicates get `_1`, `_2`, … suffixes so the output
/// columns stay unique.
pub fn normalize_headers(cells: &[Data]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut headers = Vec::with_capacity(cells.len());

    for (idx, cell) in cells.iter().enumerate() {
        let raw = match cell {
            Data::Empty => String::new(),
            other => other.to_string(),
        };

        let mut name = clean_name(&raw);
        if name.is_empty() {
            name = format!("col_{}", idx);
        }

        if seen.contains(&name) {
            let mut n = 1;
            while seen.contains(&format!("{}_{}", name, n)) {
                n += 1;
            }
            name = format!("{}_{}", name, n);
        }
        seen.insert(name.clone());
        headers.push(name);
    }

    headers
}

/// Derive the output file stem for a sheet name, with the same cleaning
/// rules as column names.
pub fn sheet_file_stem(sheet_name: &str) -> String {
    let stem = clean_name(sheet_name);
    if stem.is_empty() {
        "sheet".to_string()
    } else {
        stem
    }
}
