//! Parsing of the ingredient catalogue CSV (`name,measurement_unit`).
//!
//! Catalogue files come from spreadsheets saved in whatever encoding the
//! author's machine used, so decoding tries UTF-8 first and then the
//! single-byte Cyrillic code page. windows-1251 maps every byte except 0x98,
//! so it is the last encoding worth trying.

use encoding_rs::{Encoding, UTF_8, WINDOWS_1251};

use crate::error::ImportError;
use crate::validation::{INGREDIENT_NAME_MAX_LENGTH, MEASUREMENT_UNIT_MAX_LENGTH};

const FALLBACK_ENCODINGS: &[&Encoding] = &[UTF_8, WINDOWS_1251];

const HEADER_UNIT_LABELS: &[&str] = &["unit", "measurement_unit", "единица"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientRow {
    pub name: String,
    pub measurement_unit: String,
}

pub fn parse_ingredients_csv(bytes: &[u8]) -> Result<Vec<IngredientRow>, ImportError> {
    let text = decode(bytes)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let (Some(name), Some(unit)) = (record.get(0), record.get(1)) else {
            continue;
        };
        let (name, unit) = (name.trim(), unit.trim());
        if name.is_empty() || unit.is_empty() {
            continue;
        }
        if is_header(name, unit) {
            continue;
        }
        if name.chars().count() > INGREDIENT_NAME_MAX_LENGTH
            || unit.chars().count() > MEASUREMENT_UNIT_MAX_LENGTH
        {
            tracing::warn!(name, unit, "skipping ingredient row with over-long fields");
            continue;
        }
        rows.push(IngredientRow {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        });
    }

    Ok(rows)
}

fn is_header(name: &str, unit: &str) -> bool {
    name.to_lowercase() == "name" && HEADER_UNIT_LABELS.contains(&unit.to_lowercase().as_str())
}

fn decode(bytes: &[u8]) -> Result<String, ImportError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    for encoding in FALLBACK_ENCODINGS {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            if *encoding != UTF_8 {
                tracing::info!(encoding = encoding.name(), "decoded ingredient CSV");
            }
            return Ok(text.into_owned());
        }
    }
    Err(ImportError::UndecodableInput)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str) -> IngredientRow {
        IngredientRow {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        }
    }

    #[test]
    fn test_plain_rows() {
        let rows = parse_ingredients_csv(b"flour,g\nmilk,ml\n").unwrap();
        assert_eq!(rows, vec![row("flour", "g"), row("milk", "ml")]);
    }

    #[test]
    fn test_skips_header_blank_and_short_rows() {
        let csv = "name,measurement_unit\nsugar,g\n\nlonely\n , g\nsalt,\neggs,pcs,extra\n";
        let rows = parse_ingredients_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows, vec![row("sugar", "g"), row("eggs", "pcs")]);
    }

    #[test]
    fn test_quoted_names_with_commas() {
        let rows = parse_ingredients_csv(b"\"pepper, black\",g\n").unwrap();
        assert_eq!(rows, vec![row("pepper, black", "g")]);
    }

    #[test]
    fn test_strips_utf8_bom() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice("абрикосы,г\n".as_bytes());
        let rows = parse_ingredients_csv(&bytes).unwrap();
        assert_eq!(rows, vec![row("абрикосы", "г")]);
    }

    #[test]
    fn test_falls_back_to_windows_1251() {
        let (encoded, _, _) = WINDOWS_1251.encode("соль,г\n");
        let rows = parse_ingredients_csv(&encoded).unwrap();
        assert_eq!(rows, vec![row("соль", "г")]);
    }

    #[test]
    fn test_undecodable_bytes_are_rejected() {
        // 0x98 is neither valid UTF-8 here nor mapped in windows-1251.
        assert!(matches!(
            parse_ingredients_csv(b"salt,\x98\n"),
            Err(ImportError::UndecodableInput)
        ));
    }

    #[test]
    fn test_cyrillic_header_is_skipped() {
        let rows = parse_ingredients_csv("Name,Единица\nрис,г\n".as_bytes()).unwrap();
        assert_eq!(rows, vec![row("рис", "г")]);
    }
}
