//! Barcode symbol encoding
//!
//! 1D symbologies use the barcoders crate and come back as a module row,
//! QR codes use the qrcode crate and come back as a square module grid.

use crate::model::Symbology;
use barcoders::sym::code128::Code128;
use barcoders::sym::code39::Code39;
use barcoders::sym::ean13::EAN13;
use qrcode::{Color as QrColor, EcLevel, QrCode};

/// Encoded symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    /// One entry per module, true for a bar
    Linear(Vec<bool>),
    /// `width * width` modules, row major, true for dark
    Matrix { width: usize, modules: Vec<bool> },
}

impl Symbol {
    /// Runs of dark modules in a row as (start, length)
    pub fn dark_runs(row: &[bool]) -> Vec<(usize, usize)> {
        let mut runs = Vec::new();
        let mut start = None;
        for (i, &dark) in row.iter().enumerate() {
            match (dark, start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    runs.push((s, i - s));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            runs.push((s, row.len() - s));
        }
        runs
    }
}

/// Encode `value` in `symbology`
pub fn encode(symbology: Symbology, value: &str) -> Result<Symbol, String> {
    if value.is_empty() {
        return Err("empty value".to_string());
    }
    match symbology {
        Symbology::Code39 => Code39::new(value.to_uppercase())
            .map(|b| linear(b.encode()))
            .map_err(|e| e.to_string()),
        Symbology::Code128 => {
            // character set B covers printable ASCII
            Code128::new(format!("\u{0181}{value}"))
                .map(|b| linear(b.encode()))
                .map_err(|e| e.to_string())
        }
        Symbology::Ean13 => {
            let digits = ean13_digits(value)?;
            EAN13::new(digits)
                .map(|b| linear(b.encode()))
                .map_err(|e| e.to_string())
        }
        Symbology::Qr => {
            let code = QrCode::with_error_correction_level(value.as_bytes(), EcLevel::M)
                .map_err(|e| e.to_string())?;
            let width = code.width();
            let modules = code
                .to_colors()
                .into_iter()
                .map(|c| c == QrColor::Dark)
                .collect();
            Ok(Symbol::Matrix { width, modules })
        }
    }
}

fn linear(encoded: Vec<u8>) -> Symbol {
    Symbol::Linear(encoded.into_iter().map(|m| m == 1).collect())
}

/// The 12 data digits of an EAN-13 value; a 13th check digit must match
fn ean13_digits(value: &str) -> Result<String, String> {
    let value = value.trim();
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("EAN-13 takes digits only: '{value}'"));
    }
    match value.len() {
        12 => Ok(value.to_string()),
        13 => {
            let (data, check) = value.split_at(12);
            if ean13_check_digit(data).to_string() == check {
                Ok(data.to_string())
            } else {
                Err(format!("EAN-13 check digit mismatch: '{value}'"))
            }
        }
        n => Err(format!("EAN-13 takes 12 or 13 digits, got {n}")),
    }
}

fn ean13_check_digit(data: &str) -> u32 {
    let sum: u32 = data
        .chars()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d } else { d * 3 })
        .sum();
    (10 - sum % 10) % 10
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_code128() {
        let Symbol::Linear(bars) = encode(Symbology::Code128, "Hello").unwrap() else {
            panic!("expected linear symbol");
        };
        assert!(bars.iter().any(|&b| b));
        assert!(bars[0]);
    }

    #[test]
    fn test_code39_uppercases() {
        assert!(matches!(
            encode(Symbology::Code39, "abc-1"),
            Ok(Symbol::Linear(_))
        ));
    }

    #[test]
    fn test_ean13_digits() {
        assert_eq!(ean13_check_digit("400638133393"), 1);
        assert_eq!(ean13_digits("4006381333931").unwrap(), "400638133393");
        assert!(ean13_digits("4006381333932").is_err());
        assert!(ean13_digits("12345").is_err());
        assert!(ean13_digits("40063813339A").is_err());
        assert!(matches!(
            encode(Symbology::Ean13, "400638133393"),
            Ok(Symbol::Linear(_))
        ));
    }

    #[test]
    fn test_qr_matrix() {
        let Symbol::Matrix { width, modules } = encode(Symbology::Qr, "HN-000123").unwrap()
        else {
            panic!("expected matrix symbol");
        };
        assert_eq!(width, 21);
        assert_eq!(modules.len(), width * width);
        // finder pattern corner
        assert!(modules[0]);
    }

    #[test]
    fn test_empty_value() {
        assert!(encode(Symbology::Code128, "").is_err());
    }

    #[test]
    fn test_dark_runs() {
        let row = [true, true, false, true, false, false, true];
        assert_eq!(Symbol::dark_runs(&row), vec![(0, 2), (3, 1), (6, 1)]);
        assert!(Symbol::dark_runs(&[false, false]).is_empty());
    }
}
