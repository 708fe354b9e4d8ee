//! Display formatting of bound values
//!
//! Format strings use the invariant-culture conventions report designers
//! already know:
//! - standard numeric: `N2`, `F0`, `D5`, `P1`, `X4`, `C2`, `G`
//! - custom numeric: `#,##0.00`, `0000`, `0.0 mg`, `#%`
//! - dates on ISO-8601 strings: `dd/MM/yyyy HH:mm`, standard `d`, `D`, `s`, `t`, `T`, `g`, `G`
//! - composite: `{0:N2} mg`, `Born {0:yyyy}`
//!
//! Every function returns `None` when the format cannot be applied to the
//! value; callers fall back to the plain string form.

use super::value_to_string;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde_json::Value;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Format a resolved value
pub fn format_value(value: &Value, format: &str) -> Option<String> {
    if format.is_empty() {
        return None;
    }
    if format.contains('{') || format.contains('}') {
        return format_composite(value, format);
    }
    format_single(value, format)
}

fn format_single(value: &Value, format: &str) -> Option<String> {
    if let Some(n) = as_number(value) {
        if let Some(text) = format_standard_numeric(n, format) {
            return Some(text);
        }
        if format.contains(['#', '0']) {
            return format_custom_numeric(n, format);
        }
    }
    let date = as_datetime(value)?;
    format_date(&date, format)
}

/// `{0}` / `{0:spec}` placeholders with literal text around them
fn format_composite(value: &Value, format: &str) -> Option<String> {
    let mut out = String::with_capacity(format.len());
    let mut rest = format;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("{{") {
            out.push('{');
            rest = after;
            continue;
        }
        if let Some(after) = tail.strip_prefix("}}") {
            out.push('}');
            rest = after;
            continue;
        }
        if tail.starts_with('}') {
            return None;
        }

        let close = tail.find('}')?;
        let item = &tail[1..close];
        let (index, spec) = match item.split_once(':') {
            Some((index, spec)) => (index, Some(spec)),
            None => (item, None),
        };
        // alignment (",10") is accepted and ignored
        let index = index.split(',').next().unwrap_or_default().trim();
        if index != "0" {
            return None;
        }

        let piece = match spec {
            Some(spec) if !spec.is_empty() => format_single(value, spec)?,
            _ => value_to_string(value),
        };
        out.push_str(&piece);
        rest = &tail[close + 1..];
    }

    out.push_str(rest);
    Some(out)
}

fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn as_integer(n: f64) -> Option<i64> {
    (n.fract() == 0.0 && n.abs() < i64::MAX as f64).then_some(n as i64)
}

fn as_datetime(value: &Value) -> Option<NaiveDateTime> {
    let Value::String(s) = value else {
        return None;
    };
    let s = s.trim();

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, pattern) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
}

/// Round half away from zero to `decimals` places
fn round_to(n: f64, decimals: usize) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (n * factor).round() / factor
}

/// Insert `,` every three digits of an integer digit string
fn group_thousands(digits: &str) -> String {
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    let len = digits.len();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

fn has_nonzero_digit(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit() && c != '0')
}

/// Fixed-point rendering, optionally grouped
fn fixed(n: f64, decimals: usize, grouping: bool) -> String {
    let text = format!("{:.*}", decimals, round_to(n.abs(), decimals));
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (text.as_str(), None),
    };
    let int_part = if grouping {
        group_thousands(int_part)
    } else {
        int_part.to_string()
    };
    let sign = if n < 0.0 && has_nonzero_digit(&text) {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{sign}{int_part}.{frac}"),
        None => format!("{sign}{int_part}"),
    }
}

fn plain_number(n: f64) -> String {
    match as_integer(n) {
        Some(i) => i.to_string(),
        None => n.to_string(),
    }
}

fn format_standard_numeric(n: f64, format: &str) -> Option<String> {
    let mut chars = format.chars();
    let spec = chars.next()?;
    let rest = chars.as_str();
    let precision: Option<usize> = if rest.is_empty() {
        None
    } else if rest.len() <= 2 && rest.chars().all(|c| c.is_ascii_digit()) {
        rest.parse().ok()
    } else {
        return None;
    };

    match spec.to_ascii_uppercase() {
        'N' => Some(fixed(n, precision.unwrap_or(2), true)),
        'F' => Some(fixed(n, precision.unwrap_or(2), false)),
        'P' => Some(format!("{} %", fixed(n * 100.0, precision.unwrap_or(2), true))),
        'C' => {
            let body = fixed(n.abs(), precision.unwrap_or(2), true);
            if n < 0.0 && has_nonzero_digit(&body) {
                Some(format!("(¤{body})"))
            } else {
                Some(format!("¤{body}"))
            }
        }
        'D' => {
            let i = as_integer(n)?;
            let digits = format!("{:0>width$}", i.unsigned_abs(), width = precision.unwrap_or(0));
            Some(if i < 0 { format!("-{digits}") } else { digits })
        }
        'X' => {
            let i = as_integer(n).filter(|i| *i >= 0)?;
            let width = precision.unwrap_or(0);
            Some(if spec == 'X' {
                format!("{i:0>width$X}")
            } else {
                format!("{i:0>width$x}")
            })
        }
        'G' if precision.is_none() => Some(plain_number(n)),
        _ => None,
    }
}

/// `#`, `0`, `,` and `.` placeholders with literal text before and after
fn format_custom_numeric(n: f64, pattern: &str) -> Option<String> {
    let start = pattern.find(['#', '0', ','])?;
    let end = pattern.rfind(['#', '0'])? + 1;
    if end <= start {
        return None;
    }
    let (prefix, core, suffix) = (&pattern[..start], &pattern[start..end], &pattern[end..]);

    let value = if prefix.contains('%') || suffix.contains('%') {
        n * 100.0
    } else {
        n
    };

    let (int_pattern, frac_pattern) = core.split_once('.').unwrap_or((core, ""));
    let grouping = int_pattern.contains(',');
    let min_int = int_pattern.chars().filter(|c| *c == '0').count();
    let min_frac = frac_pattern.chars().filter(|c| *c == '0').count();
    let max_frac = frac_pattern
        .chars()
        .filter(|c| matches!(c, '0' | '#'))
        .count();

    let text = format!("{:.*}", max_frac, round_to(value.abs(), max_frac));
    let (int_digits, frac_digits) = text.split_once('.').unwrap_or((text.as_str(), ""));

    let mut frac = frac_digits.to_string();
    while frac.len() > min_frac && frac.ends_with('0') {
        frac.pop();
    }

    let int_digits = int_digits.trim_start_matches('0');
    let mut int = if int_digits.len() < min_int {
        format!("{}{int_digits}", "0".repeat(min_int - int_digits.len()))
    } else {
        int_digits.to_string()
    };
    if grouping {
        int = group_thousands(&int);
    }

    let body = if frac.is_empty() {
        int
    } else {
        format!("{int}.{frac}")
    };
    let sign = if value < 0.0 && has_nonzero_digit(&body) {
        "-"
    } else {
        ""
    };
    Some(format!("{sign}{prefix}{body}{suffix}"))
}

fn format_date(dt: &NaiveDateTime, format: &str) -> Option<String> {
    let pattern = match format {
        "d" => "MM/dd/yyyy",
        "D" => "dddd, dd MMMM yyyy",
        "s" => "yyyy-MM-ddTHH:mm:ss",
        "t" => "HH:mm",
        "T" => "HH:mm:ss",
        "g" => "MM/dd/yyyy HH:mm",
        "G" => "MM/dd/yyyy HH:mm:ss",
        "M" | "m" => "MMMM dd",
        "Y" | "y" => "yyyy MMMM",
        other => other,
    };
    format_date_pattern(dt, pattern)
}

fn format_date_pattern(dt: &NaiveDateTime, pattern: &str) -> Option<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut tokens = 0;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                let close = chars[i + 1..].iter().position(|q| *q == c)?;
                out.extend(&chars[i + 1..i + 1 + close]);
                i += close + 2;
            }
            '\\' => {
                out.push(*chars.get(i + 1)?);
                i += 2;
            }
            'y' | 'M' | 'd' | 'H' | 'h' | 'm' | 's' | 'f' | 't' => {
                let run = chars[i..].iter().take_while(|x| **x == c).count();
                out.push_str(&date_token(dt, c, run)?);
                tokens += 1;
                i += run;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    (tokens > 0).then_some(out)
}

fn date_token(dt: &NaiveDateTime, c: char, run: usize) -> Option<String> {
    let two = |v: u32| {
        if run >= 2 {
            format!("{v:02}")
        } else {
            v.to_string()
        }
    };
    let text = match c {
        'y' => match run {
            1 => (dt.year() % 100).to_string(),
            2 => format!("{:02}", dt.year() % 100),
            _ => format!("{:0>width$}", dt.year(), width = run),
        },
        'M' => match run {
            1 | 2 => two(dt.month()),
            3 => MONTH_NAMES[dt.month0() as usize][..3].to_string(),
            _ => MONTH_NAMES[dt.month0() as usize].to_string(),
        },
        'd' => match run {
            1 | 2 => two(dt.day()),
            3 => DAY_NAMES[dt.weekday().num_days_from_monday() as usize][..3].to_string(),
            _ => DAY_NAMES[dt.weekday().num_days_from_monday() as usize].to_string(),
        },
        'H' => two(dt.hour()),
        'h' => {
            let hour = dt.hour() % 12;
            two(if hour == 0 { 12 } else { hour })
        }
        'm' => two(dt.minute()),
        's' => two(dt.second()),
        'f' if run <= 7 => format!("{:09}", dt.nanosecond())[..run].to_string(),
        't' => {
            let marker = if dt.hour() < 12 { "AM" } else { "PM" };
            if run == 1 {
                marker[..1].to_string()
            } else {
                marker.to_string()
            }
        }
        _ => return None,
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fmt(value: Value, format: &str) -> Option<String> {
        format_value(&value, format)
    }

    #[test]
    fn test_standard_numeric() {
        assert_eq!(fmt(json!(1234.5678), "N2").as_deref(), Some("1,234.57"));
        assert_eq!(fmt(json!(1234.5678), "n0").as_deref(), Some("1,235"));
        assert_eq!(fmt(json!(-1234.5), "F1").as_deref(), Some("-1234.5"));
        assert_eq!(fmt(json!(42), "D5").as_deref(), Some("00042"));
        assert_eq!(fmt(json!(0.256), "P1").as_deref(), Some("25.6 %"));
        assert_eq!(fmt(json!(255), "X4").as_deref(), Some("00FF"));
        assert_eq!(fmt(json!(255), "x").as_deref(), Some("ff"));
        assert_eq!(fmt(json!(-3.5), "C").as_deref(), Some("(¤3.50)"));
        assert_eq!(fmt(json!(12.0), "G").as_deref(), Some("12"));
    }

    #[test]
    fn test_numeric_strings_are_numbers() {
        assert_eq!(fmt(json!("98.6"), "F0").as_deref(), Some("99"));
    }

    #[test]
    fn test_decimal_rejects_fractions() {
        assert_eq!(fmt(json!(1.5), "D"), None);
        assert_eq!(fmt(json!(-1), "X"), None);
    }

    #[test]
    fn test_custom_numeric() {
        assert_eq!(fmt(json!(1234.5), "#,##0.00").as_deref(), Some("1,234.50"));
        assert_eq!(fmt(json!(1234.56), "#,###.##").as_deref(), Some("1,234.56"));
        assert_eq!(fmt(json!(1000000), "#,###.##").as_deref(), Some("1,000,000"));
        assert_eq!(fmt(json!(42), "0000").as_deref(), Some("0042"));
        assert_eq!(fmt(json!(0.5), "#.##").as_deref(), Some(".5"));
        assert_eq!(fmt(json!(12.34), "0.0 mg").as_deref(), Some("12.3 mg"));
        assert_eq!(fmt(json!(0.256), "#%").as_deref(), Some("26%"));
        assert_eq!(fmt(json!(-7.25), "0.0").as_deref(), Some("-7.3"));
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1000"), "1,000");
        assert_eq!(group_thousands("1000000"), "1,000,000");
        assert_eq!(group_thousands("100"), "100");
        assert_eq!(group_thousands(""), "");
    }

    #[test]
    fn test_date_patterns() {
        let value = json!("2024-03-05T14:07:09");
        assert_eq!(fmt(value.clone(), "dd/MM/yyyy").as_deref(), Some("05/03/2024"));
        assert_eq!(fmt(value.clone(), "d MMM yy").as_deref(), Some("5 Mar 24"));
        assert_eq!(fmt(value.clone(), "hh:mm tt").as_deref(), Some("02:07 PM"));
        assert_eq!(fmt(value.clone(), "HH:mm:ss").as_deref(), Some("14:07:09"));
        assert_eq!(fmt(value.clone(), "dddd").as_deref(), Some("Tuesday"));
        assert_eq!(fmt(value, "s").as_deref(), Some("2024-03-05T14:07:09"));
    }

    #[test]
    fn test_date_only_and_rfc3339() {
        assert_eq!(fmt(json!("1990-12-31"), "d").as_deref(), Some("12/31/1990"));
        assert_eq!(
            fmt(json!("2024-01-02T08:30:00+07:00"), "yyyy-MM-dd HH:mm").as_deref(),
            Some("2024-01-02 08:30")
        );
    }

    #[test]
    fn test_date_literals() {
        let value = json!("2024-03-05");
        assert_eq!(
            fmt(value.clone(), "'Day' d 'of' MMMM").as_deref(),
            Some("Day 5 of March")
        );
        assert_eq!(fmt(value, "\\d\\d dd").as_deref(), Some("dd 05"));
    }

    #[test]
    fn test_composite() {
        assert_eq!(fmt(json!(5.125), "{0:N1} mg").as_deref(), Some("5.1 mg"));
        assert_eq!(fmt(json!("A12"), "ID: {0}").as_deref(), Some("ID: A12"));
        assert_eq!(
            fmt(json!("1990-12-31"), "Born {0:yyyy} {{est}}").as_deref(),
            Some("Born 1990 {est}")
        );
        assert_eq!(fmt(json!(1), "{1}"), None);
        assert_eq!(fmt(json!(1), "{0"), None);
    }

    #[test]
    fn test_inapplicable_formats() {
        assert_eq!(fmt(json!("hello"), "N2"), None);
        assert_eq!(fmt(json!(true), "N2"), None);
        assert_eq!(fmt(json!("2024-03-05"), "plain"), None);
        assert_eq!(fmt(json!(12), "yyyy"), None);
        assert_eq!(fmt(json!(12), ""), None);
    }
}
