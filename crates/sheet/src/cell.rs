use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt::{self, Write as _};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// A formula cell together with whatever result the workbook cached for it.
///
/// Formulas are never evaluated here; only the stored result is used.
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaCell {
    pub source: String,
    pub number: Option<f64>,
    pub text: Option<String>,
}

impl FormulaCell {
    /// Create a formula cell with no cached result.
    #[must_use]
    pub fn new<S: Into<String>>(source: S) -> Self {
        FormulaCell {
            source: source.into(),
            number: None,
            text: None,
        }
    }

    /// Set the cached numeric result.
    #[must_use]
    pub fn with_number(mut self, number: f64) -> Self {
        self.number = Some(number);
        self
    }

    /// Set the cached text result.
    #[must_use]
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Numeric result first, then text, then nothing.
    fn cached_text(&self) -> String {
        self.number
            .map(render_number)
            .or_else(|| self.text.clone())
            .unwrap_or_default()
    }
}

/// A typed value read from one spreadsheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Blank,
    Text(String),
    /// `is_date` is set when the cell's number format marks it as a date/time.
    Number { value: f64, is_date: bool },
    Boolean(bool),
    Formula(FormulaCell),
    /// Error values and anything else the table model has no text for.
    Unsupported,
}

impl CellValue {
    /// A plain numeric cell.
    #[must_use]
    pub fn number(value: f64) -> Self {
        CellValue::Number {
            value,
            is_date: false,
        }
    }

    /// A numeric cell holding an Excel date serial.
    #[must_use]
    pub fn date(serial: f64) -> Self {
        CellValue::Number {
            value: serial,
            is_date: true,
        }
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Blank)
    }

    /// Canonical string form used by the table model.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Blank | CellValue::Unsupported => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Boolean(b) => b.to_string(),
            CellValue::Number {
                value,
                is_date: true,
            } => serial_to_datetime(*value).map_or_else(|| render_number(*value), format_timestamp),
            CellValue::Number {
                value,
                is_date: false,
            } => render_number(*value),
            CellValue::Formula(formula) => formula.cached_text(),
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Blank
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::number(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => CellValue::Blank,
        }
    }
}

/// Convert an optional cell to its table string; a missing cell is `""`.
#[must_use]
pub fn coerce(cell: Option<&CellValue>) -> String {
    cell.map_or_else(String::new, CellValue::to_text)
}

/// True when the value has no visible content.
#[must_use]
pub fn is_blank_text(value: &str) -> bool {
    value.trim().is_empty()
}

/// Integral values print as plain integer literals, others as decimals.
#[allow(clippy::float_cmp)]
fn render_number(value: f64) -> String {
    if value.is_finite() && value == value.floor() {
        if value == 0.0 {
            // avoid "-0"
            return "0".to_string();
        }
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Convert a 1900-system Excel serial to a timestamp.
fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }

    let mut days = serial.floor() as u64;
    let mut millis = ((serial - serial.floor()) * MILLIS_PER_DAY).round() as u32;
    if millis >= MILLIS_PER_DAY as u32 {
        days += 1;
        millis = 0;
    }
    // Serials before the phantom 1900-02-29 are offset by one day.
    if days < 60 {
        days += 1;
    }

    let date = NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(days))?;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(millis / 1000, (millis % 1000) * 1_000_000)?;
    Some(NaiveDateTime::new(date, time))
}

/// `YYYY-MM-DDTHH:MM`, with seconds and milliseconds only when non-zero.
fn format_timestamp(dt: NaiveDateTime) -> String {
    let mut out = dt.format("%Y-%m-%dT%H:%M").to_string();
    let nanos = dt.nanosecond();
    if dt.second() != 0 || nanos != 0 {
        let _ = write!(out, ":{:02}", dt.second());
    }
    if nanos != 0 {
        let _ = write!(out, ".{:03}", nanos / 1_000_000);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_and_blank() {
        assert_eq!(coerce(None), "");
        assert_eq!(coerce(Some(&CellValue::Blank)), "");
        assert_eq!(coerce(Some(&CellValue::Unsupported)), "");
    }

    #[test]
    fn test_text_verbatim() {
        assert_eq!(coerce(Some(&CellValue::from("  padded "))), "  padded ");
    }

    #[test]
    fn test_boolean() {
        assert_eq!(CellValue::Boolean(true).to_text(), "true");
        assert_eq!(CellValue::Boolean(false).to_text(), "false");
    }

    #[test]
    fn test_integral_numbers_have_no_decimal_point() {
        assert_eq!(CellValue::number(42.0).to_text(), "42");
        assert_eq!(CellValue::number(-7.0).to_text(), "-7");
        assert_eq!(CellValue::number(-0.0).to_text(), "0");
        assert_eq!(CellValue::number(1e20).to_text(), "100000000000000000000");
    }

    #[test]
    fn test_fractional_numbers_keep_decimals() {
        assert_eq!(CellValue::number(3.25).to_text(), "3.25");
        assert_eq!(CellValue::number(-0.5).to_text(), "-0.5");
    }

    #[test]
    fn test_date_cells_render_as_timestamps() {
        // 2024-01-15
        assert_eq!(CellValue::date(45306.0).to_text(), "2024-01-15T00:00");
        // 2024-01-15 10:30
        assert_eq!(CellValue::date(45306.4375).to_text(), "2024-01-15T10:30");
        // 2024-01-15 10:30:15
        let serial = 45306.0 + (10.0 * 3600.0 + 30.0 * 60.0 + 15.0) / 86_400.0;
        assert_eq!(CellValue::date(serial).to_text(), "2024-01-15T10:30:15");
    }

    #[test]
    fn test_early_serials_skip_phantom_leap_day() {
        assert_eq!(CellValue::date(1.0).to_text(), "1900-01-01T00:00");
        assert_eq!(CellValue::date(61.0).to_text(), "1900-03-01T00:00");
    }

    #[test]
    fn test_negative_date_serial_falls_back_to_number() {
        assert_eq!(CellValue::date(-3.0).to_text(), "-3");
    }

    #[test]
    fn test_formula_prefers_numeric_result() {
        let formula = FormulaCell::new("SUM(A1:A3)").with_number(6.0).with_text("ignored");
        assert_eq!(CellValue::Formula(formula).to_text(), "6");

        let fractional = FormulaCell::new("A1/4").with_number(0.25);
        assert_eq!(CellValue::Formula(fractional).to_text(), "0.25");
    }

    #[test]
    fn test_formula_falls_back_to_text_then_empty() {
        let text = FormulaCell::new("CONCAT(A1,B1)").with_text("ab");
        assert_eq!(CellValue::Formula(text).to_text(), "ab");

        let nothing = FormulaCell::new("1/0");
        assert_eq!(CellValue::Formula(nothing).to_text(), "");
    }

    #[test]
    fn test_is_blank_text() {
        assert!(is_blank_text(""));
        assert!(is_blank_text("  \t"));
        assert!(!is_blank_text(" x "));
    }
}
