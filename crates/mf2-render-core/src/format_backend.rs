use chrono::{DateTime, Utc};

use crate::SubPart;
use crate::args::display_number;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            PluralCategory::Zero => "zero",
            PluralCategory::One => "one",
            PluralCategory::Two => "two",
            PluralCategory::Few => "few",
            PluralCategory::Many => "many",
            PluralCategory::Other => "other",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NumberOptions {
    pub minimum_fraction_digits: Option<u8>,
    pub maximum_fraction_digits: Option<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateTimeStyle {
    Full,
    Long,
    Medium,
    Short,
}

impl DateTimeStyle {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "full" => Some(DateTimeStyle::Full),
            "long" => Some(DateTimeStyle::Long),
            "medium" => Some(DateTimeStyle::Medium),
            "short" => Some(DateTimeStyle::Short),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateTimeOptions {
    pub date_style: Option<DateTimeStyle>,
    pub time_style: Option<DateTimeStyle>,
}

/// Locale-sensitive pieces of number and date formatting and plural selection.
///
/// The date hooks default to ISO 8601 renderings in UTC.
pub trait FormatBackend {
    fn plural_category(&self, locale: &str, value: f64) -> PluralCategory;
    fn format_number(&self, locale: &str, value: f64, options: &NumberOptions) -> String;

    fn format_date(
        &self,
        _locale: &str,
        value: DateTime<Utc>,
        _options: &DateTimeOptions,
    ) -> String {
        value.format("%Y-%m-%d").to_string()
    }

    fn format_time(
        &self,
        _locale: &str,
        value: DateTime<Utc>,
        options: &DateTimeOptions,
    ) -> String {
        match options.time_style {
            Some(DateTimeStyle::Short) => value.format("%H:%M").to_string(),
            _ => value.format("%H:%M:%S").to_string(),
        }
    }

    fn format_datetime(
        &self,
        locale: &str,
        value: DateTime<Utc>,
        options: &DateTimeOptions,
    ) -> String {
        format!(
            "{} {}",
            self.format_date(locale, value, options),
            self.format_time(locale, value, options)
        )
    }
}

/// Locale-independent backend: plain decimal digits, every number is `other`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicFormatBackend;

impl FormatBackend for BasicFormatBackend {
    fn plural_category(&self, _locale: &str, _value: f64) -> PluralCategory {
        PluralCategory::Other
    }

    fn format_number(&self, _locale: &str, value: f64, options: &NumberOptions) -> String {
        if !value.is_finite() {
            return display_number(value);
        }
        let minimum = options.minimum_fraction_digits.unwrap_or(0) as usize;
        let Some(maximum) = options.maximum_fraction_digits else {
            let rendered = display_number(value);
            return pad_fraction(rendered, minimum);
        };
        let maximum = (maximum as usize).max(minimum);
        let mut rendered = format!("{value:.maximum$}");
        if rendered.contains('.') {
            let fraction_len = rendered.len() - rendered.find('.').map(|idx| idx + 1).unwrap_or(0);
            let mut removable = fraction_len.saturating_sub(minimum);
            while removable > 0 && rendered.ends_with('0') {
                rendered.pop();
                removable -= 1;
            }
            if rendered.ends_with('.') {
                rendered.pop();
            }
        }
        if rendered == "-0" {
            rendered = "0".to_string();
        }
        rendered
    }
}

fn pad_fraction(mut rendered: String, minimum: usize) -> String {
    if minimum == 0 || rendered.contains('e') {
        return rendered;
    }
    let current = match rendered.find('.') {
        Some(idx) => rendered.len() - idx - 1,
        None => {
            rendered.push('.');
            0
        }
    };
    for _ in current..minimum {
        rendered.push('0');
    }
    rendered
}

/// Splits formatted number text into `minusSign`, `integer`, `decimal`
/// and `fraction` sub-parts.
pub fn number_sub_parts(text: &str) -> Vec<SubPart> {
    let mut parts = Vec::new();
    let mut rest = text;
    if let Some(stripped) = rest.strip_prefix('-') {
        parts.push(SubPart::new("minusSign", "-"));
        rest = stripped;
    }
    match rest.split_once('.') {
        Some((integer, fraction)) => {
            parts.push(SubPart::new("integer", integer));
            parts.push(SubPart::new("decimal", "."));
            parts.push(SubPart::new("fraction", fraction));
        }
        None => parts.push(SubPart::new("integer", rest)),
    }
    parts
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{
        BasicFormatBackend, DateTimeOptions, DateTimeStyle, FormatBackend, NumberOptions,
        PluralCategory, number_sub_parts,
    };
    use crate::{SubPart, Value};

    fn sub_parts_text(parts: &[SubPart]) -> String {
        parts
            .iter()
            .filter_map(|part| part.value.as_ref().map(Value::to_string))
            .collect()
    }

    fn format(value: f64, min: Option<u8>, max: Option<u8>) -> String {
        BasicFormatBackend.format_number(
            "en",
            value,
            &NumberOptions {
                minimum_fraction_digits: min,
                maximum_fraction_digits: max,
            },
        )
    }

    #[test]
    fn basic_backend_is_always_other() {
        assert_eq!(BasicFormatBackend.plural_category("en", 1.0), PluralCategory::Other);
        assert_eq!(PluralCategory::Few.as_str(), "few");
    }

    #[test]
    fn formats_without_options() {
        assert_eq!(format(42.0, None, None), "42");
        assert_eq!(format(3.25, None, None), "3.25");
    }

    #[test]
    fn honors_maximum_fraction_digits() {
        assert_eq!(format(7.126, None, Some(2)), "7.13");
        assert_eq!(format(2.4, None, Some(0)), "2");
        assert_eq!(format(1.10, None, Some(3)), "1.1");
        assert_eq!(format(-0.001, None, Some(1)), "0");
    }

    #[test]
    fn honors_minimum_fraction_digits() {
        assert_eq!(format(3.0, Some(2), None), "3.00");
        assert_eq!(format(1.5, Some(2), Some(4)), "1.50");
    }

    #[test]
    fn splits_number_parts() {
        let parts = number_sub_parts("-12.5");
        let kinds: Vec<_> = parts.iter().map(|part| part.kind.as_str()).collect();
        assert_eq!(kinds, vec!["minusSign", "integer", "decimal", "fraction"]);
        assert_eq!(sub_parts_text(&parts), "-12.5");
    }

    #[test]
    fn basic_backend_renders_iso_dates() {
        let at = Utc
            .with_ymd_and_hms(2026, 2, 14, 12, 34, 56)
            .single()
            .expect("valid date");
        let options = DateTimeOptions::default();
        assert_eq!(BasicFormatBackend.format_date("en", at, &options), "2026-02-14");
        assert_eq!(BasicFormatBackend.format_time("en", at, &options), "12:34:56");
        assert_eq!(
            BasicFormatBackend.format_datetime("en", at, &options),
            "2026-02-14 12:34:56"
        );
        let short = DateTimeOptions {
            date_style: None,
            time_style: Some(DateTimeStyle::Short),
        };
        assert_eq!(BasicFormatBackend.format_time("en", at, &short), "12:34");
    }

    #[test]
    fn parses_date_time_styles() {
        assert_eq!(DateTimeStyle::parse("medium"), Some(DateTimeStyle::Medium));
        assert_eq!(DateTimeStyle::parse("Medium"), None);
    }
}
