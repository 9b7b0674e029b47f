use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::format_backend::number_sub_parts;
use crate::{
    DateTimeOptions, DateTimeStyle, FormatBackend, FormatError, FormatResult, NumberOptions,
    Options, SubPart, Value,
};

/// Call-site information handed to every message function.
pub struct FunctionContext<'a> {
    pub name: &'a str,
    pub locale: &'a str,
    pub source: &'a str,
    pub backend: &'a dyn FormatBackend,
}

/// How a resolved value takes part in `.match` selection.
#[derive(Clone, Debug, PartialEq)]
pub enum Selector {
    None,
    String(String),
    Number { value: f64, exact_only: bool },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedValue {
    pub kind: String,
    pub value: Option<Value>,
    pub text: String,
    pub parts: Option<Vec<SubPart>>,
    pub selector: Selector,
}

impl ResolvedValue {
    pub fn string(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            kind: "string".to_string(),
            value: Some(Value::Str(text.clone())),
            selector: Selector::String(text.clone()),
            text,
            parts: None,
        }
    }

    pub(crate) fn unknown(value: &Value) -> Self {
        let text = value.to_string();
        Self {
            kind: "unknown".to_string(),
            value: Some(value.clone()),
            selector: Selector::String(text.clone()),
            text,
            parts: None,
        }
    }

    pub fn fallback(source: &str) -> Self {
        Self {
            kind: "fallback".to_string(),
            value: None,
            text: format!("{{{source}}}"),
            parts: None,
            selector: Selector::None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.kind == "fallback"
    }
}

pub type MessageFunction =
    Rc<dyn Fn(&FunctionContext<'_>, &Options, Option<&Value>) -> FormatResult<ResolvedValue>>;

#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, MessageFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `:string`, `:number`, `:integer`, `:datetime`,
    /// `:date` and `:time`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.insert("string", string_function);
        registry.insert("number", number_function);
        registry.insert("integer", integer_function);
        registry.insert("datetime", datetime_function);
        registry.insert("date", date_function);
        registry.insert("time", time_function);
        registry
    }

    pub fn insert<F>(&mut self, name: impl Into<String>, function: F) -> Option<MessageFunction>
    where
        F: Fn(&FunctionContext<'_>, &Options, Option<&Value>) -> FormatResult<ResolvedValue>
            + 'static,
    {
        self.functions.insert(name.into(), Rc::new(function))
    }

    pub fn insert_function(
        &mut self,
        name: impl Into<String>,
        function: MessageFunction,
    ) -> Option<MessageFunction> {
        self.functions.insert(name.into(), function)
    }

    pub fn with_function(mut self, name: impl Into<String>, function: MessageFunction) -> Self {
        self.insert_function(name, function);
        self
    }

    /// Adds every function of `other`, replacing same-named entries.
    pub fn extend(&mut self, other: &FunctionRegistry) {
        for (name, function) in &other.functions {
            self.functions.insert(name.clone(), Rc::clone(function));
        }
    }

    pub fn get(&self, name: &str) -> Option<&MessageFunction> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.functions.keys()).finish()
    }
}

/// Wraps a text transform into a message function producing a `string` part.
pub fn define_string_function<F>(transform: F) -> MessageFunction
where
    F: Fn(Option<&Value>, &FunctionContext<'_>, &Options) -> String + 'static,
{
    message_function(move |ctx, options, operand| {
        Ok(ResolvedValue::string(transform(operand, ctx, options)))
    })
}

pub fn message_function<F>(function: F) -> MessageFunction
where
    F: Fn(&FunctionContext<'_>, &Options, Option<&Value>) -> FormatResult<ResolvedValue> + 'static,
{
    Rc::new(function)
}

fn string_function(
    ctx: &FunctionContext<'_>,
    _options: &Options,
    operand: Option<&Value>,
) -> FormatResult<ResolvedValue> {
    let value = operand.ok_or_else(|| FormatError::bad_operand(ctx.name, "missing operand"))?;
    Ok(ResolvedValue::string(value.to_string()))
}

fn number_function(
    ctx: &FunctionContext<'_>,
    options: &Options,
    operand: Option<&Value>,
) -> FormatResult<ResolvedValue> {
    let value = numeric_operand(ctx.name, operand)?;
    let number_options = NumberOptions {
        minimum_fraction_digits: digits_option(ctx.name, options, "minimumFractionDigits")?,
        maximum_fraction_digits: digits_option(ctx.name, options, "maximumFractionDigits")?,
    };
    let exact_only = select_option(ctx.name, options)?;
    Ok(number_value(ctx, value, &number_options, exact_only))
}

fn integer_function(
    ctx: &FunctionContext<'_>,
    options: &Options,
    operand: Option<&Value>,
) -> FormatResult<ResolvedValue> {
    let value = numeric_operand(ctx.name, operand)?.trunc();
    let number_options = NumberOptions {
        minimum_fraction_digits: None,
        maximum_fraction_digits: Some(0),
    };
    let exact_only = select_option(ctx.name, options)?;
    Ok(number_value(ctx, value, &number_options, exact_only))
}

fn number_value(
    ctx: &FunctionContext<'_>,
    value: f64,
    options: &NumberOptions,
    exact_only: bool,
) -> ResolvedValue {
    let text = ctx.backend.format_number(ctx.locale, value, options);
    ResolvedValue {
        kind: "number".to_string(),
        value: Some(Value::Num(value)),
        parts: Some(number_sub_parts(&text)),
        text,
        selector: Selector::Number { value, exact_only },
    }
}

fn numeric_operand(function: &str, operand: Option<&Value>) -> FormatResult<f64> {
    match operand {
        Some(Value::Num(number)) => Ok(*number),
        Some(Value::Str(text)) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| FormatError::bad_operand(function, format!("'{text}' is not a number"))),
        Some(other) => Err(FormatError::bad_operand(
            function,
            format!("'{other}' is not a number"),
        )),
        None => Err(FormatError::bad_operand(function, "missing operand")),
    }
}

fn digits_option(function: &str, options: &Options, name: &str) -> FormatResult<Option<u8>> {
    let Some(value) = options.get(name) else {
        return Ok(None);
    };
    let digits = match value {
        Value::Num(number) if number.fract() == 0.0 => Some(*number),
        Value::Str(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    match digits {
        Some(digits) if (0.0..=20.0).contains(&digits) && digits.fract() == 0.0 => {
            Ok(Some(digits as u8))
        }
        _ => Err(FormatError::bad_option(
            function,
            name,
            "expected an integer between 0 and 20",
        )),
    }
}

/// Returns whether selection is restricted to exact numeric keys.
fn select_option(function: &str, options: &Options) -> FormatResult<bool> {
    match options.get("select").map(|value| value.to_string()) {
        None => Ok(false),
        Some(mode) => match mode.as_str() {
            "exact" => Ok(true),
            "plural" | "ordinal" => Ok(false),
            _ => Err(FormatError::bad_option(
                function,
                "select",
                format!("unsupported selection '{mode}'"),
            )),
        },
    }
}

#[derive(Clone, Copy)]
enum DateTimeField {
    Date,
    Time,
    Both,
}

impl DateTimeField {
    fn names(self) -> &'static [&'static str] {
        match self {
            DateTimeField::Date => &["year", "month", "day"],
            DateTimeField::Time => &["hour", "minute", "second"],
            DateTimeField::Both => &["year", "month", "day", "hour", "minute", "second"],
        }
    }
}

/// `dateStyle` alone renders the date, `timeStyle` alone the time, anything
/// else both.
fn datetime_function(
    ctx: &FunctionContext<'_>,
    options: &Options,
    operand: Option<&Value>,
) -> FormatResult<ResolvedValue> {
    let date_time_options = DateTimeOptions {
        date_style: style_option(ctx.name, options, "dateStyle")?,
        time_style: style_option(ctx.name, options, "timeStyle")?,
    };
    let field = match (date_time_options.date_style, date_time_options.time_style) {
        (Some(_), None) => DateTimeField::Date,
        (None, Some(_)) => DateTimeField::Time,
        _ => DateTimeField::Both,
    };
    datetime_value(ctx, operand, &date_time_options, field)
}

fn date_function(
    ctx: &FunctionContext<'_>,
    options: &Options,
    operand: Option<&Value>,
) -> FormatResult<ResolvedValue> {
    let date_time_options = DateTimeOptions {
        date_style: style_option(ctx.name, options, "style")?,
        time_style: None,
    };
    datetime_value(ctx, operand, &date_time_options, DateTimeField::Date)
}

fn time_function(
    ctx: &FunctionContext<'_>,
    options: &Options,
    operand: Option<&Value>,
) -> FormatResult<ResolvedValue> {
    let date_time_options = DateTimeOptions {
        date_style: None,
        time_style: style_option(ctx.name, options, "style")?,
    };
    datetime_value(ctx, operand, &date_time_options, DateTimeField::Time)
}

fn datetime_value(
    ctx: &FunctionContext<'_>,
    operand: Option<&Value>,
    options: &DateTimeOptions,
    field: DateTimeField,
) -> FormatResult<ResolvedValue> {
    let at = datetime_operand(ctx.name, operand)?;
    let text = match field {
        DateTimeField::Date => ctx.backend.format_date(ctx.locale, at, options),
        DateTimeField::Time => ctx.backend.format_time(ctx.locale, at, options),
        DateTimeField::Both => ctx.backend.format_datetime(ctx.locale, at, options),
    };
    Ok(ResolvedValue {
        kind: "datetime".to_string(),
        value: Some(Value::Str(at.to_rfc3339_opts(SecondsFormat::Secs, true))),
        parts: Some(datetime_sub_parts(&text, field.names())),
        text,
        selector: Selector::None,
    })
}

/// Numbers are milliseconds since the Unix epoch; strings are RFC 3339
/// timestamps or plain `YYYY-MM-DD` dates at UTC midnight.
fn datetime_operand(function: &str, operand: Option<&Value>) -> FormatResult<DateTime<Utc>> {
    let parsed = match operand {
        Some(Value::Num(millis)) if millis.is_finite() => {
            DateTime::<Utc>::from_timestamp_millis(*millis as i64)
        }
        Some(Value::Str(text)) => parse_datetime(text.trim()),
        Some(_) => None,
        None => return Err(FormatError::bad_operand(function, "missing operand")),
    };
    parsed.ok_or_else(|| match operand {
        Some(value) => FormatError::bad_operand(function, format!("'{value}' is not a date")),
        None => FormatError::bad_operand(function, "missing operand"),
    })
}

fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
}

/// Splits rendered date text into digit runs named after `fields` in order
/// and `literal` separators. Digit runs past the known fields are `integer`.
fn datetime_sub_parts(text: &str, fields: &[&str]) -> Vec<SubPart> {
    let mut parts = Vec::new();
    let mut names = fields.iter();
    let mut run = String::new();
    let mut run_is_digits = false;
    for ch in text.chars() {
        let is_digit = ch.is_ascii_digit();
        if !run.is_empty() && is_digit != run_is_digits {
            push_datetime_run(&mut parts, &mut names, std::mem::take(&mut run), run_is_digits);
        }
        run_is_digits = is_digit;
        run.push(ch);
    }
    if !run.is_empty() {
        push_datetime_run(&mut parts, &mut names, run, run_is_digits);
    }
    parts
}

fn push_datetime_run(
    parts: &mut Vec<SubPart>,
    names: &mut std::slice::Iter<'_, &str>,
    run: String,
    is_digits: bool,
) {
    let kind = if is_digits {
        names.next().copied().unwrap_or("integer")
    } else {
        "literal"
    };
    parts.push(SubPart::new(kind, run));
}

fn style_option(
    function: &str,
    options: &Options,
    name: &str,
) -> FormatResult<Option<DateTimeStyle>> {
    let Some(value) = options.get(name) else {
        return Ok(None);
    };
    let style = value.to_string();
    DateTimeStyle::parse(&style).map(Some).ok_or_else(|| {
        FormatError::bad_option(function, name, format!("unsupported style '{style}'"))
    })
}
