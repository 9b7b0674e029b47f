use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::functions::{FunctionContext, ResolvedValue, Selector};
use crate::model::{
    Body, Declaration, Expression, FunctionOption, Markup, Matcher, Message, Operand, Pattern,
    PatternItem, VariantKey,
};
use crate::parser::parse_message;
use crate::{
    Args, BasicFormatBackend, ExpressionPart, FormatBackend, FormatError, FormatResult,
    FunctionRegistry, MessagePart, Options, SyntaxError, Value, FSI, PDI,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatOptions {
    /// Wrap every placeholder in FSI/PDI isolation marks.
    pub bidi_isolation: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            bidi_isolation: true,
        }
    }
}

/// A message compiled for one locale.
pub struct MessageFormat {
    locale: String,
    source: String,
    message: Message,
    functions: FunctionRegistry,
    backend: Rc<dyn FormatBackend>,
    options: FormatOptions,
}

impl fmt::Debug for MessageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageFormat")
            .field("locale", &self.locale)
            .field("source", &self.source)
            .field("functions", &self.functions)
            .field("options", &self.options)
            .finish()
    }
}

enum Resolved<'m> {
    Text(&'m str),
    Markup(&'m Markup, Options),
    Expression { source: String, value: ResolvedValue },
}

struct Scope<'a> {
    args: &'a Args,
    locals: BTreeMap<&'a str, ResolvedValue>,
}

impl MessageFormat {
    /// Compiles with the default functions, the basic backend and bidi isolation.
    pub fn new(locale: impl Into<String>, source: &str) -> Result<Self, SyntaxError> {
        Self::compile(
            locale,
            source,
            FunctionRegistry::with_defaults(),
            Rc::new(BasicFormatBackend),
            FormatOptions::default(),
        )
    }

    pub fn compile(
        locale: impl Into<String>,
        source: &str,
        functions: FunctionRegistry,
        backend: Rc<dyn FormatBackend>,
        options: FormatOptions,
    ) -> Result<Self, SyntaxError> {
        let message = parse_message(source)?;
        Ok(Self {
            locale: locale.into(),
            source: source.to_string(),
            message,
            functions,
            backend,
            options,
        })
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn format(&self, args: &Args) -> FormatResult<String> {
        let mut output = String::new();
        for item in self.resolve(args)? {
            match item {
                Resolved::Text(text) => output.push_str(text),
                Resolved::Markup(..) => {}
                Resolved::Expression { value, .. } => {
                    if self.options.bidi_isolation {
                        output.push_str(FSI);
                        output.push_str(&value.text);
                        output.push_str(PDI);
                    } else {
                        output.push_str(&value.text);
                    }
                }
            }
        }
        Ok(output)
    }

    pub fn format_to_parts(&self, args: &Args) -> FormatResult<Vec<MessagePart>> {
        let mut parts = Vec::new();
        for item in self.resolve(args)? {
            match item {
                Resolved::Text(text) => parts.push(MessagePart::text(text)),
                Resolved::Markup(markup, options) => parts.push(MessagePart::Markup {
                    kind: markup.kind,
                    name: markup.name.clone(),
                    options,
                }),
                Resolved::Expression { source, value } => {
                    if self.options.bidi_isolation {
                        parts.push(MessagePart::BidiIsolation {
                            value: FSI.to_string(),
                        });
                    }
                    let locale = (!value.is_fallback()).then(|| self.locale.clone());
                    parts.push(MessagePart::Expression(ExpressionPart {
                        kind: value.kind,
                        source: Some(source),
                        locale,
                        value: value.value,
                        parts: value.parts,
                    }));
                    if self.options.bidi_isolation {
                        parts.push(MessagePart::BidiIsolation {
                            value: PDI.to_string(),
                        });
                    }
                }
            }
        }
        Ok(parts)
    }

    fn resolve<'m>(&'m self, args: &'m Args) -> FormatResult<Vec<Resolved<'m>>> {
        let mut scope = Scope {
            args,
            locals: BTreeMap::new(),
        };
        for declaration in &self.message.declarations {
            let value = self.evaluate(declaration.expression(), &scope)?;
            if let Declaration::Local { .. } = declaration {
                debug!("bound local ${} as {}", declaration.name(), value.kind);
            }
            scope.locals.insert(declaration.name(), value);
        }

        let pattern = match &self.message.body {
            Body::Pattern(pattern) => pattern,
            Body::Match(matcher) => self.select_variant(matcher, &scope)?,
        };

        let mut resolved = Vec::with_capacity(pattern.items.len());
        for item in &pattern.items {
            match item {
                PatternItem::Text(text) => resolved.push(Resolved::Text(text)),
                PatternItem::Markup(markup) => {
                    let options = self.resolve_options(&markup.options, &scope);
                    resolved.push(Resolved::Markup(markup, options));
                }
                PatternItem::Expression(expression) => {
                    let value = self.evaluate(expression, &scope)?;
                    resolved.push(Resolved::Expression {
                        source: expression.source(),
                        value,
                    });
                }
            }
        }
        Ok(resolved)
    }

    fn evaluate(&self, expression: &Expression, scope: &Scope<'_>) -> FormatResult<ResolvedValue> {
        let source = expression.source();
        let operand_value = match &expression.operand {
            None => None,
            Some(Operand::Literal(literal)) => Some(Value::Str(literal.clone())),
            Some(Operand::Variable(name)) => {
                if let Some(local) = scope.locals.get(name.as_str()) {
                    if local.is_fallback() {
                        return Ok(ResolvedValue::fallback(&source));
                    }
                    if expression.function.is_none() {
                        return Ok(local.clone());
                    }
                    local.value.clone()
                } else if let Some(value) = scope.args.get(name) {
                    Some(value.clone())
                } else {
                    warn!("unresolved variable ${name} in message '{}'", self.source);
                    return Ok(ResolvedValue::fallback(&source));
                }
            }
        };

        match &expression.function {
            Some(function) => {
                let options = self.resolve_options(&function.options, scope);
                self.call(&function.name, &source, &options, operand_value.as_ref())
            }
            None => match operand_value {
                Some(value) => self.implicit(&source, &value),
                None => Ok(ResolvedValue::fallback(&source)),
            },
        }
    }

    /// Unannotated values: numbers go through `:number`, strings through
    /// `:string`, anything else keeps its value and displays as text.
    fn implicit(&self, source: &str, value: &Value) -> FormatResult<ResolvedValue> {
        match value {
            Value::Num(_) if self.functions.contains("number") => {
                self.call("number", source, &Options::new(), Some(value))
            }
            Value::Str(text) => Ok(ResolvedValue::string(text.clone())),
            other => Ok(ResolvedValue::unknown(other)),
        }
    }

    fn call(
        &self,
        name: &str,
        source: &str,
        options: &Options,
        operand: Option<&Value>,
    ) -> FormatResult<ResolvedValue> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| FormatError::UnknownFunction(name.to_string()))?;
        let ctx = FunctionContext {
            name,
            locale: &self.locale,
            source,
            backend: self.backend.as_ref(),
        };
        function(&ctx, options, operand)
    }

    fn resolve_options(&self, options: &[FunctionOption], scope: &Scope<'_>) -> Options {
        let mut resolved = Options::new();
        for option in options {
            let value = match &option.value {
                Operand::Literal(literal) => Some(Value::Str(literal.clone())),
                Operand::Variable(name) => scope
                    .locals
                    .get(name.as_str())
                    .and_then(|local| local.value.clone())
                    .or_else(|| scope.args.get(name).cloned()),
            };
            match value {
                Some(value) => {
                    resolved.insert(option.name.clone(), value);
                }
                None => warn!(
                    "dropping option '{}' with unresolved value in message '{}'",
                    option.name, self.source
                ),
            }
        }
        resolved
    }

    fn select_variant<'m>(
        &'m self,
        matcher: &'m Matcher,
        scope: &Scope<'_>,
    ) -> FormatResult<&'m Pattern> {
        let mut selectors = Vec::with_capacity(matcher.selectors.len());
        for name in &matcher.selectors {
            let selector = match scope.locals.get(name.as_str()) {
                Some(local) => local.selector.clone(),
                None => match scope.args.get(name) {
                    Some(value) => self.implicit(&format!("${name}"), value)?.selector,
                    None => {
                        warn!("unresolved selector ${name} in message '{}'", self.source);
                        Selector::None
                    }
                },
            };
            selectors.push(selector);
        }

        let mut best: Option<(Vec<u8>, &Pattern)> = None;
        for variant in &matcher.variants {
            let mut ranks = Vec::with_capacity(variant.keys.len());
            for (key, selector) in variant.keys.iter().zip(&selectors) {
                match self.rank_key(key, selector) {
                    Some(rank) => ranks.push(rank),
                    None => break,
                }
            }
            if ranks.len() != variant.keys.len() {
                continue;
            }
            let better = match &best {
                Some((best_ranks, _)) => ranks < *best_ranks,
                None => true,
            };
            if better {
                best = Some((ranks, &variant.value));
            }
        }

        // Compilation guarantees a catch-all variant, which always ranks.
        match best {
            Some((_, pattern)) => Ok(pattern),
            None => Err(FormatError::Function {
                function: "match".to_string(),
                message: "no variant matched".to_string(),
            }),
        }
    }

    /// 0 for an exact key match, 1 for a plural category match, 2 for `*`.
    fn rank_key(&self, key: &VariantKey, selector: &Selector) -> Option<u8> {
        let literal = match key {
            VariantKey::CatchAll => return Some(2),
            VariantKey::Literal(literal) => literal,
        };
        match selector {
            Selector::None => None,
            Selector::String(value) => (value == literal).then_some(0),
            Selector::Number { value, exact_only } => {
                if literal.parse::<f64>().is_ok_and(|key| key == *value) {
                    return Some(0);
                }
                if *exact_only {
                    return None;
                }
                let category = self.backend.plural_category(&self.locale, *value);
                (category.as_str() == literal).then_some(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::{FormatOptions, MessageFormat};
    use crate::functions::define_string_function;
    use crate::{
        Args, BasicFormatBackend, FormatBackend, FormatError, FunctionRegistry, MarkupKind,
        MessagePart, NumberOptions, PluralCategory, Value,
    };

    fn strip_isolation(text: &str) -> String {
        text.replace(['\u{2068}', '\u{2069}'], "")
    }

    fn plain(locale: &str, source: &str) -> MessageFormat {
        MessageFormat::compile(
            locale,
            source,
            FunctionRegistry::with_defaults(),
            Rc::new(BasicFormatBackend),
            FormatOptions {
                bidi_isolation: false,
            },
        )
        .expect("compile")
    }

    struct EnglishPlurals;

    impl FormatBackend for EnglishPlurals {
        fn plural_category(&self, _locale: &str, value: f64) -> PluralCategory {
            if value == 1.0 {
                PluralCategory::One
            } else {
                PluralCategory::Other
            }
        }

        fn format_number(&self, locale: &str, value: f64, options: &NumberOptions) -> String {
            BasicFormatBackend.format_number(locale, value, options)
        }
    }

    #[test]
    fn formats_variable_with_isolation() {
        let mf = MessageFormat::new("en-US", "Hello {$name}").expect("compile");
        let args = Args::new().with("name", "Ada");
        let output = mf.format(&args).expect("format");
        assert_eq!(output, "Hello \u{2068}Ada\u{2069}");
        assert_eq!(strip_isolation(&output), "Hello Ada");
    }

    #[test]
    fn missing_variable_renders_fallback() {
        let mf = plain("en-US", "Hello {$name}");
        assert_eq!(mf.format(&Args::new()).expect("format"), "Hello {$name}");
        let parts = mf.format_to_parts(&Args::new()).expect("parts");
        match &parts[1] {
            MessagePart::Expression(expr) => {
                assert_eq!(expr.kind, "fallback");
                assert_eq!(expr.source.as_deref(), Some("$name"));
                assert!(expr.value.is_none());
                assert!(expr.locale.is_none());
            }
            other => panic!("unexpected part {other:?}"),
        }
    }

    #[test]
    fn markup_is_silent_in_strings_and_present_in_parts() {
        let mf = plain("en-US", "Please {#bold}read this{/bold}.");
        assert_eq!(mf.format(&Args::new()).expect("format"), "Please read this.");
        let parts = mf.format_to_parts(&Args::new()).expect("parts");
        assert_eq!(
            parts,
            vec![
                MessagePart::text("Please "),
                MessagePart::open("bold", Default::default()),
                MessagePart::text("read this"),
                MessagePart::close("bold"),
                MessagePart::text("."),
            ]
        );
    }

    #[test]
    fn markup_options_resolve_literals_and_variables() {
        let mf = plain("en-US", "{#link to=|/help| title=$title}Docs{/link}");
        let args = Args::new().with("title", "Help center");
        let parts = mf.format_to_parts(&args).expect("parts");
        match &parts[0] {
            MessagePart::Markup {
                kind,
                name,
                options,
            } => {
                assert_eq!(*kind, MarkupKind::Open);
                assert_eq!(name, "link");
                assert_eq!(options.get("to"), Some(&Value::from("/help")));
                assert_eq!(options.get("title"), Some(&Value::from("Help center")));
            }
            other => panic!("unexpected part {other:?}"),
        }
    }

    #[test]
    fn numbers_carry_sub_parts() {
        let mf = MessageFormat::new("en-US", "Total: {$n :number minimumFractionDigits=2}")
            .expect("compile");
        let parts = mf.format_to_parts(&Args::new().with("n", 5)).expect("parts");
        assert!(matches!(parts[1], MessagePart::BidiIsolation { .. }));
        match &parts[2] {
            MessagePart::Expression(expr) => {
                assert_eq!(expr.kind, "number");
                assert_eq!(expr.value, Some(Value::Num(5.0)));
                assert_eq!(expr.locale.as_deref(), Some("en-US"));
                assert_eq!(expr.parts.as_ref().map(Vec::len), Some(3));
            }
            other => panic!("unexpected part {other:?}"),
        }
    }

    #[test]
    fn implicit_numbers_use_number_formatting() {
        let mf = plain("en-US", "{$count} items");
        let parts = mf.format_to_parts(&Args::new().with("count", 3)).expect("parts");
        match &parts[0] {
            MessagePart::Expression(expr) => assert_eq!(expr.kind, "number"),
            other => panic!("unexpected part {other:?}"),
        }
    }

    #[test]
    fn selects_string_variants() {
        let source = ".input {$status :string}\n.match $status\nok {{Success}}\nfail {{Failure}}\n* {{Unknown}}";
        let mf = plain("en-US", source);
        let format = |status: &str| mf.format(&Args::new().with("status", status)).expect("ok");
        assert_eq!(format("ok"), "Success");
        assert_eq!(format("fail"), "Failure");
        assert_eq!(format("pending"), "Unknown");
    }

    #[test]
    fn selects_exact_number_variants() {
        let source = ".input {$count :number select=exact}\n.match $count\n1 {{One item}}\n* {{Many items}}";
        let mf = plain("en-US", source);
        assert_eq!(mf.format(&Args::new().with("count", 1)).expect("ok"), "One item");
        assert_eq!(mf.format(&Args::new().with("count", 2)).expect("ok"), "Many items");
    }

    #[test]
    fn plural_categories_come_from_backend() {
        let source = ".input {$count :number}\n.match $count\n0 {{None}}\none {{One}}\n* {{{$count} many}}";
        let mf = MessageFormat::compile(
            "en",
            source,
            FunctionRegistry::with_defaults(),
            Rc::new(EnglishPlurals),
            FormatOptions {
                bidi_isolation: false,
            },
        )
        .expect("compile");
        assert_eq!(mf.format(&Args::new().with("count", 0)).expect("ok"), "None");
        assert_eq!(mf.format(&Args::new().with("count", 1)).expect("ok"), "One");
        assert_eq!(mf.format(&Args::new().with("count", 7)).expect("ok"), "7 many");
    }

    #[test]
    fn missing_selector_uses_catch_all() {
        let source = ".match $status\nok {{Success}}\n* {{Unknown}}";
        let mf = plain("en-US", source);
        assert_eq!(mf.format(&Args::new()).expect("ok"), "Unknown");
    }

    #[test]
    fn locals_keep_their_formatting() {
        let source = ".local $price = {$amount :number maximumFractionDigits=1}\n{{Price: {$price}}}";
        let mf = plain("en-US", source);
        assert_eq!(
            mf.format(&Args::new().with("amount", 2.24)).expect("ok"),
            "Price: 2.2"
        );
    }

    #[test]
    fn custom_string_function_produces_string_parts() {
        let mut functions = FunctionRegistry::with_defaults();
        functions.insert_function(
            "uppercase",
            define_string_function(|input, _ctx, _options| {
                input.map(|value| value.to_string().to_uppercase()).unwrap_or_default()
            }),
        );
        let mf = MessageFormat::compile(
            "en-US",
            "User: {$name :uppercase}",
            functions,
            Rc::new(BasicFormatBackend),
            FormatOptions::default(),
        )
        .expect("compile");
        let args = Args::new().with("name", "Ada");
        assert_eq!(strip_isolation(&mf.format(&args).expect("ok")), "User: ADA");
        let parts = mf.format_to_parts(&args).expect("parts");
        assert!(parts.iter().any(|part| matches!(
            part,
            MessagePart::Expression(expr) if expr.kind == "string" && expr.value == Some(Value::from("ADA"))
        )));
    }

    #[test]
    fn unknown_function_is_a_format_error() {
        let mf = plain("en-US", "{$x :shout}");
        let err = mf.format(&Args::new().with("x", "a")).expect_err("should fail");
        assert_eq!(err, FormatError::UnknownFunction("shout".to_string()));
    }

    #[test]
    fn bad_operand_is_a_format_error() {
        let mf = plain("en-US", "{$x :number}");
        let err = mf.format(&Args::new().with("x", "many")).expect_err("should fail");
        assert!(matches!(err, FormatError::BadOperand { .. }));
        assert!(mf.format_to_parts(&Args::new().with("x", "many")).is_err());
    }

    #[test]
    fn malformed_source_fails_to_compile() {
        let err = MessageFormat::new("en-US", "Hello {").expect_err("should fail");
        assert_eq!(err.message, "unclosed placeholder");
    }
}
