use std::collections::BTreeSet;

use crate::error::SyntaxError;
use crate::model::{
    Body, Declaration, Expression, FunctionOption, FunctionRef, Markup, Matcher, Message, Operand,
    Pattern, PatternItem, Variant, VariantKey,
};
use crate::MarkupKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

/// Parses MF2 source into its data model and checks the structural rules
/// that make a message uncompilable.
pub fn parse_message(input: &str) -> Result<Message, SyntaxError> {
    let mut parser = Parser::new(input);
    let message = parser.parse_message()?;
    validate_message(&message)?;
    Ok(message)
}

struct Parser<'a> {
    input: &'a str,
    offset: usize,
    line: u32,
    column: u32,
}

#[derive(Clone, Copy)]
struct Mark {
    offset: usize,
    line: u32,
    column: u32,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn parse_message(&mut self) -> Result<Message, SyntaxError> {
        let rest = self.input.trim_start_matches(is_whitespace);
        if rest.starts_with('.') || rest.starts_with("{{") {
            self.parse_complex()
        } else {
            self.parse_simple()
        }
    }

    fn parse_simple(&mut self) -> Result<Message, SyntaxError> {
        let pattern = self.parse_pattern(false)?;
        Ok(Message {
            declarations: Vec::new(),
            body: Body::Pattern(pattern),
        })
    }

    fn parse_complex(&mut self) -> Result<Message, SyntaxError> {
        let mut declarations = Vec::new();
        let body = loop {
            self.skip_whitespace();
            if self.eat_keyword("input") {
                self.skip_whitespace();
                let expression = self.parse_expression_placeholder()?;
                let name = match &expression.operand {
                    Some(Operand::Variable(name)) => name.clone(),
                    _ => {
                        return Err(SyntaxError::new(
                            "input declaration requires a variable",
                            expression.span,
                        ));
                    }
                };
                declarations.push(Declaration::Input { name, expression });
            } else if self.eat_keyword("local") {
                if !self.skip_whitespace() {
                    return Err(self.error("expected whitespace after .local"));
                }
                self.expect('$')?;
                let name = self.parse_name()?;
                self.skip_whitespace();
                self.expect('=')?;
                self.skip_whitespace();
                let expression = self.parse_expression_placeholder()?;
                declarations.push(Declaration::Local { name, expression });
            } else if self.eat_keyword("match") {
                break Body::Match(self.parse_matcher()?);
            } else if self.starts_with("{{") {
                break Body::Pattern(self.parse_quoted_pattern()?);
            } else if self.peek() == Some('.') {
                return Err(self.error("unknown keyword"));
            } else {
                return Err(self.error("expected declaration or message body"));
            }
        };
        self.skip_whitespace();
        if !self.at_end() {
            return Err(self.error("unexpected content after message body"));
        }
        Ok(Message { declarations, body })
    }

    fn parse_matcher(&mut self) -> Result<Matcher, SyntaxError> {
        let start = self.mark();
        let mut selectors = Vec::new();
        loop {
            let had_space = self.skip_whitespace();
            if self.peek() != Some('$') {
                break;
            }
            if !had_space {
                return Err(self.error("expected whitespace before selector"));
            }
            self.bump();
            selectors.push(self.parse_name()?);
        }
        if selectors.is_empty() {
            return Err(self.error("expected selector"));
        }

        let mut variants = Vec::new();
        loop {
            self.skip_whitespace();
            if self.at_end() {
                break;
            }
            let variant_start = self.mark();
            let mut keys = Vec::new();
            loop {
                match self.peek() {
                    Some('*') => {
                        self.bump();
                        keys.push(VariantKey::CatchAll);
                    }
                    Some(ch) if ch == '|' || is_literal_start(ch) => {
                        keys.push(VariantKey::Literal(self.parse_literal()?));
                    }
                    _ => break,
                }
                self.skip_whitespace();
            }
            if keys.is_empty() {
                return Err(self.error("expected variant key"));
            }
            let value = self.parse_quoted_pattern()?;
            variants.push(Variant {
                keys,
                value,
                span: self.span_from(variant_start),
            });
        }
        if variants.is_empty() {
            return Err(self.error("expected at least one variant"));
        }
        Ok(Matcher {
            selectors,
            variants,
            span: self.span_from(start),
        })
    }

    fn parse_quoted_pattern(&mut self) -> Result<Pattern, SyntaxError> {
        if !self.starts_with("{{") {
            return Err(self.error("expected quoted pattern"));
        }
        self.bump();
        self.bump();
        let pattern = self.parse_pattern(true)?;
        self.bump();
        self.bump();
        Ok(pattern)
    }

    /// Parses pattern items until the end of input, or until `}}` when quoted.
    /// A quoted pattern leaves the cursor on the closing `}}`.
    fn parse_pattern(&mut self, quoted: bool) -> Result<Pattern, SyntaxError> {
        let mut items = Vec::new();
        let mut text = String::new();
        loop {
            match self.peek() {
                None => {
                    if quoted {
                        return Err(self.error("unterminated quoted pattern"));
                    }
                    break;
                }
                Some('\\') => {
                    self.bump();
                    match self.peek() {
                        Some(ch @ ('\\' | '{' | '}' | '|')) => {
                            self.bump();
                            text.push(ch);
                        }
                        _ => return Err(self.error("invalid escape sequence")),
                    }
                }
                Some('{') => {
                    if !text.is_empty() {
                        items.push(PatternItem::Text(std::mem::take(&mut text)));
                    }
                    items.push(self.parse_placeholder()?);
                }
                Some('}') => {
                    if quoted && self.starts_with("}}") {
                        break;
                    }
                    return Err(self.error("unbalanced closing brace"));
                }
                Some(ch) => {
                    self.bump();
                    text.push(ch);
                }
            }
        }
        if !text.is_empty() {
            items.push(PatternItem::Text(text));
        }
        Ok(Pattern { items })
    }

    fn parse_placeholder(&mut self) -> Result<PatternItem, SyntaxError> {
        let start = self.mark();
        self.expect('{')?;
        self.skip_whitespace();
        match self.peek() {
            Some('#') => {
                self.bump();
                let name = self.parse_identifier()?;
                let options = self.parse_options()?;
                self.skip_attributes()?;
                self.skip_whitespace();
                let kind = if self.peek() == Some('/') {
                    self.bump();
                    MarkupKind::Standalone
                } else {
                    MarkupKind::Open
                };
                self.expect_closing()?;
                Ok(PatternItem::Markup(Markup {
                    kind,
                    name,
                    options,
                    span: self.span_from(start),
                }))
            }
            Some('/') => {
                self.bump();
                let name = self.parse_identifier()?;
                let options = self.parse_options()?;
                self.skip_attributes()?;
                self.skip_whitespace();
                self.expect_closing()?;
                Ok(PatternItem::Markup(Markup {
                    kind: MarkupKind::Close,
                    name,
                    options,
                    span: self.span_from(start),
                }))
            }
            _ => {
                let expression = self.parse_expression_body(start)?;
                Ok(PatternItem::Expression(expression))
            }
        }
    }

    fn parse_expression_placeholder(&mut self) -> Result<Expression, SyntaxError> {
        let start = self.mark();
        self.expect('{')?;
        self.skip_whitespace();
        if matches!(self.peek(), Some('#' | '/')) {
            return Err(self.error("expected expression, found markup"));
        }
        self.parse_expression_body(start)
    }

    fn parse_expression_body(&mut self, start: Mark) -> Result<Expression, SyntaxError> {
        let operand = match self.peek() {
            Some('$') => {
                self.bump();
                Some(Operand::Variable(self.parse_name()?))
            }
            Some(ch) if ch == '|' || is_literal_start(ch) => {
                Some(Operand::Literal(self.parse_literal()?))
            }
            Some(':') => None,
            None => return Err(self.error("unclosed placeholder")),
            Some(_) => return Err(self.error("expected expression")),
        };

        let had_space = operand.is_none() || self.skip_whitespace();
        let function = if self.peek() == Some(':') {
            if !had_space {
                return Err(self.error("expected whitespace before annotation"));
            }
            Some(self.parse_function()?)
        } else {
            None
        };
        self.skip_attributes()?;
        self.skip_whitespace();
        self.expect_closing()?;
        Ok(Expression {
            operand,
            function,
            span: self.span_from(start),
        })
    }

    fn parse_function(&mut self) -> Result<FunctionRef, SyntaxError> {
        self.expect(':')?;
        let name = self.parse_identifier()?;
        let options = self.parse_options()?;
        Ok(FunctionRef { name, options })
    }

    fn parse_options(&mut self) -> Result<Vec<FunctionOption>, SyntaxError> {
        let mut options: Vec<FunctionOption> = Vec::new();
        loop {
            let checkpoint = self.mark();
            let had_space = self.skip_whitespace();
            match self.peek() {
                Some(ch) if had_space && is_name_start(ch) => {}
                _ => {
                    self.reset(checkpoint);
                    break;
                }
            }
            let name_start = self.mark();
            let name = self.parse_identifier()?;
            if options.iter().any(|option| option.name == name) {
                return Err(SyntaxError::new(
                    format!("duplicate option '{name}'"),
                    self.span_from(name_start),
                ));
            }
            self.skip_whitespace();
            self.expect('=')?;
            self.skip_whitespace();
            let value = match self.peek() {
                Some('$') => {
                    self.bump();
                    Operand::Variable(self.parse_name()?)
                }
                _ => Operand::Literal(self.parse_literal()?),
            };
            options.push(FunctionOption { name, value });
        }
        Ok(options)
    }

    fn skip_attributes(&mut self) -> Result<(), SyntaxError> {
        loop {
            let checkpoint = self.mark();
            self.skip_whitespace();
            if self.peek() != Some('@') {
                self.reset(checkpoint);
                return Ok(());
            }
            self.bump();
            self.parse_identifier()?;
            let before_value = self.mark();
            self.skip_whitespace();
            if self.peek() == Some('=') {
                self.bump();
                self.skip_whitespace();
                self.parse_literal()?;
            } else {
                self.reset(before_value);
            }
        }
    }

    fn parse_literal(&mut self) -> Result<String, SyntaxError> {
        if self.peek() == Some('|') {
            self.bump();
            let mut value = String::new();
            loop {
                match self.bump() {
                    None => return Err(self.error("unterminated literal")),
                    Some('|') => return Ok(value),
                    Some('\\') => match self.bump() {
                        Some(ch @ ('\\' | '{' | '}' | '|')) => value.push(ch),
                        _ => return Err(self.error("invalid escape sequence")),
                    },
                    Some(ch) => value.push(ch),
                }
            }
        }
        let start = self.offset;
        while let Some(ch) = self.peek() {
            if is_name_char(ch) || ch == '+' {
                self.bump();
            } else {
                break;
            }
        }
        if self.offset == start {
            return Err(self.error("expected literal"));
        }
        Ok(self.input[start..self.offset].to_string())
    }

    fn parse_identifier(&mut self) -> Result<String, SyntaxError> {
        let mut name = self.parse_name()?;
        if self.peek() == Some(':') && self.peek_nth(1).is_some_and(is_name_start) {
            self.bump();
            name.push(':');
            name.push_str(&self.parse_name()?);
        }
        Ok(name)
    }

    fn parse_name(&mut self) -> Result<String, SyntaxError> {
        match self.peek() {
            Some(ch) if is_name_start(ch) => {}
            None => return Err(self.error("unclosed placeholder")),
            Some(_) => return Err(self.error("expected name")),
        }
        let start = self.offset;
        while let Some(ch) = self.peek() {
            if is_name_char(ch) {
                self.bump();
            } else {
                break;
            }
        }
        Ok(self.input[start..self.offset].to_string())
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let rest = &self.input[self.offset..];
        let Some(after_dot) = rest.strip_prefix('.') else {
            return false;
        };
        let Some(after) = after_dot.strip_prefix(keyword) else {
            return false;
        };
        if after.chars().next().is_some_and(is_name_char) {
            return false;
        }
        for _ in 0..=keyword.chars().count() {
            self.bump();
        }
        true
    }

    fn expect(&mut self, expected: char) -> Result<(), SyntaxError> {
        match self.peek() {
            Some(ch) if ch == expected => {
                self.bump();
                Ok(())
            }
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
            Some(ch) => Err(self.error(format!("expected '{expected}', found '{ch}'"))),
        }
    }

    fn expect_closing(&mut self) -> Result<(), SyntaxError> {
        match self.peek() {
            Some('}') => {
                self.bump();
                Ok(())
            }
            None => Err(self.error("unclosed placeholder")),
            Some(ch) => Err(self.error(format!("unexpected '{ch}' in placeholder"))),
        }
    }

    /// Returns whether any whitespace was consumed.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.offset;
        while self.peek().is_some_and(is_whitespace) {
            self.bump();
        }
        self.offset > start
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.input[self.offset..].starts_with(prefix)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.offset..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.input[self.offset..].chars().nth(n)
    }

    fn at_end(&self) -> bool {
        self.offset >= self.input.len()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn mark(&self) -> Mark {
        Mark {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    fn reset(&mut self, mark: Mark) {
        self.offset = mark.offset;
        self.line = mark.line;
        self.column = mark.column;
    }

    fn span_from(&self, mark: Mark) -> Span {
        Span {
            start: mark.offset,
            end: self.offset,
            line: mark.line,
            column: mark.column,
        }
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        let end = self.offset + self.peek().map(char::len_utf8).unwrap_or(0);
        SyntaxError::new(
            message,
            Span {
                start: self.offset,
                end,
                line: self.line,
                column: self.column,
            },
        )
    }
}

fn validate_message(message: &Message) -> Result<(), SyntaxError> {
    let mut declared = BTreeSet::new();
    for declaration in &message.declarations {
        if !declared.insert(declaration.name()) {
            return Err(SyntaxError::new(
                format!("duplicate declaration of '${}'", declaration.name()),
                declaration.expression().span.clone(),
            ));
        }
    }

    if let Body::Match(matcher) = &message.body {
        for variant in &matcher.variants {
            if variant.keys.len() != matcher.selectors.len() {
                return Err(SyntaxError::new(
                    "variant key count does not match selector count",
                    variant.span.clone(),
                ));
            }
        }
        if !matcher.variants.iter().any(|variant| variant.is_catch_all()) {
            return Err(SyntaxError::new(
                "missing catch-all variant",
                matcher.span.clone(),
            ));
        }
    }
    Ok(())
}

fn is_whitespace(ch: char) -> bool {
    matches!(
        ch,
        ' ' | '\t' | '\r' | '\n' | '\u{3000}' | '\u{200E}' | '\u{200F}' | '\u{061C}'
    )
}

fn is_name_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || (!ch.is_ascii() && !is_whitespace(ch) && !ch.is_control())
}

fn is_name_char(ch: char) -> bool {
    is_name_start(ch) || ch.is_ascii_digit() || ch == '-' || ch == '.'
}

fn is_literal_start(ch: char) -> bool {
    is_name_start(ch) || ch.is_ascii_digit() || ch == '-'
}
