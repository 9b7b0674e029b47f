use crate::parser::Span;
use crate::MarkupKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub declarations: Vec<Declaration>,
    pub body: Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Input { name: String, expression: Expression },
    Local { name: String, expression: Expression },
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Input { name, .. } | Declaration::Local { name, .. } => name,
        }
    }

    pub fn expression(&self) -> &Expression {
        match self {
            Declaration::Input { expression, .. } | Declaration::Local { expression, .. } => {
                expression
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Pattern(Pattern),
    Match(Matcher),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matcher {
    pub selectors: Vec<String>,
    pub variants: Vec<Variant>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub keys: Vec<VariantKey>,
    pub value: Pattern,
    pub span: Span,
}

impl Variant {
    pub fn is_catch_all(&self) -> bool {
        self.keys.iter().all(|key| matches!(key, VariantKey::CatchAll))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantKey {
    Literal(String),
    CatchAll,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pattern {
    pub items: Vec<PatternItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternItem {
    Text(String),
    Expression(Expression),
    Markup(Markup),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub operand: Option<Operand>,
    pub function: Option<FunctionRef>,
    pub span: Span,
}

impl Expression {
    /// Source text used to identify the placeholder in fallbacks and parts.
    pub fn source(&self) -> String {
        match (&self.operand, &self.function) {
            (Some(operand), _) => operand.source(),
            (None, Some(function)) => format!(":{}", function.name),
            (None, None) => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Variable(String),
    Literal(String),
}

impl Operand {
    pub fn source(&self) -> String {
        match self {
            Operand::Variable(name) => format!("${name}"),
            Operand::Literal(value) => format!("|{}|", escape_literal(value)),
        }
    }
}

fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == '|' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRef {
    pub name: String,
    pub options: Vec<FunctionOption>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionOption {
    pub name: String,
    pub value: Operand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markup {
    pub kind: MarkupKind,
    pub name: String,
    pub options: Vec<FunctionOption>,
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::{Expression, FunctionRef, Operand};
    use crate::parser::Span;

    fn span() -> Span {
        Span {
            start: 0,
            end: 0,
            line: 1,
            column: 1,
        }
    }

    #[test]
    fn variable_source_keeps_sigil() {
        let expr = Expression {
            operand: Some(Operand::Variable("name".to_string())),
            function: None,
            span: span(),
        };
        assert_eq!(expr.source(), "$name");
    }

    #[test]
    fn literal_source_is_quoted_and_escaped() {
        let expr = Expression {
            operand: Some(Operand::Literal("a|b".to_string())),
            function: None,
            span: span(),
        };
        assert_eq!(expr.source(), r"|a\|b|");
    }

    #[test]
    fn function_only_source_names_function() {
        let expr = Expression {
            operand: None,
            function: Some(FunctionRef {
                name: "now".to_string(),
                options: Vec::new(),
            }),
            span: span(),
        };
        assert_eq!(expr.source(), ":now");
    }
}
