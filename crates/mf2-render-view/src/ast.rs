use mf2_render_core::{ExpressionPart, MarkupKind, MessagePart, Options, Value};
use tracing::trace;

/// Message tree rebuilt from a flat part stream.
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    Text {
        text: String,
    },
    Variable {
        name: Option<String>,
        value: Option<Value>,
        text: String,
    },
    Markup {
        name: String,
        options: Options,
        children: Vec<AstNode>,
    },
}

impl AstNode {
    pub fn text(text: impl Into<String>) -> Self {
        AstNode::Text { text: text.into() }
    }

    pub fn markup(name: impl Into<String>, children: Vec<AstNode>) -> Self {
        AstNode::Markup {
            name: name.into(),
            options: Options::new(),
            children,
        }
    }
}

struct Frame {
    name: String,
    options: Options,
    children: Vec<AstNode>,
}

impl Frame {
    fn into_node(self) -> AstNode {
        AstNode::Markup {
            name: self.name,
            options: self.options,
            children: self.children,
        }
    }
}

fn insertion_point<'a>(root: &'a mut Vec<AstNode>, stack: &'a mut [Frame]) -> &'a mut Vec<AstNode> {
    match stack.last_mut() {
        Some(frame) => &mut frame.children,
        None => root,
    }
}

/// Rebuilds nesting from `parts`. Close markers that do not match the
/// innermost open markup are dropped; markup still open at the end of the
/// stream keeps the children collected so far.
pub fn build_tree(parts: &[MessagePart]) -> Vec<AstNode> {
    let mut root = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut dropped = 0usize;

    for part in parts {
        match part {
            MessagePart::Text { value } => {
                insertion_point(&mut root, &mut stack).push(AstNode::text(value.as_str()));
            }
            MessagePart::BidiIsolation { .. } => {}
            MessagePart::Markup {
                kind: MarkupKind::Open,
                name,
                options,
            } => stack.push(Frame {
                name: name.clone(),
                options: options.clone(),
                children: Vec::new(),
            }),
            MessagePart::Markup {
                kind: MarkupKind::Close,
                name,
                ..
            } => {
                if stack.last().is_some_and(|frame| frame.name == *name) {
                    if let Some(frame) = stack.pop() {
                        insertion_point(&mut root, &mut stack).push(frame.into_node());
                    }
                } else {
                    dropped += 1;
                }
            }
            MessagePart::Markup {
                kind: MarkupKind::Standalone,
                name,
                options,
            } => insertion_point(&mut root, &mut stack).push(AstNode::Markup {
                name: name.clone(),
                options: options.clone(),
                children: Vec::new(),
            }),
            MessagePart::Expression(expression) => {
                insertion_point(&mut root, &mut stack).push(variable_node(expression));
            }
        }
    }

    if dropped > 0 || !stack.is_empty() {
        trace!(
            "recovered from malformed markup: {dropped} dropped close marker(s), {} unclosed",
            stack.len()
        );
    }
    while let Some(frame) = stack.pop() {
        insertion_point(&mut root, &mut stack).push(frame.into_node());
    }
    root
}

fn variable_node(expression: &ExpressionPart) -> AstNode {
    AstNode::Variable {
        name: expression.source.as_deref().and_then(variable_name),
        value: expression.value.clone(),
        text: expression_text(expression),
    }
}

/// Display text of an expression part: its sub-parts when present (an empty
/// list yields ""), else its value, else the `{source}` echo.
pub fn expression_text(expression: &ExpressionPart) -> String {
    let echo = || {
        expression
            .source
            .as_deref()
            .map(|source| format!("{{{source}}}"))
            .unwrap_or_default()
    };
    if let Some(parts) = expression.parts.as_ref() {
        let mut text = String::new();
        for part in parts {
            match &part.value {
                Some(value) => text.push_str(&value.to_string()),
                None => return echo(),
            }
        }
        return text;
    }
    match &expression.value {
        Some(value) => value.to_string(),
        None => echo(),
    }
}

/// Identifier named by an expression source: `$name` yields `name`,
/// otherwise the first identifier-like run.
pub fn variable_name(source: &str) -> Option<String> {
    let source = source.trim();
    if let Some(rest) = source.strip_prefix('$') {
        let name: String = rest
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .collect();
        if !name.is_empty() {
            return Some(name);
        }
    }
    let start = source.find(|ch: char| ch.is_ascii_alphabetic() || ch == '_')?;
    let name: String = source[start..]
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .collect();
    Some(name)
}

/// Plain text of a tree; markup contributes only its children.
pub fn flatten(nodes: &[AstNode]) -> String {
    let mut out = String::new();
    flatten_into(nodes, &mut out);
    out
}

fn flatten_into(nodes: &[AstNode], out: &mut String) {
    for node in nodes {
        match node {
            AstNode::Text { text } | AstNode::Variable { text, .. } => out.push_str(text),
            AstNode::Markup { children, .. } => flatten_into(children, out),
        }
    }
}
