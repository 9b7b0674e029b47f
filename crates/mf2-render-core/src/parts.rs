use serde::{Deserialize, Serialize};

use crate::{Options, Value};

/// First strong isolate, opens an isolated placeholder.
pub const FSI: &str = "\u{2068}";
/// Pop directional isolate, closes an isolated placeholder.
pub const PDI: &str = "\u{2069}";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupKind {
    Open,
    Close,
    Standalone,
}

/// One entry of the flat token stream produced by `format_to_parts`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MessagePart {
    Text {
        value: String,
    },
    Markup {
        kind: MarkupKind,
        name: String,
        #[serde(default, skip_serializing_if = "Options::is_empty")]
        options: Options,
    },
    BidiIsolation {
        value: String,
    },
    Expression(ExpressionPart),
}

impl MessagePart {
    pub fn text(value: impl Into<String>) -> Self {
        MessagePart::Text {
            value: value.into(),
        }
    }

    pub fn open(name: impl Into<String>, options: Options) -> Self {
        MessagePart::Markup {
            kind: MarkupKind::Open,
            name: name.into(),
            options,
        }
    }

    pub fn close(name: impl Into<String>) -> Self {
        MessagePart::Markup {
            kind: MarkupKind::Close,
            name: name.into(),
            options: Options::new(),
        }
    }

    pub fn standalone(name: impl Into<String>, options: Options) -> Self {
        MessagePart::Markup {
            kind: MarkupKind::Standalone,
            name: name.into(),
            options,
        }
    }

    pub fn is_markup(&self) -> bool {
        matches!(self, MessagePart::Markup { .. })
    }
}

/// A formatted placeholder value.
///
/// `kind` names the function that produced it (`string`, `number`, or a
/// custom function), or `fallback` when the placeholder could not be resolved.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpressionPart {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<SubPart>>,
}

impl ExpressionPart {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_parts(mut self, parts: Vec<SubPart>) -> Self {
        self.parts = Some(parts);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl SubPart {
    pub fn new(kind: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            kind: kind.into(),
            value: Some(value.into()),
        }
    }
}
