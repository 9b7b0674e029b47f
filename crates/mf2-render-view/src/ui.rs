use std::collections::BTreeMap;

/// Framework-neutral view tree produced by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiNode {
    Text(String),
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
        children: Vec<UiNode>,
    },
    Fragment(Vec<UiNode>),
}

impl UiNode {
    pub fn text(value: impl Into<String>) -> Self {
        UiNode::Text(value.into())
    }

    pub fn element(tag: impl Into<String>, children: Vec<UiNode>) -> Self {
        UiNode::Element {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            children,
        }
    }

    pub fn fragment(children: Vec<UiNode>) -> Self {
        UiNode::Fragment(children)
    }

    /// Sets an attribute; no effect on text and fragment nodes.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let UiNode::Element { attrs, .. } = &mut self {
            attrs.insert(name.into(), value.into());
        }
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            UiNode::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            _ => None,
        }
    }

    pub fn children(&self) -> &[UiNode] {
        match self {
            UiNode::Text(_) => &[],
            UiNode::Element { children, .. } | UiNode::Fragment(children) => children,
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            UiNode::Text(text) => out.push_str(text),
            UiNode::Element { children, .. } | UiNode::Fragment(children) => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            UiNode::Text(text) => html_escape_into(out, text),
            UiNode::Fragment(children) => {
                for child in children {
                    child.write_html(out);
                }
            }
            UiNode::Element {
                tag,
                attrs,
                children,
            } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    html_escape_into(out, value);
                    out.push('"');
                }
                out.push('>');
                for child in children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

impl From<&str> for UiNode {
    fn from(value: &str) -> Self {
        UiNode::text(value)
    }
}

impl From<String> for UiNode {
    fn from(value: String) -> Self {
        UiNode::Text(value)
    }
}

fn html_escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}
