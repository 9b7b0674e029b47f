use mf2_render_core::{Options, Value};

use crate::ast::{AstNode, flatten};
use crate::error::RenderResult;
use crate::markups::{MarkupRegistry, MarkupRenderInput};
use crate::slots::{SlotProps, Slots};
use crate::ui::UiNode;

/// Element used for markup that neither a slot nor the registry handles.
pub const DEFAULT_CONTAINER: &str = "span";

/// Renders a message tree. Slots win over registered markup renderers;
/// unknown markup wraps its children in a plain `span`. The first slot or
/// renderer error aborts the render.
pub fn render_nodes(
    nodes: &[AstNode],
    slots: &Slots,
    markups: &MarkupRegistry,
) -> RenderResult<Vec<UiNode>> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        render_node(node, slots, markups, &mut out)?;
    }
    Ok(out)
}

fn render_node(
    node: &AstNode,
    slots: &Slots,
    markups: &MarkupRegistry,
    out: &mut Vec<UiNode>,
) -> RenderResult<()> {
    match node {
        AstNode::Text { text } => out.push(UiNode::text(text.as_str())),
        AstNode::Variable { name, value, text } => {
            let slot = name.as_deref().and_then(|name| slots.get(name).map(|slot| (name, slot)));
            match slot {
                Some((name, slot)) => {
                    let props = SlotProps {
                        name: name.to_string(),
                        value: value.clone().unwrap_or(Value::Null),
                        children: Vec::new(),
                        options: Options::new(),
                    };
                    splice(out, slot(&props)?);
                }
                None => out.push(UiNode::text(text.as_str())),
            }
        }
        AstNode::Markup {
            name,
            options,
            children,
        } => {
            let rendered = render_nodes(children, slots, markups)?;
            if let Some(slot) = slots.get(name) {
                let props = SlotProps {
                    name: name.clone(),
                    value: Value::Str(flatten(children)),
                    children: rendered,
                    options: options.clone(),
                };
                splice(out, slot(&props)?);
            } else if let Some(renderer) = markups.get(name) {
                let node = renderer(MarkupRenderInput {
                    children: rendered,
                    options: options.clone(),
                })?;
                out.push(node);
            } else {
                out.push(UiNode::element(DEFAULT_CONTAINER, rendered));
            }
        }
    }
    Ok(())
}

fn splice(out: &mut Vec<UiNode>, node: UiNode) {
    match node {
        UiNode::Fragment(children) => out.extend(children),
        other => out.push(other),
    }
}
