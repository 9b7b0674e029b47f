use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use mf2_render_core::{Options, Value};

use crate::error::RenderResult;
use crate::ui::UiNode;

/// What a slot receives when it replaces a variable or a markup element.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotProps {
    pub name: String,
    /// The variable's value, or the flattened text of a markup element.
    pub value: Value,
    /// Rendered children; empty for variables.
    pub children: Vec<UiNode>,
    pub options: Options,
}

impl SlotProps {
    /// Looks up a prop; both the slot's own name and `value` yield the value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if key == self.name || key == "value" {
            Some(&self.value)
        } else {
            self.options.get(key)
        }
    }
}

pub type SlotFn = Rc<dyn Fn(&SlotProps) -> RenderResult<UiNode>>;

/// Per-render overrides keyed by variable or markup name.
#[derive(Clone, Default)]
pub struct Slots {
    slots: BTreeMap<String, SlotFn>,
}

impl Slots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, name: impl Into<String>, slot: F) -> Self
    where
        F: Fn(&SlotProps) -> RenderResult<UiNode> + 'static,
    {
        self.insert(name, slot);
        self
    }

    pub fn insert<F>(&mut self, name: impl Into<String>, slot: F)
    where
        F: Fn(&SlotProps) -> RenderResult<UiNode> + 'static,
    {
        self.slots.insert(name.into(), Rc::new(slot));
    }

    pub fn get(&self, name: &str) -> Option<&SlotFn> {
        self.slots.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl fmt::Debug for Slots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.slots.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use mf2_render_core::{Options, Value};

    use super::{SlotProps, Slots};
    use crate::ui::UiNode;

    #[test]
    fn props_expose_value_under_both_keys() {
        let mut options = Options::new();
        options.insert("to".to_string(), Value::from("/help"));
        let props = SlotProps {
            name: "user".to_string(),
            value: Value::from("Ada"),
            children: Vec::new(),
            options,
        };
        assert_eq!(props.get("user"), Some(&Value::from("Ada")));
        assert_eq!(props.get("value"), Some(&Value::from("Ada")));
        assert_eq!(props.get("to"), Some(&Value::from("/help")));
        assert_eq!(props.get("other"), None);
    }

    #[test]
    fn slots_are_looked_up_by_name() {
        let slots = Slots::new().with("user", |props| {
            Ok(UiNode::element("b", vec![UiNode::text(props.value.to_string())]))
        });
        assert!(slots.contains("user"));
        assert_eq!(slots.len(), 1);
        let slot = slots.get("user").expect("slot");
        let node = slot(&SlotProps {
            name: "user".to_string(),
            value: Value::from("Ada"),
            children: Vec::new(),
            options: Options::new(),
        })
        .expect("render");
        assert_eq!(node.to_html(), "<b>Ada</b>");
    }
}
