use std::collections::HashMap;

use serde_json::Value;

use crate::component::Component;
use crate::error::{CustomizationError, Result};

/// Registered custom widget: render component plus default properties.
#[derive(Debug, Clone)]
pub struct CustomWidget {
    pub component: Component,
    pub default_props: Value,
}

impl CustomWidget {
    pub fn new(component: Component, default_props: Option<Value>) -> Self {
        Self {
            component,
            default_props: default_props.unwrap_or_else(|| Value::Object(Default::default())),
        }
    }

    /// Instance properties layered over the defaults. Top-level keys from the
    /// instance win; anything else in the defaults is kept.
    pub fn props_for(&self, instance: &Value) -> Value {
        merge_props(&self.default_props, instance)
    }

    pub fn render(&self, instance: &Value) -> String {
        self.component.render(&self.props_for(instance))
    }
}

pub(crate) fn merge_props(base: &Value, updates: &Value) -> Value {
    match (base, updates) {
        (Value::Object(a), Value::Object(b)) => {
            let mut merged = a.clone();
            for (k, v) in b {
                merged.insert(k.clone(), v.clone());
            }
            Value::Object(merged)
        }
        (_, Value::Null) => base.clone(),
        _ => updates.clone(),
    }
}

/// Custom widget types keyed by unique name.
///
/// Registering a name twice replaces the earlier entry. Plugins rely on
/// this to swap a widget implementation, so it is not treated as an error.
#[derive(Debug, Clone, Default)]
pub struct CustomWidgetRegistry {
    map: HashMap<String, CustomWidget>,
    order: Vec<String>,
}

impl CustomWidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the replaced entry when `name` was already registered.
    pub fn register(&mut self, name: &str, widget: CustomWidget) -> Option<CustomWidget> {
        let previous = self.map.insert(name.to_string(), widget);
        if previous.is_none() {
            self.order.push(name.to_string());
        }
        previous
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&CustomWidget> {
        self.map
            .get(name)
            .ok_or_else(|| CustomizationError::widget_not_found(name))
    }

    /// Names in first-registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn widget(markup: &str) -> CustomWidget {
        CustomWidget::new(Component::fixed("w", markup), None)
    }

    #[test]
    fn lookup_unknown_name_fails() {
        let registry = CustomWidgetRegistry::new();
        let err = registry.get("missing").unwrap_err();
        assert!(matches!(
            err,
            CustomizationError::NotFound { kind: "widget", .. }
        ));
    }

    #[test]
    fn reregistering_overwrites_last_write_wins() {
        // Documented quirk: duplicate names silently replace the earlier widget.
        let mut registry = CustomWidgetRegistry::new();
        assert!(registry.register("myCustomWidget", widget("first")).is_none());
        let replaced = registry.register("myCustomWidget", widget("second"));
        assert!(replaced.is_some());
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("myCustomWidget").unwrap().render(&Value::Null),
            "second"
        );
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["myCustomWidget"]);
    }

    #[test]
    fn instance_props_override_defaults() {
        let widget = CustomWidget::new(
            Component::new("echo", |props| props.to_string()),
            Some(json!({"color": "cyan", "rows": 3})),
        );
        let merged = widget.props_for(&json!({"rows": 5}));
        assert_eq!(merged, json!({"color": "cyan", "rows": 5}));
        assert_eq!(widget.props_for(&Value::Null), json!({"color": "cyan", "rows": 3}));
    }
}
