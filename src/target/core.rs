use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque reference to a filter display form, insight, or widget.
///
/// The same logical object may be referenced through different forms
/// depending on where the value was deserialized from, so references are
/// always compared through a [`RefEquality`] rather than `==`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TargetRef {
    Uri { uri: String },
    Identifier {
        identifier: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
    },
    LocalId { local_id: String },
}

impl TargetRef {
    pub fn uri(uri: impl Into<String>) -> Self {
        Self::Uri { uri: uri.into() }
    }

    pub fn id(identifier: impl Into<String>) -> Self {
        Self::Identifier {
            identifier: identifier.into(),
            kind: None,
        }
    }

    pub fn id_of_kind(identifier: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::Identifier {
            identifier: identifier.into(),
            kind: Some(kind.into()),
        }
    }

    pub fn local(local_id: impl Into<String>) -> Self {
        Self::LocalId {
            local_id: local_id.into(),
        }
    }

    /// Raw key regardless of the reference form.
    pub fn key(&self) -> &str {
        match self {
            Self::Uri { uri } => uri,
            Self::Identifier { identifier, .. } => identifier,
            Self::LocalId { local_id } => local_id,
        }
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uri { uri } => write!(f, "uri:{uri}"),
            Self::Identifier {
                identifier,
                kind: Some(kind),
            } => write!(f, "id:{kind}/{identifier}"),
            Self::Identifier { identifier, .. } => write!(f, "id:{identifier}"),
            Self::LocalId { local_id } => write!(f, "local:{local_id}"),
        }
    }
}

/// Caller supplied equality used when matching references.
#[derive(Clone)]
pub struct RefEquality {
    eq: Arc<dyn Fn(&TargetRef, &TargetRef) -> bool + Send + Sync>,
}

impl RefEquality {
    pub fn new<F>(eq: F) -> Self
    where
        F: Fn(&TargetRef, &TargetRef) -> bool + Send + Sync + 'static,
    {
        Self { eq: Arc::new(eq) }
    }

    /// Same form and same value. Identifier kinds only have to agree when
    /// both sides carry one.
    pub fn strict() -> Self {
        Self::new(|a, b| match (a, b) {
            (TargetRef::Uri { uri: a }, TargetRef::Uri { uri: b }) => a == b,
            (
                TargetRef::Identifier {
                    identifier: a,
                    kind: ka,
                },
                TargetRef::Identifier {
                    identifier: b,
                    kind: kb,
                },
            ) => a == b && (ka.is_none() || kb.is_none() || ka == kb),
            (TargetRef::LocalId { local_id: a }, TargetRef::LocalId { local_id: b }) => a == b,
            _ => false,
        })
    }

    /// Compares raw keys and ignores the reference form.
    pub fn by_key() -> Self {
        Self::new(|a, b| a.key() == b.key())
    }

    pub fn matches(&self, a: &TargetRef, b: &TargetRef) -> bool {
        (self.eq)(a, b)
    }
}

impl Default for RefEquality {
    fn default() -> Self {
        Self::strict()
    }
}

impl fmt::Debug for RefEquality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefEquality(..)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetKind {
    AttributeFilter,
    DateFilter,
    Insight,
    Kpi,
    CustomWidget,
}

/// Instance being customized: a filter, insight, KPI or custom widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub kind: TargetKind,
    pub reference: TargetRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub properties: Value,
}

impl Target {
    pub fn new(kind: TargetKind, reference: TargetRef) -> Self {
        Self {
            kind,
            reference,
            title: None,
            properties: Value::Null,
        }
    }

    pub fn attribute_filter(display_form: TargetRef) -> Self {
        Self::new(TargetKind::AttributeFilter, display_form)
    }

    pub fn insight(reference: TargetRef, title: impl Into<String>) -> Self {
        Self::new(TargetKind::Insight, reference).with_title(title)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_properties(mut self, properties: Value) -> Self {
        self.properties = properties;
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

/// Host supplied context handed to plugins and to every predicate and resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardContext {
    pub workspace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard: Option<TargetRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,
}

impl DashboardContext {
    pub fn new(workspace: impl Into<String>) -> Self {
        Self {
            workspace: workspace.into(),
            dashboard: None,
            parameters: None,
        }
    }

    pub fn with_dashboard(mut self, dashboard: TargetRef) -> Self {
        self.dashboard = Some(dashboard);
        self
    }

    pub fn with_parameters(mut self, parameters: impl Into<String>) -> Self {
        self.parameters = Some(parameters.into());
        self
    }

    /// Metadata object URI scoped to this workspace.
    pub fn object_uri(&self, object_id: u64) -> TargetRef {
        TargetRef::uri(format!("/gdc/md/{}/obj/{}", self.workspace, object_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strict_equality_requires_same_form() {
        let eq = RefEquality::strict();
        assert!(eq.matches(&TargetRef::id("region"), &TargetRef::id("region")));
        assert!(!eq.matches(&TargetRef::id("region"), &TargetRef::uri("region")));
        assert!(!eq.matches(&TargetRef::local("a"), &TargetRef::local("b")));
    }

    #[test]
    fn strict_equality_ignores_missing_kind() {
        let eq = RefEquality::strict();
        assert!(eq.matches(
            &TargetRef::id("sum_of_price"),
            &TargetRef::id_of_kind("sum_of_price", "measure")
        ));
        assert!(!eq.matches(
            &TargetRef::id_of_kind("x", "measure"),
            &TargetRef::id_of_kind("x", "attribute")
        ));
    }

    #[test]
    fn custom_equality_bridges_forms() {
        let eq = RefEquality::by_key();
        assert!(eq.matches(&TargetRef::uri("region"), &TargetRef::id("region")));
    }

    #[test]
    fn context_builds_workspace_uris() {
        let ctx = DashboardContext::new("ws1");
        assert_eq!(ctx.object_uri(1805), TargetRef::uri("/gdc/md/ws1/obj/1805"));
    }

    #[test]
    fn target_ref_serializes_with_tag() {
        let value = serde_json::to_value(TargetRef::local("w1")).unwrap();
        assert_eq!(value, json!({"type": "localId", "localId": "w1"}));

        let parsed: TargetRef =
            serde_json::from_value(json!({"type": "localId", "localId": "w2"})).unwrap();
        assert_eq!(parsed, TargetRef::local("w2"));
    }
}
