use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::target::TargetRef;

/// Width of the fluid grid in columns.
pub const GRID_COLUMNS: u8 = 12;

/// Grid footprint of a layout item at the widest breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSize {
    pub grid_width: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_height: Option<u16>,
}

impl Default for ItemSize {
    fn default() -> Self {
        Self {
            grid_width: GRID_COLUMNS,
            grid_height: None,
        }
    }
}

impl ItemSize {
    pub fn new(grid_width: u8, grid_height: u16) -> Self {
        Self {
            grid_width: grid_width.clamp(1, GRID_COLUMNS),
            grid_height: Some(grid_height),
        }
    }
}

/// Widget placed in a layout item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Widget {
    Insight {
        reference: TargetRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    Kpi {
        reference: TargetRef,
    },
    Custom {
        local_id: String,
        custom_type: String,
        #[serde(default, skip_serializing_if = "Value::is_null")]
        properties: Value,
    },
    Placeholder,
}

impl Widget {
    pub fn insight(reference: TargetRef) -> Self {
        Self::Insight {
            reference,
            title: None,
        }
    }

    pub fn custom(local_id: impl Into<String>, custom_type: impl Into<String>) -> Self {
        Self::custom_with_properties(local_id, custom_type, Value::Null)
    }

    /// Custom widget carrying extra properties, e.g. `dateDataSet` or
    /// `ignoreDashboardFilters`.
    pub fn custom_with_properties(
        local_id: impl Into<String>,
        custom_type: impl Into<String>,
        properties: Value,
    ) -> Self {
        Self::Custom {
            local_id: local_id.into(),
            custom_type: custom_type.into(),
            properties,
        }
    }

    pub fn custom_type(&self) -> Option<&str> {
        match self {
            Self::Custom { custom_type, .. } => Some(custom_type),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutItem {
    pub widget: Widget,
    #[serde(default)]
    pub size: ItemSize,
}

impl LayoutItem {
    pub fn new(widget: Widget) -> Self {
        Self {
            widget,
            size: ItemSize::default(),
        }
    }

    pub fn custom_widget(local_id: impl Into<String>, custom_type: impl Into<String>) -> Self {
        Self::new(Widget::custom(local_id, custom_type))
    }

    pub fn with_size(mut self, grid_width: u8, grid_height: u16) -> Self {
        self.size = ItemSize::new(grid_width, grid_height);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub header: SectionHeader,
    #[serde(default)]
    pub items: Vec<LayoutItem>,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            header: SectionHeader {
                title: Some(title.into()),
                description: None,
            },
            items: Vec::new(),
        }
    }

    pub fn untitled() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.header.description = Some(description.into());
        self
    }

    pub fn with_item(mut self, item: LayoutItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.header.title.as_deref()
    }
}

/// Fluid dashboard layout: ordered sections, each an ordered list of items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Layout {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn section_titles(&self) -> Vec<Option<&str>> {
        self.sections.iter().map(Section::title).collect()
    }

    /// Custom widget types referenced anywhere in the layout, in layout order.
    pub fn custom_widget_types(&self) -> Vec<&str> {
        self.sections
            .iter()
            .flat_map(|section| section.items.iter())
            .filter_map(|item| item.widget.custom_type())
            .collect()
    }

    /// Content hash of the canonical JSON form. Hosts compare fingerprints
    /// to tell whether customization changed the layout at all.
    pub fn fingerprint(&self) -> blake3::Hash {
        let encoded = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&encoded)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}
