use thiserror::Error;

/// Unified result type for the customization engine.
pub type Result<T> = std::result::Result<T, CustomizationError>;

/// Errors surfaced while registering or resolving dashboard customizations.
#[derive(Debug, Error)]
pub enum CustomizationError {
    #[error("session is sealed; `{operation}` is no longer accepted")]
    SessionSealed { operation: &'static str },
    #[error("session is still open; `{operation}` requires a sealed session")]
    NotSealed { operation: &'static str },
    #[error("section index {section_index} does not exist (layout has {section_count} sections)")]
    Index {
        section_index: isize,
        section_count: usize,
    },
    #[error("{kind} `{name}` not found")]
    NotFound { kind: &'static str, name: String },
    #[error("plugin `{plugin}` requires engine {min}..={max}, host runs {engine}")]
    IncompatibleEngine {
        plugin: String,
        engine: semver::Version,
        min: semver::Version,
        max: semver::Version,
    },
    #[error("plugin `{plugin}` failed during {stage}: {message}")]
    Plugin {
        plugin: String,
        stage: &'static str,
        message: String,
    },
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CustomizationError {
    pub fn widget_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "widget",
            name: name.into(),
        }
    }

    pub fn event_not_found(event_type: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "event type",
            name: event_type.into(),
        }
    }
}
