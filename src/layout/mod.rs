//! Dashboard layout model and the layout tree editor.
//!
//! Downstream code imports layout types from here while the model lives in
//! the private `core` module and structural edits in `editor`.

mod core;
pub mod editor;

pub use self::core::{GRID_COLUMNS, ItemSize, Layout, LayoutItem, Section, SectionHeader, Widget};
pub use editor::{LayoutCustomizer, LayoutMutation, apply_mutations, resolve_insert_index};
