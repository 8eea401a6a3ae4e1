//! Structural edits applied to an immutable base layout.
//!
//! Index rule shared by sections and items: a non-negative index inserts
//! before that position (clamped to the end), a negative index counts from
//! the end so that `-1` appends and `-(n + 1)` or lower inserts at the front.

use serde::{Deserialize, Serialize};

use crate::error::{CustomizationError, Result};

use super::core::{Layout, LayoutItem, Section};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LayoutMutation {
    InsertSection {
        index: isize,
        section: Section,
    },
    InsertItem {
        section_index: isize,
        item_index: isize,
        item: LayoutItem,
    },
}

impl LayoutMutation {
    pub fn insert_section(index: isize, section: Section) -> Self {
        Self::InsertSection { index, section }
    }

    pub fn insert_item(section_index: isize, item_index: isize, item: LayoutItem) -> Self {
        Self::InsertItem {
            section_index,
            item_index,
            item,
        }
    }
}

/// Normalize an insertion index against a sequence of length `len`.
pub fn resolve_insert_index(index: isize, len: usize) -> usize {
    if index >= 0 {
        (index as usize).min(len)
    } else {
        let shifted = len as isize + index + 1;
        shifted.clamp(0, len as isize) as usize
    }
}

/// Apply `mutations` in order, each against the result of the previous one.
/// The input layout is left untouched.
pub fn apply_mutations(base: &Layout, mutations: &[LayoutMutation]) -> Result<Layout> {
    let mut layout = base.clone();
    for mutation in mutations {
        apply_one(&mut layout, mutation)?;
    }
    Ok(layout)
}

fn apply_one(layout: &mut Layout, mutation: &LayoutMutation) -> Result<()> {
    match mutation {
        LayoutMutation::InsertSection { index, section } => {
            let at = resolve_insert_index(*index, layout.sections.len());
            layout.sections.insert(at, section.clone());
        }
        LayoutMutation::InsertItem {
            section_index,
            item_index,
            item,
        } => {
            let section_count = layout.sections.len();
            let at = resolve_insert_index(*section_index, section_count);
            let section = layout
                .sections
                .get_mut(at)
                .ok_or(CustomizationError::Index {
                    section_index: *section_index,
                    section_count,
                })?;
            let item_at = resolve_insert_index(*item_index, section.items.len());
            section.items.insert(item_at, item.clone());
        }
    }
    Ok(())
}

/// Mutation recorder handed to layout customizer callbacks.
#[derive(Debug, Default)]
pub struct LayoutCustomizer {
    mutations: Vec<LayoutMutation>,
}

impl LayoutCustomizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_section(&mut self, index: isize, section: Section) -> &mut Self {
        self.mutations.push(LayoutMutation::insert_section(index, section));
        self
    }

    pub fn add_item(
        &mut self,
        section_index: isize,
        item_index: isize,
        item: LayoutItem,
    ) -> &mut Self {
        self.mutations.push(LayoutMutation::insert_item(
            section_index,
            item_index,
            item,
        ));
        self
    }

    pub fn mutations(&self) -> &[LayoutMutation] {
        &self.mutations
    }

    pub fn into_mutations(self) -> Vec<LayoutMutation> {
        self.mutations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(count: usize) -> Layout {
        Layout::new(
            (0..count)
                .map(|i| Section::new(format!("orig{i}")))
                .collect(),
        )
    }

    fn titles(layout: &Layout) -> Vec<&str> {
        layout
            .sections
            .iter()
            .map(|s| s.title().unwrap_or(""))
            .collect()
    }

    #[test]
    fn resolves_positive_and_negative_indices() {
        assert_eq!(resolve_insert_index(0, 3), 0);
        assert_eq!(resolve_insert_index(3, 3), 3);
        assert_eq!(resolve_insert_index(7, 3), 3);
        assert_eq!(resolve_insert_index(-1, 3), 3);
        assert_eq!(resolve_insert_index(-1, 0), 0);
        assert_eq!(resolve_insert_index(-2, 3), 2);
        assert_eq!(resolve_insert_index(-4, 3), 0);
        assert_eq!(resolve_insert_index(-10, 3), 0);
    }

    #[test]
    fn front_and_back_insertions() {
        let layout = apply_mutations(
            &base(2),
            &[
                LayoutMutation::insert_section(0, Section::new("A")),
                LayoutMutation::insert_section(-1, Section::new("B")),
            ],
        )
        .unwrap();
        assert_eq!(titles(&layout), vec!["A", "orig0", "orig1", "B"]);
    }

    #[test]
    fn positive_insert_shifts_following_sections() {
        for i in 0..=3 {
            let layout =
                apply_mutations(&base(3), &[LayoutMutation::insert_section(i, Section::new("new"))])
                    .unwrap();
            let titles = titles(&layout);
            assert_eq!(titles.len(), 4);
            assert_eq!(titles[i as usize], "new");
            let rest: Vec<_> = titles.iter().filter(|t| **t != "new").copied().collect();
            assert_eq!(rest, vec!["orig0", "orig1", "orig2"]);
        }
    }

    #[test]
    fn minus_one_appends_each_time() {
        let once =
            apply_mutations(&base(1), &[LayoutMutation::insert_section(-1, Section::new("X"))])
                .unwrap();
        let twice =
            apply_mutations(&once, &[LayoutMutation::insert_section(-1, Section::new("X"))])
                .unwrap();
        assert_eq!(titles(&twice), vec!["orig0", "X", "X"]);
    }

    #[test]
    fn indices_follow_earlier_mutations_in_batch() {
        let layout = apply_mutations(
            &base(1),
            &[
                LayoutMutation::insert_section(0, Section::new("A")),
                LayoutMutation::insert_item(0, -1, LayoutItem::custom_widget("w1", "first")),
                LayoutMutation::insert_item(1, 0, LayoutItem::custom_widget("w2", "second")),
            ],
        )
        .unwrap();
        assert_eq!(layout.sections[0].title(), Some("A"));
        assert_eq!(layout.sections[0].items.len(), 1);
        assert_eq!(layout.sections[1].items.len(), 1);
        assert_eq!(
            layout.sections[1].items[0].widget.custom_type(),
            Some("second")
        );
    }

    #[test]
    fn item_index_clamps() {
        let seeded = base(1);
        let layout = apply_mutations(
            &seeded,
            &[
                LayoutMutation::insert_item(0, 0, LayoutItem::custom_widget("a", "a")),
                LayoutMutation::insert_item(0, 99, LayoutItem::custom_widget("b", "b")),
                LayoutMutation::insert_item(0, -99, LayoutItem::custom_widget("c", "c")),
            ],
        )
        .unwrap();
        let types: Vec<_> = layout.custom_widget_types();
        assert_eq!(types, vec!["c", "a", "b"]);
    }

    #[test]
    fn missing_section_is_an_index_error() {
        let err = apply_mutations(
            &Layout::default(),
            &[LayoutMutation::insert_item(0, 0, LayoutItem::custom_widget("a", "a"))],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CustomizationError::Index {
                section_index: 0,
                section_count: 0
            }
        ));

        let err = apply_mutations(
            &base(2),
            &[LayoutMutation::insert_item(5, 0, LayoutItem::custom_widget("a", "a"))],
        )
        .unwrap_err();
        assert!(matches!(err, CustomizationError::Index { .. }));
    }

    #[test]
    fn negative_section_index_targets_from_end() {
        // -1 resolves to `len`, which is one past the last section.
        let err = apply_mutations(
            &base(2),
            &[LayoutMutation::insert_item(-1, 0, LayoutItem::custom_widget("a", "a"))],
        )
        .unwrap_err();
        assert!(matches!(err, CustomizationError::Index { .. }));

        let layout = apply_mutations(
            &base(2),
            &[LayoutMutation::insert_item(-2, 0, LayoutItem::custom_widget("a", "a"))],
        )
        .unwrap();
        assert_eq!(layout.sections[1].items.len(), 1);
    }

    #[test]
    fn base_layout_is_not_modified() {
        let original = base(2);
        let snapshot = original.clone();
        let _ = apply_mutations(
            &original,
            &[
                LayoutMutation::insert_section(0, Section::new("A")),
                LayoutMutation::insert_item(0, 0, LayoutItem::custom_widget("w", "w")),
            ],
        )
        .unwrap();
        assert_eq!(original, snapshot);
    }

    #[test]
    fn customizer_records_in_call_order() {
        let mut customizer = LayoutCustomizer::new();
        customizer
            .add_section(0, Section::new("A"))
            .add_item(0, -1, LayoutItem::custom_widget("w", "w"));
        assert_eq!(customizer.mutations().len(), 2);
        let mutations = customizer.into_mutations();
        assert!(matches!(mutations[0], LayoutMutation::InsertSection { index: 0, .. }));
        assert!(matches!(
            mutations[1],
            LayoutMutation::InsertItem {
                section_index: 0,
                item_index: -1,
                ..
            }
        ));
    }
}
