// =============================================================================
// FILTER MODULE
// =============================================================================
// Narrows a batch of items down to the ones matching the search box.
//
// Matching is a case-insensitive substring test against the field(s) picked
// by the filter scope. The result borrows from the batch and keeps its order;
// the batch itself is never touched.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::models::{FilterOptions, Item};

// -----------------------------------------------------------------------------
// FILTER SCOPE
// -----------------------------------------------------------------------------
/// Which field(s) a search term is matched against.
///
/// Scopes the dashboard doesn't know about deserialize to `Unknown`, which
/// matches every item instead of failing the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterType {
    /// name, article, shk, wr_shk, wr_name, executor, condition_state, prunit_name
    #[default]
    All,
    Shk,
    Article,
    /// Cell code or cell name
    Cell,
    CellName,
    Name,
    Executor,
    Condition,
    #[serde(other)]
    Unknown,
}

impl FilterType {
    /// Every scope offered in the scope picker.
    pub const SELECTABLE: [FilterType; 8] = [
        FilterType::All,
        FilterType::Shk,
        FilterType::Article,
        FilterType::Cell,
        FilterType::CellName,
        FilterType::Name,
        FilterType::Executor,
        FilterType::Condition,
    ];

    /// Display label for the scope picker.
    pub fn label(self) -> &'static str {
        match self {
            FilterType::All | FilterType::Unknown => "Все поля",
            FilterType::Shk => "ШК",
            FilterType::Article => "Артикул",
            FilterType::Cell => "Ячейка",
            FilterType::CellName => "Название ячейки",
            FilterType::Name => "Название",
            FilterType::Executor => "Исполнитель",
            FilterType::Condition => "Состояние",
        }
    }

    /// Does `item` match the already lower-cased `term` in this scope?
    fn matches(self, item: &Item, term: &str) -> bool {
        fn contains(field: &str, term: &str) -> bool {
            field.to_lowercase().contains(term)
        }

        match self {
            FilterType::All => [
                &item.name,
                &item.article,
                &item.shk,
                &item.wr_shk,
                &item.wr_name,
                &item.executor,
                &item.condition_state,
                &item.prunit_name,
            ]
            .into_iter()
            .any(|field| contains(field, term)),
            FilterType::Shk => contains(&item.shk, term),
            FilterType::Article => contains(&item.article, term),
            FilterType::Cell => contains(&item.wr_shk, term) || contains(&item.wr_name, term),
            FilterType::CellName => contains(&item.wr_name, term),
            FilterType::Name => contains(&item.name, term),
            FilterType::Executor => contains(&item.executor, term),
            FilterType::Condition => contains(&item.condition_state, term),
            FilterType::Unknown => true,
        }
    }
}

// -----------------------------------------------------------------------------
// FILTER
// -----------------------------------------------------------------------------
/// Items matching `filters`, in batch order.
///
/// A blank search (empty, whitespace or byte order marks only) selects the
/// whole batch. The
/// term itself is not trimmed before matching: " bolt" only matches fields
/// that contain the leading space.
pub fn filter_items<'a>(items: &'a [Item], filters: &FilterOptions) -> Vec<&'a Item> {
    if is_blank(&filters.search) {
        return items.iter().collect();
    }

    let term = filters.search.to_lowercase();
    items
        .iter()
        .filter(|item| filters.filter_type.matches(item, &term))
        .collect()
}

fn is_blank(search: &str) -> bool {
    search
        .trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
        .is_empty()
}
