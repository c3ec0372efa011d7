// =============================================================================
// GRID MODULE
// =============================================================================
// Sorting and pagination of the filtered view, the way the dashboard grid
// shows it: one sort column, one direction, 1-indexed pages.
// =============================================================================

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::Item;

/// Largest page size the grid offers.
pub const MAX_PER_PAGE: i64 = 200;

// -----------------------------------------------------------------------------
// SORT OPTIONS
// -----------------------------------------------------------------------------
/// Sortable grid column. Names match the `Item` JSON field names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    #[serde(rename = "id")]
    Id,
    #[default]
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "article")]
    Article,
    #[serde(rename = "shk")]
    Shk,
    #[serde(rename = "quantity")]
    Quantity,
    #[serde(rename = "nested_quantity")]
    NestedQuantity,
    #[serde(rename = "product_qnt")]
    ProductQnt,
    #[serde(rename = "wr_shk")]
    WrShk,
    #[serde(rename = "wr_name")]
    WrName,
    #[serde(rename = "id_sklad")]
    IdSklad,
    #[serde(rename = "prunit_name")]
    PrunitName,
    #[serde(rename = "condition_state")]
    ConditionState,
    #[serde(rename = "reason")]
    Reason,
    #[serde(rename = "expiration_date")]
    ExpirationDate,
    #[serde(rename = "createDate")]
    CreateDate,
    #[serde(rename = "updateDate")]
    UpdateDate,
    #[serde(rename = "executor")]
    Executor,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortField {
    /// Ascending comparison of two items on this column.
    ///
    /// Absent optional values order before present ones.
    pub fn compare(self, a: &Item, b: &Item) -> Ordering {
        match self {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Name => a.name.cmp(&b.name),
            SortField::Article => a.article.cmp(&b.article),
            SortField::Shk => a.shk.cmp(&b.shk),
            SortField::Quantity => a.quantity.cmp(&b.quantity),
            SortField::NestedQuantity => a.nested_quantity.cmp(&b.nested_quantity),
            SortField::ProductQnt => a.product_qnt.cmp(&b.product_qnt),
            SortField::WrShk => a.wr_shk.cmp(&b.wr_shk),
            SortField::WrName => a.wr_name.cmp(&b.wr_name),
            SortField::IdSklad => a.id_sklad.cmp(&b.id_sklad),
            SortField::PrunitName => a.prunit_name.cmp(&b.prunit_name),
            SortField::ConditionState => a.condition_state.cmp(&b.condition_state),
            SortField::Reason => a.reason.cmp(&b.reason),
            SortField::ExpirationDate => a.expiration_date.cmp(&b.expiration_date),
            SortField::CreateDate => a.create_date.cmp(&b.create_date),
            SortField::UpdateDate => a.update_date.cmp(&b.update_date),
            SortField::Executor => a.executor.cmp(&b.executor),
        }
    }
}

/// Sort the view in place. Stable: equal rows keep their filtered order.
pub fn sort_items(items: &mut [&Item], field: SortField, direction: SortDirection) {
    items.sort_by(|a, b| {
        let ordering = field.compare(a, b);
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

// -----------------------------------------------------------------------------
// PAGINATION
// -----------------------------------------------------------------------------
/// Validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-indexed
    pub page: i64,
    pub per_page: i64,
}

impl Page {
    /// Clamp raw query values: page >= 1, per_page in 1..=MAX_PER_PAGE.
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// The rows of `items` on this page. Past the end: empty.
    pub fn slice<'v, 'a>(&self, items: &'v [&'a Item]) -> &'v [&'a Item] {
        let per_page = self.per_page as usize;
        let start = ((self.page - 1) as usize).saturating_mul(per_page);
        if start >= items.len() {
            return &[];
        }
        let end = start.saturating_add(per_page).min(items.len());
        &items[start..end]
    }
}
