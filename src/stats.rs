// =============================================================================
// STATS MODULE
// =============================================================================
// Summary numbers shown above the grid for the current filtered view.
// =============================================================================

use std::collections::BTreeSet;

use serde::Serialize;

use crate::format::format_number;
use crate::models::Item;

/// Lower-cased `condition_state` marker for defective stock.
pub const DEFECTIVE_MARKER: &str = "некондиц";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemStats {
    /// Items in the whole batch
    pub total_items: usize,
    /// Items left after filtering
    pub visible_items: usize,
    pub filter_active: bool,
    /// Share of the batch that is visible, 0..=100
    pub filter_percentage: f64,
    /// Sum of `product_qnt` over visible items
    pub total_quantity: i64,
    pub defective_items: usize,
    /// Share of visible items that are defective, 0..=100
    pub defective_percentage: f64,
    /// Distinct warehouse ids among visible items, ascending
    pub warehouses: Vec<i64>,
    /// Distinct non-empty executors, first-seen order
    pub executors: Vec<String>,
    pub labels: StatsLabels,
}

/// Ready-to-show strings for the stats panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsLabels {
    pub records: String,
    /// "из N" when a filter hides part of the batch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_of: Option<String>,
    pub total_quantity: String,
    pub defective_percentage: String,
}

pub fn is_defective(item: &Item) -> bool {
    item.condition_state.to_lowercase().contains(DEFECTIVE_MARKER)
}

/// Compute stats for `visible`, a filtered view of `all`.
pub fn compute_stats(all: &[Item], visible: &[&Item]) -> ItemStats {
    let total_items = all.len();
    let visible_items = visible.len();

    // Counters come straight from upstream and may be huge; clamp, never wrap.
    let total_quantity = visible
        .iter()
        .fold(0i64, |acc, item| acc.saturating_add(item.product_qnt));
    let defective_items = visible.iter().filter(|item| is_defective(item)).count();

    let warehouses: BTreeSet<i64> = visible.iter().filter_map(|item| item.id_sklad).collect();

    let mut executors: Vec<String> = Vec::new();
    for item in visible {
        if !item.executor.is_empty() && !executors.contains(&item.executor) {
            executors.push(item.executor.clone());
        }
    }

    let filter_active = total_items != visible_items;
    let defective_percentage = percentage(defective_items, visible_items).unwrap_or(0.0);

    let labels = StatsLabels {
        records: format_number(visible_items as i64),
        records_of: filter_active.then(|| format!("из {}", format_number(total_items as i64))),
        total_quantity: format_number(total_quantity),
        defective_percentage: format!("{defective_percentage:.1}%"),
    };

    ItemStats {
        total_items,
        visible_items,
        filter_active,
        filter_percentage: percentage(visible_items, total_items).unwrap_or(100.0),
        total_quantity,
        defective_items,
        defective_percentage,
        warehouses: warehouses.into_iter().collect(),
        executors,
        labels,
    }
}

fn percentage(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64 * 100.0)
}
