// =============================================================================
// MODELS MODULE
// =============================================================================
// Data structures shared by the pipeline and the HTTP layer.
//
// LEARNING NOTES:
// - `Item` is the canonical, fully-populated record. Only `normalize` builds
//   it from upstream data, so nothing downstream has to null-check fields.
// - Request/response structs are kept apart from `Item` so the API shape can
//   change without touching the pipeline.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::filter::FilterType;
use crate::grid::{SortDirection, SortField};

/// Warehouse whose batch is served when the request doesn't name one.
pub const DEFAULT_WAREHOUSE: i64 = 1383;

/// Expiration date value meaning "this item has no expiration date".
pub const NO_EXPIRATION_SENTINEL: &str = "2999-01-01";

// =============================================================================
// STORAGE ITEM
// =============================================================================
/// One warehouse inventory record as shown in the grid.
///
/// Immutable once built: each fetch cycle produces a fresh batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Row key in the grid
    pub id: Option<i64>,

    pub name: String,
    pub article: String,
    /// Barcode
    pub shk: String,

    /// Number of nesting units (derived)
    pub quantity: i64,
    /// Items per nesting unit (derived)
    pub nested_quantity: i64,
    /// Total item count (derived)
    pub product_qnt: i64,

    /// Storage cell code
    pub wr_shk: String,
    /// Storage cell name
    pub wr_name: String,
    /// Warehouse id
    pub id_sklad: Option<i64>,

    /// Unit of measure label
    pub prunit_name: String,
    /// Free-text condition, "некондиция" marks defective stock
    pub condition_state: String,
    pub reason: String,

    /// ISO date; `NO_EXPIRATION_SENTINEL` means no expiration
    pub expiration_date: Option<String>,

    #[serde(rename = "createDate")]
    pub create_date: String,
    #[serde(rename = "updateDate")]
    pub update_date: String,

    /// Last user who touched the record
    pub executor: String,
}

// =============================================================================
// FILTER OPTIONS
// =============================================================================
/// Search box state: free-text term, the field scope it applies to, and the
/// warehouse whose batch is being looked at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    #[serde(default)]
    pub search: String,

    #[serde(default)]
    pub filter_type: FilterType,

    #[serde(default = "default_warehouse")]
    pub warehouse: i64,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            search: String::new(),
            filter_type: FilterType::All,
            warehouse: DEFAULT_WAREHOUSE,
        }
    }
}

fn default_warehouse() -> i64 {
    DEFAULT_WAREHOUSE
}

// =============================================================================
// API REQUEST STRUCTURES
// =============================================================================

// -----------------------------------------------------------------------------
// GRID QUERY
// -----------------------------------------------------------------------------
/// Query parameters for the grid, stats and export endpoints.
///
/// # Example
/// GET /api/v1/items?search=болт&filter_type=name&page=2&per_page=50&sort=wr_shk&direction=desc
#[derive(Debug, Clone, Deserialize)]
pub struct ItemsQuery {
    /// Search term (empty or whitespace: no filtering)
    #[serde(default)]
    pub search: String,

    /// Field scope; unknown values disable filtering
    #[serde(default)]
    pub filter_type: FilterType,

    /// Warehouse id (default: 1383)
    pub warehouse: Option<i64>,

    /// Page number (1-indexed, default: 1)
    #[serde(default = "default_page")]
    pub page: i64,

    /// Items per page (default: 20, max: 200)
    #[serde(default = "default_per_page")]
    pub per_page: i64,

    /// Sort column (default: name)
    #[serde(default)]
    pub sort: SortField,

    /// Sort direction (default: asc)
    #[serde(default)]
    pub direction: SortDirection,
}

impl ItemsQuery {
    /// The filter part of the query, with the warehouse resolved.
    pub fn filter_options(&self, default_warehouse: i64) -> FilterOptions {
        FilterOptions {
            search: self.search.clone(),
            filter_type: self.filter_type,
            warehouse: self.warehouse.unwrap_or(default_warehouse),
        }
    }
}

fn default_page() -> i64 {
    1
}
fn default_per_page() -> i64 {
    20
}

/// Query parameters naming just a warehouse.
#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseQuery {
    pub warehouse: Option<i64>,
}

// =============================================================================
// API RESPONSE STRUCTURES
// =============================================================================

/// One page of the filtered, sorted grid.
#[derive(Debug, Clone, Serialize)]
pub struct ItemsPageResponse {
    pub items: Vec<Item>,

    /// Number of items after filtering (for pagination)
    pub total: usize,

    /// Number of items in the whole batch
    pub unfiltered_total: usize,

    pub page: i64,
    pub per_page: i64,
    pub warehouse: i64,
}

/// Result of a manual refresh.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    pub warehouse: i64,
    pub items: usize,
}

/// A filter scope and its display label, for the scope picker.
#[derive(Debug, Clone, Serialize)]
pub struct FilterTypeInfo {
    pub value: FilterType,
    pub label: &'static str,
}

// =============================================================================
// HEALTH CHECK RESPONSES
// =============================================================================

/// Simple health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Detailed readiness check response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
}

/// Individual dependency health checks
#[derive(Debug, Serialize)]
pub struct ReadinessChecks {
    pub storage_api: bool,
    pub redis: bool,
}

// =============================================================================
// ERROR RESPONSES
// =============================================================================

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type/code
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_serializes_with_grid_field_names() {
        let item = Item {
            id: Some(1),
            create_date: "2024-01-01".to_string(),
            ..Item::default()
        };
        let value = serde_json::to_value(&item).expect("serialize");
        assert_eq!(value["createDate"], "2024-01-01");
        assert_eq!(value["updateDate"], "");
        assert_eq!(value["nested_quantity"], 0);
        assert!(value["id_sklad"].is_null());
    }

    #[test]
    fn test_filter_options_defaults() {
        let options: FilterOptions = serde_json::from_value(json!({})).expect("deserialize");
        assert_eq!(options, FilterOptions::default());

        let options: FilterOptions =
            serde_json::from_value(json!({ "search": "x", "filterType": "cellName", "warehouse": 7 }))
                .expect("deserialize");
        assert_eq!(options.filter_type, FilterType::CellName);
        assert_eq!(options.warehouse, 7);
    }

    #[test]
    fn test_items_query_resolves_warehouse() {
        let query: ItemsQuery = serde_json::from_value(json!({ "search": "bolt" })).expect("query");
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, 20);
        assert_eq!(query.filter_options(42).warehouse, 42);
    }
}
