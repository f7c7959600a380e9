//! Request bodies for the dropdown endpoints.

use serde::Deserialize;
use utoipa::ToSchema;

/// Body of `POST /dropdowns/{key}` and `DELETE /dropdowns/{key}`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DropdownValueRequest {
    /// The value to add or remove.
    #[serde(default)]
    pub value: Option<String>,
}

/// Body of `PUT /dropdowns/{key}/reorder`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReorderRequest {
    /// Every value in its new display order.
    #[serde(default)]
    pub values: Option<Vec<String>>,
}
