//! Shared DTO types used across multiple endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Acknowledgement body for operations that return no resource.
///
/// ```json
/// { "success": true }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    /// Always `true`; failures use the error body instead.
    pub success: bool,
}

impl SuccessResponse {
    /// The `{"success": true}` body.
    pub const OK: Self = Self { success: true };
}
