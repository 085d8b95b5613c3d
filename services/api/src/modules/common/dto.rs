use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

/// Page/limit query params shared by every list endpoint. `limit` is clamped
/// to 100 regardless of what the caller asks for (§6).
#[derive(Deserialize, Validate, IntoParams, Clone, Copy)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: u64,

    #[serde(default = "default_limit")]
    #[validate(range(min = 1))]
    pub limit: u64,
}

impl Pagination {
    pub fn limit(&self) -> u64 {
        self.limit.min(100)
    }

    pub fn offset(&self) -> u64 {
        (self.page.max(1) - 1) * self.limit()
    }

    pub fn meta(&self, total: u64) -> PaginationMeta {
        PaginationMeta {
            page: self.page.max(1),
            limit: self.limit(),
            total,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginationMeta {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
}
