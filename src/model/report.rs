use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Free-text end-of-day report, one per employee per date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = "john.doe@company.com")]
    pub email: String,
    #[schema(example = "2025-07-14", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Closed three follow-ups, updated the pipeline sheet")]
    pub content: String,
}
