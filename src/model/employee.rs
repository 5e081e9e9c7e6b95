use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

/// Identity attributes the attendance core reads from the employee directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "John Doe",
        "email": "john.doe@company.com",
        "department": "Sales",
        "role": "employee",
        "is_active": true
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "John Doe")]
    pub name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    /// Empty for admins.
    #[schema(example = "Sales")]
    pub department: String,

    #[schema(example = "employee", value_type = String)]
    pub role: Role,

    pub is_active: bool,
}
