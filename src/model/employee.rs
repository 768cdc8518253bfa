use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Bob",
        "email": "bob@company.com",
        "department": "Engineering"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Bob")]
    pub name: String,

    #[schema(example = "bob@company.com")]
    pub email: String,

    #[schema(example = "Engineering")]
    pub department: String,
}

/// Fields supplied when registering an employee; the id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub department: String,
}
