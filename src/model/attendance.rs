use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::employee::Employee;

/// One check-in/out event. Status is kept as the caller sent it ("IN"/"OUT" by convention).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 7,
        "employee": {
            "id": 1,
            "name": "Bob",
            "email": "bob@company.com",
            "department": "Engineering"
        },
        "timestamp": "2026-01-05T08:59:12.204511Z",
        "status": "IN"
    })
)]
pub struct Attendance {
    #[schema(example = 7)]
    pub id: u64,

    pub employee: Employee,

    #[schema(value_type = String, format = DateTime)]
    pub timestamp: DateTime<Utc>,

    #[schema(example = "IN")]
    pub status: String,
}

/// Flat row shape of `attendance JOIN employees`.
#[derive(Debug, sqlx::FromRow)]
pub struct AttendanceRow {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub status: String,
    pub employee_id: u64,
    pub employee_name: String,
    pub employee_email: String,
    pub employee_department: String,
}

impl From<AttendanceRow> for Attendance {
    fn from(row: AttendanceRow) -> Self {
        Attendance {
            id: row.id,
            employee: Employee {
                id: row.employee_id,
                name: row.employee_name,
                email: row.employee_email,
                department: row.employee_department,
            },
            timestamp: row.timestamp,
            status: row.status,
        }
    }
}
