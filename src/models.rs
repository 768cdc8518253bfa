use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::model::employee::Employee;

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "pw1")]
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SignupReqDto {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "pw1")]
    pub password: String,
    /// Defaults to "USER" when omitted
    #[schema(example = "USER", nullable = true)]
    pub role: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "Bob")]
    pub name: String,
    #[schema(example = "bob@company.com")]
    pub email: String,
    #[schema(example = "Engineering")]
    pub department: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogAttendanceReq {
    /// Accepts a number or a numeric string
    #[serde(deserialize_with = "deserialize_id")]
    #[schema(example = 1, value_type = u64)]
    pub employee_id: u64,
    #[schema(example = "IN")]
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "USER")]
    pub role: String,
    #[schema(example = "alice")]
    pub username: String,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = true)]
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeCreatedResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "Employee added successfully")]
    pub message: String,
    pub employee: Employee,
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid employee id {s:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn employee_id_accepts_number_or_numeric_string() {
        let from_number: LogAttendanceReq =
            serde_json::from_value(json!({"employeeId": 3, "status": "IN"})).unwrap();
        let from_string: LogAttendanceReq =
            serde_json::from_value(json!({"employeeId": " 3", "status": "OUT"})).unwrap();

        assert_eq!(from_number.employee_id, 3);
        assert_eq!(from_string.employee_id, 3);
        assert_eq!(from_string.status, "OUT");
    }

    #[test]
    fn non_numeric_employee_id_is_rejected() {
        let parsed = serde_json::from_value::<LogAttendanceReq>(
            json!({"employeeId": "abc", "status": "IN"}),
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn signup_role_is_optional() {
        let req: SignupReqDto =
            serde_json::from_value(json!({"username": "alice", "password": "pw1"})).unwrap();
        assert!(req.role.is_none());
    }
}
