use crate::model::{attendance::Attendance, employee::Employee};
use crate::models::{
    CreateEmployee, EmployeeCreatedResponse, LogAttendanceReq, LoginReqDto, LoginResponse,
    MessageResponse, SignupReqDto,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Tracker API",
        version = "0.1.0",
        description = r#"
## Employee Attendance Tracker

Employees check in and out, records are stored, and every new record is pushed to
connected viewers in real time.

### 🔹 Key Features
- **Auth**: signup and login with a role flag (`USER` by default)
- **Employees**: add and list employees
- **Attendance**: log check-in/out events and view them newest first

### 📡 Live feed
Connect a WebSocket to `/ws/attendance`. Each newly logged attendance record arrives as one
JSON text frame, including the nested employee. Events are not replayed to late subscribers.

### 📦 Response Format
Failures are `400 {"success": false, "message": "..."}`.
"#,
    ),
    paths(
        crate::api::auth::handle_login,
        crate::api::auth::handle_signup,

        crate::api::employee::handle_add,
        crate::api::employee::handle_list,

        crate::api::attendance::handle_log,
        crate::api::attendance::handle_view
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            SignupReqDto,
            MessageResponse,
            CreateEmployee,
            EmployeeCreatedResponse,
            Employee,
            LogAttendanceReq,
            Attendance
        )
    ),
    tags(
        (name = "Auth", description = "Signup and login"),
        (name = "Employee", description = "Employee roster"),
        (name = "Attendance", description = "Attendance log"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_rest_endpoint() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/api/login",
            "/api/signup",
            "/api/employee/add",
            "/api/employee/list",
            "/api/attendance/log",
            "/api/attendance/view",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }
}
