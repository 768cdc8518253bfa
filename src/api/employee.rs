use actix_web::{HttpResponse, web};
use tracing::info;

use crate::{
    error::ApiError,
    model::employee::{Employee, NewEmployee},
    models::{CreateEmployee, EmployeeCreatedResponse},
    store::Stores,
};

pub async fn add_employee(stores: &Stores, employee: NewEmployee) -> Result<Employee, ApiError> {
    Ok(stores.employees.create(employee).await?)
}

pub async fn list_employees(stores: &Stores) -> Result<Vec<Employee>, ApiError> {
    Ok(stores.employees.list().await?)
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employee/add",
    request_body = CreateEmployee,
    responses(
        (status = 200, description = "Employee created successfully", body = EmployeeCreatedResponse),
        (status = 500, description = "Internal server error", body = Object, example = json!({
            "success": false,
            "message": "Internal Server Error"
        }))
    ),
    tag = "Employee"
)]
pub async fn handle_add(
    stores: web::Data<Stores>,
    payload: web::Json<CreateEmployee>,
) -> Result<HttpResponse, ApiError> {
    let CreateEmployee {
        name,
        email,
        department,
    } = payload.into_inner();

    let employee = add_employee(
        stores.get_ref(),
        NewEmployee {
            name,
            email,
            department,
        },
    )
    .await?;

    info!(employee_id = employee.id, "Employee added");

    Ok(HttpResponse::Ok().json(EmployeeCreatedResponse {
        success: true,
        message: "Employee added successfully".to_string(),
        employee,
    }))
}

#[utoipa::path(
    get,
    path = "/api/employee/list",
    responses(
        (status = 200, description = "All employees", body = [Employee]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn handle_list(stores: web::Data<Stores>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(list_employees(stores.get_ref()).await?))
}
