use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;
use tracing::debug;

use super::{AttendanceStore, EmployeeStore, UserStore};
use crate::{
    error::StoreError,
    model::{
        attendance::{Attendance, AttendanceRow},
        employee::{Employee, NewEmployee},
        user::{NewUser, User},
    },
};

pub struct MySqlEmployeeStore {
    pool: MySqlPool,
}

impl MySqlEmployeeStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeStore for MySqlEmployeeStore {
    async fn create(&self, employee: NewEmployee) -> Result<Employee, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees (name, email, department)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.department)
        .execute(&self.pool)
        .await?;

        Ok(Employee {
            id: result.last_insert_id(),
            name: employee.name,
            email: employee.email,
            department: employee.department,
        })
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<Employee>, StoreError> {
        let employee = sqlx::query_as::<_, Employee>(
            "SELECT id, name, email, department FROM employees WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }

    async fn list(&self) -> Result<Vec<Employee>, StoreError> {
        let employees =
            sqlx::query_as::<_, Employee>("SELECT id, name, email, department FROM employees")
                .fetch_all(&self.pool)
                .await?;
        Ok(employees)
    }
}

pub struct MySqlUserStore {
    pool: MySqlPool,
}

impl MySqlUserStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for MySqlUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        // the UNIQUE key on username turns a lost signup race into StoreError::Duplicate
        let result = sqlx::query(r#"INSERT INTO users (username, password, role) VALUES (?, ?, ?)"#)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.role)
            .execute(&self.pool)
            .await?;

        Ok(User {
            id: result.last_insert_id(),
            username: user.username,
            password: user.password_hash,
            role: user.role,
        })
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, role
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn usernames(&self) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query_as::<_, (String,)>("SELECT username FROM users")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(username,)| username).collect())
    }
}

pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn create(
        &self,
        employee: &Employee,
        timestamp: DateTime<Utc>,
        status: &str,
    ) -> Result<Attendance, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, timestamp, status)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(employee.id)
        .bind(timestamp)
        .bind(status)
        .execute(&self.pool)
        .await?;

        Ok(Attendance {
            id: result.last_insert_id(),
            employee: employee.clone(),
            timestamp,
            status: status.to_string(),
        })
    }

    async fn list_recent_first(&self) -> Result<Vec<Attendance>, StoreError> {
        let sql = r#"
            SELECT
                a.id,
                a.timestamp,
                a.status,
                e.id AS employee_id,
                e.name AS employee_name,
                e.email AS employee_email,
                e.department AS employee_department
            FROM attendance a
            JOIN employees e ON e.id = a.employee_id
            ORDER BY a.timestamp DESC, a.id DESC
        "#;
        debug!(sql = %sql, "Fetching attendance");

        let rows = sqlx::query_as::<_, AttendanceRow>(sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Attendance::from).collect())
    }
}
