use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{AttendanceStore, EmployeeStore, UserStore};
use crate::{
    error::StoreError,
    model::{
        attendance::Attendance,
        employee::{Employee, NewEmployee},
        user::{NewUser, User},
    },
};

/// Rows plus the next id to hand out. Ids start at 1.
struct Table<T> {
    rows: Vec<T>,
    next_id: u64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Table {
            rows: Vec::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn lock<T>(m: &Mutex<Table<T>>) -> MutexGuard<'_, Table<T>> {
    // a panic mid-insert leaves the table usable; rows are only ever pushed
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
pub struct MemoryEmployeeStore {
    table: Mutex<Table<Employee>>,
}

#[async_trait]
impl EmployeeStore for MemoryEmployeeStore {
    async fn create(&self, employee: NewEmployee) -> Result<Employee, StoreError> {
        let mut table = lock(&self.table);
        let employee = Employee {
            id: table.allocate_id(),
            name: employee.name,
            email: employee.email,
            department: employee.department,
        };
        table.rows.push(employee.clone());
        Ok(employee)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<Employee>, StoreError> {
        Ok(lock(&self.table).rows.iter().find(|e| e.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Employee>, StoreError> {
        Ok(lock(&self.table).rows.clone())
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    table: Mutex<Table<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut table = lock(&self.table);
        if table.rows.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate);
        }
        let user = User {
            id: table.allocate_id(),
            username: user.username,
            password: user.password_hash,
            role: user.role,
        };
        table.rows.push(user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(lock(&self.table)
            .rows
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn usernames(&self) -> Result<Vec<String>, StoreError> {
        Ok(lock(&self.table)
            .rows
            .iter()
            .map(|u| u.username.clone())
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryAttendanceStore {
    table: Mutex<Table<Attendance>>,
}

#[async_trait]
impl AttendanceStore for MemoryAttendanceStore {
    async fn create(
        &self,
        employee: &Employee,
        timestamp: DateTime<Utc>,
        status: &str,
    ) -> Result<Attendance, StoreError> {
        let mut table = lock(&self.table);
        let record = Attendance {
            id: table.allocate_id(),
            employee: employee.clone(),
            timestamp,
            status: status.to_string(),
        };
        table.rows.push(record.clone());
        Ok(record)
    }

    async fn list_recent_first(&self) -> Result<Vec<Attendance>, StoreError> {
        let mut records = lock(&self.table).rows.clone();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(records)
    }
}
