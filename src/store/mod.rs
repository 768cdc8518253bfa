//! Repository abstractions over the three record kinds.
//!
//! Handlers only see these traits; the concrete backend (MySQL or in-memory) is chosen at
//! startup and injected as `web::Data<Stores>`.

pub mod memory;
pub mod mysql;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::StoreError,
    model::{
        attendance::Attendance,
        employee::{Employee, NewEmployee},
        user::{NewUser, User},
    },
};

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn create(&self, employee: NewEmployee) -> Result<Employee, StoreError>;
    async fn find_by_id(&self, id: u64) -> Result<Option<Employee>, StoreError>;
    async fn list(&self) -> Result<Vec<Employee>, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the username is already present.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn usernames(&self) -> Result<Vec<String>, StoreError>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn create(
        &self,
        employee: &Employee,
        timestamp: DateTime<Utc>,
        status: &str,
    ) -> Result<Attendance, StoreError>;

    /// All records, most recent first (ties broken by id, newest first).
    async fn list_recent_first(&self) -> Result<Vec<Attendance>, StoreError>;
}

/// The set of stores handed to the request handlers.
#[derive(Clone)]
pub struct Stores {
    pub employees: Arc<dyn EmployeeStore>,
    pub users: Arc<dyn UserStore>,
    pub attendance: Arc<dyn AttendanceStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Stores {
            employees: Arc::new(memory::MemoryEmployeeStore::default()),
            users: Arc::new(memory::MemoryUserStore::default()),
            attendance: Arc::new(memory::MemoryAttendanceStore::default()),
        }
    }

    pub fn mysql(pool: sqlx::MySqlPool) -> Self {
        Stores {
            employees: Arc::new(mysql::MySqlEmployeeStore::new(pool.clone())),
            users: Arc::new(mysql::MySqlUserStore::new(pool.clone())),
            attendance: Arc::new(mysql::MySqlAttendanceStore::new(pool)),
        }
    }
}
