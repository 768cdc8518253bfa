use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use tracing::info;

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS employees (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        email VARCHAR(255) NOT NULL,
        department VARCHAR(255) NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        username VARCHAR(191) COLLATE utf8mb4_bin NOT NULL,
        password VARCHAR(255) NOT NULL,
        role VARCHAR(64) NOT NULL DEFAULT 'USER',
        UNIQUE KEY uq_users_username (username)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendance (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        employee_id BIGINT UNSIGNED NOT NULL,
        timestamp DATETIME(6) NOT NULL,
        status VARCHAR(32) NOT NULL,
        KEY idx_attendance_timestamp (timestamp),
        CONSTRAINT fk_attendance_employee FOREIGN KEY (employee_id) REFERENCES employees (id)
    )
    "#,
];

pub async fn init_db(database_url: &str, max_connections: u32) -> Result<MySqlPool, sqlx::Error> {
    let pool = MySqlPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    ensure_schema(&pool).await?;
    Ok(pool)
}

/// Creates the three tables when they are missing. Existing tables are left alone.
pub async fn ensure_schema(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    for ddl in SCHEMA {
        sqlx::query(ddl).execute(pool).await?;
    }
    info!("Database schema ready");
    Ok(())
}
