use actix_web::{HttpResponse, web};
use chrono::{SubsecRound, Utc};
use tracing::{debug, info};

use crate::{
    broadcast::{Broadcaster, Channel, LiveEvent},
    error::ApiError,
    model::attendance::Attendance,
    models::{LogAttendanceReq, MessageResponse},
    store::Stores,
};

/// Persists a check-in/out for an existing employee and pushes it to the live feed.
///
/// The record is stored first; publishing is best-effort and never fails the call.
pub async fn log_attendance(
    stores: &Stores,
    broadcaster: &Broadcaster,
    employee_id: u64,
    status: &str,
) -> Result<Attendance, ApiError> {
    let employee = stores
        .employees
        .find_by_id(employee_id)
        .await?
        .ok_or_else(|| {
            info!(employee_id, "Attendance rejected: employee not found");
            ApiError::employee_not_found()
        })?;

    // DATETIME(6) keeps microseconds, so the broadcast copy must not carry more
    let timestamp = Utc::now().trunc_subsecs(6);
    let record = stores
        .attendance
        .create(&employee, timestamp, status)
        .await?;

    let receivers = broadcaster.publish(
        Channel::AttendanceUpdates,
        LiveEvent::Attendance(record.clone()),
    );
    debug!(attendance_id = record.id, receivers, "Attendance broadcast");

    Ok(record)
}

/// Every record, most recent first.
pub async fn list_attendance(stores: &Stores) -> Result<Vec<Attendance>, ApiError> {
    Ok(stores.attendance.list_recent_first().await?)
}

/// Log attendance
#[utoipa::path(
    post,
    path = "/api/attendance/log",
    request_body = LogAttendanceReq,
    responses(
        (status = 200, description = "Attendance logged", body = MessageResponse, example = json!({
            "success": true,
            "message": "Attendance logged successfully"
        })),
        (status = 400, description = "Employee not found", body = MessageResponse, example = json!({
            "success": false,
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn handle_log(
    stores: web::Data<Stores>,
    broadcaster: web::Data<Broadcaster>,
    payload: web::Json<LogAttendanceReq>,
) -> Result<HttpResponse, ApiError> {
    let record = log_attendance(
        stores.get_ref(),
        broadcaster.get_ref(),
        payload.employee_id,
        &payload.status,
    )
    .await?;

    info!(
        attendance_id = record.id,
        employee_id = record.employee.id,
        status = %record.status,
        "Attendance logged"
    );

    Ok(HttpResponse::Ok().json(MessageResponse::ok("Attendance logged successfully")))
}

/// View attendance, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/view",
    responses(
        (status = 200, description = "All attendance records, newest first", body = [Attendance]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn handle_view(stores: web::Data<Stores>) -> Result<HttpResponse, ApiError> {
    let records = list_attendance(stores.get_ref()).await?;
    Ok(HttpResponse::Ok().json(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::NewEmployee;

    async fn with_bob() -> Stores {
        let stores = Stores::in_memory();
        stores
            .employees
            .create(NewEmployee {
                name: "Bob".into(),
                email: "bob@x.com".into(),
                department: "Eng".into(),
            })
            .await
            .unwrap();
        stores
    }

    #[tokio::test]
    async fn logged_record_heads_the_list_and_is_broadcast() {
        let stores = with_bob().await;
        let broadcaster = Broadcaster::new(8);
        let mut feed = broadcaster.subscribe(Channel::AttendanceUpdates);

        let before = Utc::now().trunc_subsecs(6);
        let record = log_attendance(&stores, &broadcaster, 1, "IN").await.unwrap();

        assert!(record.timestamp >= before);
        assert_eq!(record.employee.name, "Bob");

        let list = list_attendance(&stores).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0], record);

        let LiveEvent::Attendance(pushed) = feed.next_event().await.unwrap();
        assert_eq!(pushed, record);
        assert_eq!(pushed.status, "IN");
    }

    #[tokio::test]
    async fn timestamp_has_microsecond_precision() {
        let stores = with_bob().await;
        let broadcaster = Broadcaster::new(8);
        let mut feed = broadcaster.subscribe(Channel::AttendanceUpdates);

        let record = log_attendance(&stores, &broadcaster, 1, "IN").await.unwrap();
        assert_eq!(record.timestamp.timestamp_subsec_nanos() % 1_000, 0);

        let LiveEvent::Attendance(pushed) = feed.next_event().await.unwrap();
        assert_eq!(pushed.timestamp, record.timestamp);
    }

    #[tokio::test]
    async fn unknown_employee_persists_nothing() {
        let stores = with_bob().await;
        let broadcaster = Broadcaster::new(8);

        let err = log_attendance(&stores, &broadcaster, 99, "IN")
            .await
            .unwrap_err();

        assert_eq!(err, ApiError::NotFound("Employee not found".into()));
        assert!(list_attendance(&stores).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn status_is_stored_as_given() {
        let stores = with_bob().await;
        let broadcaster = Broadcaster::new(8);

        let record = log_attendance(&stores, &broadcaster, 1, "lunch")
            .await
            .unwrap();
        assert_eq!(record.status, "lunch");
    }

    #[tokio::test]
    async fn list_is_non_increasing_by_timestamp() {
        let stores = with_bob().await;
        let broadcaster = Broadcaster::new(8);

        for status in ["IN", "OUT", "IN", "OUT"] {
            log_attendance(&stores, &broadcaster, 1, status).await.unwrap();
        }

        let list = list_attendance(&stores).await.unwrap();
        assert_eq!(list.len(), 4);
        assert!(list.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        assert_eq!(list[0].id, 4);
    }
}
