//! Persistence for notifications.
//!
//! Notifications are written after a transition commits, on their own pool
//! connection, and are never read back by the transition engine.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use ridehail_types::{
    DispatcherId, DriverId, NewNotification, Notification, NotificationId, NotificationType,
    Page, RideId, RiderId,
};

use crate::error::DbError;
use crate::ride_store::PageRequest;

/// Notification table access.
///
/// Owns a pool handle so it can be moved into the background dispatcher task.
#[derive(Clone)]
pub struct NotificationStore {
    pool: PgPool,
}

impl NotificationStore {
    /// Create a new notification store on `pool`.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a notification and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn insert(&self, notification: &NewNotification) -> Result<NotificationId, DbError> {
        let id: Uuid = sqlx::query_scalar(
            r"INSERT INTO notifications (ride_id, user_id, driver_id, dispatcher_id, type, message)
              VALUES ($1, $2, $3, $4, $5::notification_type, $6)
              RETURNING id",
        )
        .bind(notification.ride_id.map(RideId::into_inner))
        .bind(notification.rider_id.map(RiderId::into_inner))
        .bind(notification.driver_id.map(DriverId::into_inner))
        .bind(notification.dispatcher_id.map(DispatcherId::into_inner))
        .bind(notification.notification_type.as_db_str())
        .bind(&notification.message)
        .fetch_one(&self.pool)
        .await?;

        Ok(NotificationId(id))
    }

    /// Notifications addressed to a rider, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::Corrupt`] if a row carries an unknown type tag.
    pub async fn list_for_rider(
        &self,
        rider_id: RiderId,
        page: PageRequest,
    ) -> Result<Page<Notification>, DbError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r"SELECT id, ride_id, user_id, driver_id, dispatcher_id,
                     type::TEXT AS notification_type, message, is_read, created_at
              FROM notifications
              WHERE user_id = $1
              ORDER BY created_at DESC
              LIMIT $2 OFFSET $3",
        )
        .bind(rider_id.into_inner())
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
            .bind(rider_id.into_inner())
            .fetch_one(&self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(NotificationRow::into_notification)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total,
            limit: page.limit,
            offset: page.offset,
        })
    }
}

/// A row from the `notifications` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    ride_id: Option<Uuid>,
    user_id: Option<Uuid>,
    driver_id: Option<Uuid>,
    dispatcher_id: Option<Uuid>,
    notification_type: String,
    message: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl NotificationRow {
    fn into_notification(self) -> Result<Notification, DbError> {
        let notification_type = NotificationType::from_db_str(&self.notification_type)
            .ok_or_else(|| {
                DbError::Corrupt(format!(
                    "unknown notification type '{}'",
                    self.notification_type
                ))
            })?;

        Ok(Notification {
            id: NotificationId(self.id),
            ride_id: self.ride_id.map(RideId),
            rider_id: self.user_id.map(RiderId),
            driver_id: self.driver_id.map(DriverId),
            dispatcher_id: self.dispatcher_id.map(DispatcherId),
            notification_type,
            message: self.message,
            is_read: self.is_read,
            created_at: self.created_at,
        })
    }
}
