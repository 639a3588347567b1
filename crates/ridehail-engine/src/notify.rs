//! Post-commit, best-effort notifications.
//!
//! Transitions never wait on notification delivery. After a commit the engine
//! hands each [`NewNotification`] to a [`Notifier`], which enqueues it on a
//! bounded channel without blocking (a full queue drops the message). A
//! [`NotificationQueue`] task drains the channel into a [`NotificationSink`]
//! and logs sink failures instead of propagating them.

use std::future::Future;

use ridehail_db::{DbError, NotificationStore};
use ridehail_types::{NewNotification, NotificationId, NotificationType, Ride, RideBilling};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

/// Somewhere notifications are recorded.
pub trait NotificationSink: Send + Sync + 'static {
    /// Failure type; only ever logged.
    type Error: core::fmt::Display + Send;

    /// Record one notification and return its id.
    fn record(
        &self,
        notification: &NewNotification,
    ) -> impl Future<Output = Result<NotificationId, Self::Error>> + Send;
}

impl NotificationSink for NotificationStore {
    type Error = DbError;

    fn record(
        &self,
        notification: &NewNotification,
    ) -> impl Future<Output = Result<NotificationId, Self::Error>> + Send {
        self.insert(notification)
    }
}

/// Producer handle held by the engine. Cloning shares the queue.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::Sender<NewNotification>,
}

impl Notifier {
    /// Create a notifier and the queue that drains it.
    ///
    /// A zero capacity is raised to one.
    pub fn channel(capacity: usize) -> (Self, NotificationQueue) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, NotificationQueue { rx })
    }

    /// A notifier whose messages go nowhere.
    pub fn disabled() -> Self {
        Self::channel(1).0
    }

    /// Enqueue a notification without waiting.
    pub fn notify(&self, notification: NewNotification) {
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                tracing::warn!(
                    notification_type = dropped.notification_type.as_db_str(),
                    ride_id = ?dropped.ride_id,
                    "Notification queue full, dropping notification"
                );
            }
            Err(TrySendError::Closed(dropped)) => {
                tracing::debug!(
                    notification_type = dropped.notification_type.as_db_str(),
                    "Notification queue closed, dropping notification"
                );
            }
        }
    }

    /// Enqueue every notification in `batch`.
    pub fn notify_all(&self, batch: impl IntoIterator<Item = NewNotification>) {
        for notification in batch {
            self.notify(notification);
        }
    }
}

/// Consumer side of a [`Notifier`].
#[derive(Debug)]
pub struct NotificationQueue {
    rx: mpsc::Receiver<NewNotification>,
}

impl NotificationQueue {
    /// Record queued notifications into `sink` until every [`Notifier`] is
    /// dropped. Sink failures are logged and skipped.
    pub async fn run<S: NotificationSink>(mut self, sink: S) {
        while let Some(notification) = self.rx.recv().await {
            match sink.record(&notification).await {
                Ok(id) => {
                    tracing::debug!(
                        notification_id = %id,
                        notification_type = notification.notification_type.as_db_str(),
                        "Notification recorded"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        notification_type = notification.notification_type.as_db_str(),
                        ride_id = ?notification.ride_id,
                        "Failed to record notification"
                    );
                }
            }
        }
        tracing::debug!("Notification queue drained");
    }

    /// Spawn [`run`](Self::run) on the current runtime.
    pub fn spawn<S: NotificationSink>(self, sink: S) -> JoinHandle<()> {
        tokio::spawn(self.run(sink))
    }
}

// ---------------------------------------------------------------------------
// Message texts
// ---------------------------------------------------------------------------

/// Broadcast to dispatchers when a rider requests a ride.
pub fn new_ride_request(ride: &Ride, rider_phone: &str) -> NewNotification {
    NewNotification::about(
        ride.id,
        NotificationType::NewRideRequest,
        format!(
            "New ride request from {rider_phone}. Pickup: {}",
            ride.pickup.address
        ),
    )
}

/// Sent to the driver, then the rider, once a driver is assigned.
pub fn ride_assigned(ride: &Ride) -> Vec<NewNotification> {
    let mut batch = Vec::with_capacity(2);
    if let Some(driver_id) = ride.driver_id {
        batch.push(
            NewNotification::about(
                ride.id,
                NotificationType::RideAssigned,
                format!(
                    "You have been assigned a new ride. Pickup: {}",
                    ride.pickup.address
                ),
            )
            .to_driver(driver_id),
        );
    }
    batch.push(
        NewNotification::about(
            ride.id,
            NotificationType::RideUpdate,
            "A driver has been assigned to your ride request.".to_owned(),
        )
        .to_rider(ride.rider_id),
    );
    batch
}

/// Sent to the rider when the driver starts the ride.
pub fn ride_started(ride: &Ride) -> NewNotification {
    NewNotification::about(
        ride.id,
        NotificationType::RideStarted,
        "Your ride has started. Driver is on the way.".to_owned(),
    )
    .to_rider(ride.rider_id)
}

/// Sent to the rider and the assigning dispatcher when the ride completes.
pub fn ride_completed(ride: &Ride, billing: &RideBilling) -> Vec<NewNotification> {
    let total = billing.fare.total_fare.normalize();
    let mut batch = vec![
        NewNotification::about(
            ride.id,
            NotificationType::RideCompleted,
            format!("Your ride has been completed. Total fare: ₹{total}"),
        )
        .to_rider(ride.rider_id),
    ];
    if let Some(dispatcher_id) = ride.dispatcher_id {
        batch.push(
            NewNotification::about(
                ride.id,
                NotificationType::RideCompleted,
                format!(
                    "Ride completed. Duration: {} minutes. Fare: ₹{total}",
                    billing.duration_minutes
                ),
            )
            .to_dispatcher(dispatcher_id),
        );
    }
    batch
}
