//! Timers that drive the booking flow.

use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle, time};
use tracing::{debug, warn};

use crate::{
    booking::{AttemptId, NoticeId, SubmitOutcome},
    config::AppConfig,
    storefront::Storefront,
};

/// Events emitted by the booking timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingEvent {
    /// The simulated confirmation delay for an attempt elapsed.
    Confirmed(AttemptId),
    /// The success notice window elapsed.
    NoticeExpired(NoticeId),
}

/// Fixed delays used by the booking flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingTimings {
    /// Delay between submission and confirmation.
    pub confirm_delay: Duration,
    /// How long the success notice stays visible.
    pub success_notice: Duration,
}

impl Default for BookingTimings {
    fn default() -> Self {
        Self {
            confirm_delay: Duration::from_millis(1000),
            success_notice: Duration::from_millis(5000),
        }
    }
}

impl From<&AppConfig> for BookingTimings {
    fn from(config: &AppConfig) -> Self {
        Self {
            confirm_delay: Duration::from_millis(config.confirm_delay_ms),
            success_notice: Duration::from_millis(config.success_notice_ms),
        }
    }
}

/// Schedules booking timers and applies their events to a storefront.
///
/// Timer tasks only send events; state changes happen on the caller's task
/// in [`BookingDriver::handle`]. Outstanding timers are aborted on drop.
pub struct BookingDriver {
    timings: BookingTimings,
    sender: mpsc::Sender<BookingEvent>,
    confirm_task: Option<JoinHandle<()>>,
    notice_task: Option<JoinHandle<()>>,
}

impl BookingDriver {
    /// Create a driver that delivers events to `sender`.
    pub fn new(timings: BookingTimings, sender: mpsc::Sender<BookingEvent>) -> Self {
        Self {
            timings,
            sender,
            confirm_task: None,
            notice_task: None,
        }
    }

    /// Create a driver together with the receiving end of its event channel.
    pub fn channel(timings: BookingTimings) -> (Self, mpsc::Receiver<BookingEvent>) {
        let (sender, receiver) = mpsc::channel(8);
        (Self::new(timings, sender), receiver)
    }

    /// Configured delays.
    pub fn timings(&self) -> BookingTimings {
        self.timings
    }

    /// Submit the storefront's cart and schedule the confirmation when it passes validation.
    pub fn submit(&mut self, store: &mut Storefront) -> SubmitOutcome {
        let outcome = store.submit_booking();
        if let SubmitOutcome::Pending(attempt) = outcome {
            self.schedule_confirmation(attempt);
        }
        outcome
    }

    /// Apply a timer event, scheduling the notice expiry after a confirmation.
    pub fn handle(&mut self, store: &mut Storefront, event: BookingEvent) {
        match event {
            BookingEvent::Confirmed(attempt) => {
                self.confirm_task = None;
                if let Some(notice) = store.confirm_booking(attempt) {
                    self.schedule_notice_expiry(notice);
                }
            }
            BookingEvent::NoticeExpired(notice) => {
                self.notice_task = None;
                store.expire_notice(notice);
            }
        }
    }

    /// Abort every outstanding timer.
    pub fn cancel_all(&mut self) {
        for task in [self.confirm_task.take(), self.notice_task.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }
    }

    fn schedule_confirmation(&mut self, attempt: AttemptId) {
        debug!(%attempt, delay_ms = self.timings.confirm_delay.as_millis() as u64, "Scheduling confirmation");
        let task = self.spawn_after(self.timings.confirm_delay, BookingEvent::Confirmed(attempt));
        if let Some(previous) = self.confirm_task.replace(task) {
            previous.abort();
        }
    }

    fn schedule_notice_expiry(&mut self, notice: NoticeId) {
        let task = self.spawn_after(
            self.timings.success_notice,
            BookingEvent::NoticeExpired(notice),
        );
        if let Some(previous) = self.notice_task.replace(task) {
            previous.abort();
        }
    }

    fn spawn_after(&self, delay: Duration, event: BookingEvent) -> JoinHandle<()> {
        let sender = self.sender.clone();
        tokio::spawn(async move {
            time::sleep(delay).await;
            if sender.send(event).await.is_err() {
                warn!(?event, "Booking event dropped; receiver closed");
            }
        })
    }
}

impl Drop for BookingDriver {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{booking::BookingRejection, catalog::Catalog, models::ListingKind};
    use chrono::NaiveDate;
    use tokio::sync::mpsc::error::TryRecvError;

    fn storefront() -> Storefront {
        Storefront::new(Catalog::builtin().clone())
    }

    fn first_bookable(store: &Storefront) -> String {
        store
            .visible_listings()
            .iter()
            .find(|listing| listing.is_bookable(ListingKind::Ground))
            .map(|listing| listing.id.clone())
            .expect("an available ground")
    }

    #[tokio::test(start_paused = true)]
    async fn confirmation_and_notice_follow_fixed_delays() {
        let (mut driver, mut events) = BookingDriver::channel(BookingTimings::default());
        let mut store = storefront();
        let id = first_bookable(&store);
        store.add_listing(&id).expect("listing added");
        store.set_date(NaiveDate::from_ymd_opt(2026, 12, 1));

        assert!(matches!(driver.submit(&mut store), SubmitOutcome::Pending(_)));

        time::sleep(Duration::from_millis(999)).await;
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));

        let event = events.recv().await.expect("confirmation event");
        assert!(matches!(event, BookingEvent::Confirmed(_)));
        driver.handle(&mut store, event);
        assert!(store.cart().is_empty());
        assert!(store.booking().success());

        time::sleep(Duration::from_millis(4999)).await;
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
        assert!(store.booking().success());

        let event = events.recv().await.expect("notice expiry event");
        driver.handle(&mut store, event);
        assert!(!store.booking().success());
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_submission_schedules_nothing() {
        let (mut driver, mut events) = BookingDriver::channel(BookingTimings::default());
        let mut store = storefront();

        assert_eq!(
            driver.submit(&mut store),
            SubmitOutcome::Rejected(BookingRejection::EmptyCart)
        );
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_driver_cancels_timers() {
        let (mut driver, mut events) = BookingDriver::channel(BookingTimings::default());
        let mut store = storefront();
        let id = first_bookable(&store);
        store.add_listing(&id).expect("listing added");
        store.set_date(NaiveDate::from_ymd_opt(2026, 12, 1));
        driver.submit(&mut store);
        drop(driver);

        time::sleep(Duration::from_secs(2)).await;
        assert!(events.recv().await.is_none());
        assert!(store.booking().is_pending());
    }
}
