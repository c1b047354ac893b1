//! Booking flow state machine.
//!
//! Submissions are validated synchronously. A passing submission becomes
//! the single pending attempt until its confirmation is applied, at which
//! point the cart is cleared and a self-clearing success notice is raised.
//! Timing lives in [`crate::driver`]; this module only applies transitions.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::cart::{Cart, CartItem};

/// Reason a submission was refused. Stored as state, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum BookingRejection {
    /// The cart had no lines.
    #[error("Your cart is empty. Please add items before booking.")]
    EmptyCart,
    /// No booking date was selected.
    #[error("Please select a date for your booking.")]
    MissingDate,
}

/// Identifier of a submission that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptId(u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a raised success notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoticeId(u64);

/// A submission waiting for its confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingBooking {
    /// Attempt identifier handed to the timer.
    pub attempt: AttemptId,
    /// Date the booking is for.
    pub date: NaiveDate,
    /// Cart lines at submission time.
    pub items: Vec<CartItem>,
    /// Cart total at submission time.
    pub total: f64,
    /// When the submission passed validation.
    pub submitted_at: DateTime<Utc>,
}

/// A confirmed booking whose notice is visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confirmation {
    /// Attempt that produced this confirmation.
    pub attempt: AttemptId,
    /// Notice identifier handed to the expiry timer.
    pub notice: NoticeId,
    /// Date the booking is for.
    pub date: NaiveDate,
    /// Number of items booked, counting quantities.
    pub item_count: u32,
    /// Amount booked.
    pub total: f64,
    /// When the confirmation was applied.
    pub confirmed_at: DateTime<Utc>,
}

/// Observable state of the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingState {
    /// Nothing pending and no error shown.
    Idle,
    /// Last submission failed validation.
    Rejected(BookingRejection),
    /// A submission is waiting for confirmation.
    Pending(AttemptId),
}

/// Result of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; the rejection is now the visible error.
    Rejected(BookingRejection),
    /// Validation passed; a confirmation must be scheduled for the attempt.
    Pending(AttemptId),
    /// Another attempt is still pending; nothing changed.
    AlreadyPending(AttemptId),
}

/// Booking flow state.
#[derive(Debug, Default)]
pub struct BookingFlow {
    pending: Option<PendingBooking>,
    rejection: Option<BookingRejection>,
    confirmation: Option<Confirmation>,
    last_attempt: u64,
    last_notice: u64,
}

impl BookingFlow {
    /// Create an idle flow.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and submit the cart for the given date.
    ///
    /// Checks run in order and the first failure wins: empty cart, then missing date.
    pub fn submit(&mut self, cart: &Cart, date: Option<NaiveDate>) -> SubmitOutcome {
        if let Some(pending) = &self.pending {
            debug!(attempt = %pending.attempt, "Submission ignored while pending");
            return SubmitOutcome::AlreadyPending(pending.attempt);
        }

        let date = match validate(cart, date) {
            Ok(date) => date,
            Err(rejection) => {
                info!(%rejection, "Booking rejected");
                self.rejection = Some(rejection);
                return SubmitOutcome::Rejected(rejection);
            }
        };

        self.last_attempt += 1;
        let attempt = AttemptId(self.last_attempt);
        let pending = PendingBooking {
            attempt,
            date,
            items: cart.entries().to_vec(),
            total: cart.total(),
            submitted_at: Utc::now(),
        };
        info!(
            %attempt,
            %date,
            items = pending.items.len(),
            total = pending.total,
            "Booking pending"
        );
        self.pending = Some(pending);
        SubmitOutcome::Pending(attempt)
    }

    /// Apply the success transition for a pending attempt.
    ///
    /// Clears the cart and the visible error and raises a notice. Returns the
    /// notice to schedule for expiry, or `None` when the attempt is not the
    /// pending one.
    pub fn confirm(&mut self, attempt: AttemptId, cart: &mut Cart) -> Option<NoticeId> {
        match &self.pending {
            Some(pending) if pending.attempt == attempt => {}
            _ => {
                debug!(%attempt, "Ignoring stale confirmation");
                return None;
            }
        }
        let pending = self.pending.take()?;

        cart.clear();
        self.rejection = None;
        self.last_notice += 1;
        let notice = NoticeId(self.last_notice);
        let item_count = pending.items.iter().map(CartItem::quantity).sum();
        info!(%attempt, date = %pending.date, total = pending.total, "Booking confirmed");
        self.confirmation = Some(Confirmation {
            attempt,
            notice,
            date: pending.date,
            item_count,
            total: pending.total,
            confirmed_at: Utc::now(),
        });
        Some(notice)
    }

    /// Hide the success notice if it is still the given one.
    pub fn expire_notice(&mut self, notice: NoticeId) -> bool {
        match &self.confirmation {
            Some(confirmation) if confirmation.notice == notice => {
                self.confirmation = None;
                true
            }
            _ => false,
        }
    }

    /// Current state of the flow.
    pub fn state(&self) -> BookingState {
        if let Some(pending) = &self.pending {
            BookingState::Pending(pending.attempt)
        } else if let Some(rejection) = self.rejection {
            BookingState::Rejected(rejection)
        } else {
            BookingState::Idle
        }
    }

    /// Whether an attempt is waiting for confirmation.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The pending attempt, if any.
    pub fn pending(&self) -> Option<&PendingBooking> {
        self.pending.as_ref()
    }

    /// Whether the success notice is visible.
    pub fn success(&self) -> bool {
        self.confirmation.is_some()
    }

    /// The visible confirmation, if any.
    pub fn confirmation(&self) -> Option<&Confirmation> {
        self.confirmation.as_ref()
    }

    /// The visible validation error, if any.
    ///
    /// Stays visible while a later attempt is pending and clears on success.
    pub fn rejection(&self) -> Option<BookingRejection> {
        self.rejection
    }

    /// Error text to display, if any.
    pub fn error_message(&self) -> Option<String> {
        self.rejection.map(|rejection| rejection.to_string())
    }
}

fn validate(cart: &Cart, date: Option<NaiveDate>) -> Result<NaiveDate, BookingRejection> {
    if cart.is_empty() {
        return Err(BookingRejection::EmptyCart);
    }
    date.ok_or(BookingRejection::MissingDate)
}
