// src/scheduling/appointment.rs

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Document;

use super::TimeWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
    Rejected,
    ReschedulePending,
    RescheduleConfirmed,
    RescheduleRejected,
}

impl AppointmentStatus {
    pub const ACTIVE: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::ReschedulePending,
        AppointmentStatus::RescheduleConfirmed,
    ];

    /// Still occupies its slot.
    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed
                | AppointmentStatus::Cancelled
                | AppointmentStatus::NoShow
                | AppointmentStatus::Rejected
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no-show",
            AppointmentStatus::Rejected => "rejected",
            AppointmentStatus::ReschedulePending => "reschedule-pending",
            AppointmentStatus::RescheduleConfirmed => "reschedule-confirmed",
            AppointmentStatus::RescheduleRejected => "reschedule-rejected",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    User,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferredContact {
    Email,
    Phone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: String,
    pub phone: Option<String>,
    pub preferred_contact: PreferredContact,
}

/// Where a reschedule request stands, independent of the appointment status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RescheduleOutcome {
    Pending,
    Confirmed { resolved_at: DateTime<Utc> },
    Rejected { resolved_at: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub requested_by: Party,
    pub previous_status: Option<AppointmentStatus>,
    pub proposed_date: NaiveDate,
    pub proposed_time_slot: TimeWindow,
    pub requested_at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: RescheduleOutcome,
}

impl RescheduleRequest {
    pub fn is_open(&self) -> bool {
        self.outcome == RescheduleOutcome::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionDetails {
    pub note: String,
    pub rejected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub admin_id: Uuid,
    pub service_id: Uuid,
    /// Shop calendar day of the booking.
    pub appointment_date: NaiveDate,
    pub time_slot: TimeWindow,
    pub status: AppointmentStatus,
    pub contact_info: ContactInfo,
    pub reschedule_request: Option<RescheduleRequest>,
    pub rejection_details: Option<RejectionDetails>,
    pub review: Option<Uuid>,
    pub has_review: bool,
    /// Bumped on every change; writes are conditional on the loaded value.
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Appointment {
    const COLLECTION: &'static str = "appointments";

    fn id(&self) -> Uuid {
        self.id
    }
}

pub const DEFAULT_REJECTION_NOTE: &str = "No reason given";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("only pending or confirmed appointments can be rescheduled (current status: {0})")]
    NotReschedulable(AppointmentStatus),

    #[error("appointment has no open reschedule request (current status: {0})")]
    NoOpenReschedule(AppointmentStatus),

    #[error("cannot {action} an appointment that is {from}")]
    NotAllowed {
        action: &'static str,
        from: AppointmentStatus,
    },
}

/// Operations that move an appointment through its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    RequestReschedule {
        by: Party,
        proposed_date: NaiveDate,
        proposed_time_slot: TimeWindow,
    },
    ConfirmReschedule,
    RejectReschedule { note: Option<String> },
    Confirm,
    Complete,
    Cancel,
    Reject { note: Option<String> },
    /// Unchecked barber override.
    SetStatus {
        status: AppointmentStatus,
        note: Option<String>,
    },
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::RequestReschedule { .. } => "request_reschedule",
            Transition::ConfirmReschedule => "confirm_reschedule",
            Transition::RejectReschedule { .. } => "reject_reschedule",
            Transition::Confirm => "confirm",
            Transition::Complete => "complete",
            Transition::Cancel => "cancel",
            Transition::Reject { .. } => "reject",
            Transition::SetStatus { .. } => "set_status",
        }
    }
}

fn rejection(note: Option<String>, now: DateTime<Utc>) -> RejectionDetails {
    let note = note
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_REJECTION_NOTE.to_string());
    RejectionDetails {
        note,
        rejected_at: now,
    }
}

impl Appointment {
    /// The window this appointment holds in the barber's schedule, if any.
    /// An open reschedule keeps holding the original window until confirmed.
    pub fn reserved_window(&self) -> Option<TimeWindow> {
        self.status.is_active().then_some(self.time_slot)
    }

    pub fn apply(&mut self, transition: Transition, now: DateTime<Utc>) -> Result<(), TransitionError> {
        use AppointmentStatus as S;

        let from = self.status;
        let not_allowed = |action| TransitionError::NotAllowed { action, from };

        match transition {
            Transition::RequestReschedule {
                by,
                proposed_date,
                proposed_time_slot,
            } => {
                if !matches!(from, S::Pending | S::Confirmed) {
                    return Err(TransitionError::NotReschedulable(from));
                }
                self.reschedule_request = Some(RescheduleRequest {
                    requested_by: by,
                    previous_status: Some(from),
                    proposed_date,
                    proposed_time_slot,
                    requested_at: now,
                    outcome: RescheduleOutcome::Pending,
                });
                self.status = S::ReschedulePending;
            }
            Transition::ConfirmReschedule => {
                let request = self.open_reschedule_mut()?;
                request.outcome = RescheduleOutcome::Confirmed { resolved_at: now };
                let (date, slot) = (request.proposed_date, request.proposed_time_slot);
                self.appointment_date = date;
                self.time_slot = slot;
                self.status = S::RescheduleConfirmed;
            }
            Transition::RejectReschedule { note } => {
                let request = self.open_reschedule_mut()?;
                request.outcome = RescheduleOutcome::Rejected { resolved_at: now };
                let restored = request.previous_status.unwrap_or(S::Pending);
                self.status = restored;
                self.rejection_details = Some(rejection(note, now));
            }
            Transition::Confirm => {
                if from != S::Pending {
                    return Err(not_allowed("confirm"));
                }
                self.status = S::Confirmed;
            }
            Transition::Complete => {
                if !matches!(from, S::Confirmed | S::RescheduleConfirmed) {
                    return Err(not_allowed("complete"));
                }
                self.status = S::Completed;
            }
            Transition::Cancel => {
                if !matches!(from, S::Pending | S::Confirmed | S::RescheduleConfirmed) {
                    return Err(not_allowed("cancel"));
                }
                self.status = S::Cancelled;
            }
            Transition::Reject { note } => {
                if !matches!(from, S::Pending | S::Confirmed) {
                    return Err(not_allowed("reject"));
                }
                self.status = S::Rejected;
                self.rejection_details = Some(rejection(note, now));
            }
            Transition::SetStatus { status, note } => {
                if status == S::Rejected || (note.is_some() && status == S::RescheduleRejected) {
                    self.rejection_details = Some(rejection(note, now));
                }
                self.status = status;
            }
        }

        self.touch(now);
        Ok(())
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.revision += 1;
        self.updated_at = now;
    }

    fn open_reschedule_mut(&mut self) -> Result<&mut RescheduleRequest, TransitionError> {
        let status = self.status;
        match self.reschedule_request.as_mut() {
            Some(request) if status == AppointmentStatus::ReschedulePending && request.is_open() => {
                Ok(request)
            }
            _ => Err(TransitionError::NoOpenReschedule(status)),
        }
    }
}
