//! Account aggregate.
//!
//! An account embeds its membership ledger and attendance log so that one
//! document write covers a whole membership change.
//!
//! # Invariants
//!
//! - At most one membership period per plan; re-subscribing replaces it
//! - At most one attendance record per UTC calendar day
//! - `version` increases by one on every persisted write

use serde::{Deserialize, Serialize};

use super::{AttendanceError, AttendanceRecord, MembershipPeriod, PeriodStatus};
use crate::domain::foundation::{AccountId, PaymentId, PlanId, Timestamp, ValidationError};

/// Outcome of granting a membership period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodChange {
    Appended,
    Replaced,
    /// The same payment already wrote this period; nothing changed.
    Unchanged,
}

/// A registered gym member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub membership_periods: Vec<MembershipPeriod>,
    pub attendance: Vec<AttendanceRecord>,
    /// Optimistic concurrency token.
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Account {
    pub fn register(
        id: AccountId,
        username: impl Into<String>,
        email: impl Into<String>,
        full_name: impl Into<String>,
        phone_number: Option<String>,
    ) -> Result<Self, ValidationError> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(ValidationError::empty_field("username"));
        }
        let email = email.into();
        if !email.contains('@') {
            return Err(ValidationError::invalid_format("email", "missing @ symbol"));
        }
        let now = Timestamp::now();
        Ok(Self {
            id,
            username,
            email,
            full_name: full_name.into(),
            phone_number,
            membership_periods: Vec::new(),
            attendance: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn period_for(&self, plan_id: PlanId) -> Option<&MembershipPeriod> {
        self.membership_periods.iter().find(|p| p.plan_id == plan_id)
    }

    /// True when any period is marked active.
    pub fn has_active_period(&self) -> bool {
        self.membership_periods.iter().any(MembershipPeriod::is_active)
    }

    pub fn has_active_period_for(&self, plan_id: PlanId) -> bool {
        self.period_for(plan_id).is_some_and(MembershipPeriod::is_active)
    }

    /// True when an active period covers `now`.
    pub fn has_active_membership_at(&self, now: Timestamp) -> bool {
        self.membership_periods.iter().any(|p| p.is_active_at(now))
    }

    /// Period written by the callback for `payment_id`, if any.
    pub fn period_granted_by(&self, payment_id: PaymentId) -> Option<&MembershipPeriod> {
        self.membership_periods
            .iter()
            .find(|p| p.granted_by == Some(payment_id))
    }

    /// Grants an active period for `plan_id`.
    ///
    /// An existing period for the same plan is overwritten wholesale.
    pub fn grant_period(&mut self, plan_id: PlanId, start: Timestamp, end: Timestamp) -> PeriodChange {
        self.put_period(MembershipPeriod::active(plan_id, start, end))
    }

    /// Grants the period bought by `payment_id`.
    ///
    /// Idempotent per payment: when that payment already wrote a period the
    /// stored one is returned untouched with `PeriodChange::Unchanged`.
    pub fn grant_paid_period(
        &mut self,
        plan_id: PlanId,
        payment_id: PaymentId,
        start: Timestamp,
        end: Timestamp,
    ) -> (PeriodChange, MembershipPeriod) {
        if let Some(existing) = self.period_granted_by(payment_id) {
            return (PeriodChange::Unchanged, existing.clone());
        }
        let period = MembershipPeriod::active(plan_id, start, end).paid_by(payment_id);
        let change = self.put_period(period.clone());
        (change, period)
    }

    fn put_period(&mut self, period: MembershipPeriod) -> PeriodChange {
        self.updated_at = Timestamp::now();
        match self.membership_periods.iter_mut().find(|p| p.plan_id == period.plan_id) {
            Some(existing) => {
                *existing = period;
                PeriodChange::Replaced
            }
            None => {
                self.membership_periods.push(period);
                PeriodChange::Appended
            }
        }
    }

    /// Marks every lapsed active period inactive.
    ///
    /// Returns the plans whose periods changed; empty when nothing lapsed.
    pub fn expire_periods(&mut self, now: Timestamp) -> Vec<PlanId> {
        let mut expired = Vec::new();
        for period in self.membership_periods.iter_mut().filter(|p| p.has_lapsed(now)) {
            period.status = PeriodStatus::Inactive;
            expired.push(period.plan_id);
        }
        if !expired.is_empty() {
            self.updated_at = now;
        }
        expired
    }

    /// Drops the period for a deleted plan. Returns false when there was none.
    pub fn detach_plan(&mut self, plan_id: PlanId) -> bool {
        let before = self.membership_periods.len();
        self.membership_periods.retain(|p| p.plan_id != plan_id);
        let changed = self.membership_periods.len() != before;
        if changed {
            self.updated_at = Timestamp::now();
        }
        changed
    }

    /// Opens today's attendance record.
    ///
    /// # Errors
    ///
    /// - `NoActiveMembership` without a period covering `now`
    /// - `AlreadyClockedIn` when today already has a record
    pub fn clock_in(&mut self, now: Timestamp) -> Result<&AttendanceRecord, AttendanceError> {
        if !self.has_active_membership_at(now) {
            return Err(AttendanceError::NoActiveMembership);
        }
        let today = now.date();
        if self.attendance.iter().any(|r| r.date == today) {
            return Err(AttendanceError::AlreadyClockedIn(today));
        }
        self.attendance.push(AttendanceRecord::open(now));
        self.updated_at = now;
        let idx = self.attendance.len() - 1;
        Ok(&self.attendance[idx])
    }

    /// Closes today's attendance record.
    ///
    /// # Errors
    ///
    /// - `NotClockedIn` when today has no record
    /// - `AlreadyClockedOut` when today's record is closed
    pub fn clock_out(&mut self, now: Timestamp) -> Result<&AttendanceRecord, AttendanceError> {
        let today = now.date();
        let record = self
            .attendance
            .iter_mut()
            .find(|r| r.date == today)
            .ok_or(AttendanceError::NotClockedIn(today))?;
        if !record.is_open() {
            return Err(AttendanceError::AlreadyClockedOut(today));
        }
        record.clock_out = Some(now);
        self.updated_at = now;
        Ok(record)
    }

    /// Attendance records whose clock-in falls inside `[from, to]`.
    pub fn attendance_between(&self, from: Timestamp, to: Timestamp) -> Vec<AttendanceRecord> {
        self.attendance
            .iter()
            .filter(|r| r.clocked_in_between(from, to))
            .cloned()
            .collect()
    }
}
