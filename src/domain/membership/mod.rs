//! Membership domain module.
//!
//! Handles the per-account membership ledger and attendance log.
//!
//! # Module Structure
//!
//! - `account` - Account aggregate embedding periods and attendance
//! - `period` - MembershipPeriod and its status
//! - `attendance` - AttendanceRecord for daily clock-in/clock-out
//! - `errors` - MembershipError and AttendanceError

mod account;
mod attendance;
mod errors;
mod period;

pub use account::{Account, PeriodChange};
pub use attendance::AttendanceRecord;
pub use errors::{AttendanceError, MembershipError};
pub use period::{MembershipPeriod, PeriodStatus};
