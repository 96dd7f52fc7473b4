//! Attendance handlers.
//!
//! Members with a current membership clock in once per UTC day and clock
//! out later; staff read a report of who came in over a date range.

mod clock_in;
mod clock_out;
mod list_clocked_in;

pub use clock_in::{ClockInCommand, ClockInHandler};
pub use clock_out::{ClockOutCommand, ClockOutHandler};
pub use list_clocked_in::{ClockedInMember, ListClockedInHandler, ListClockedInQuery};
