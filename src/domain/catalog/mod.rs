//! Subscription catalog domain module.
//!
//! - `plan` - SubscriptionPlan entity and renewal flag
//! - `duration` - PlanDuration codes and calendar arithmetic

mod duration;
mod plan;

pub use duration::PlanDuration;
pub use plan::{RenewalType, SubscriptionPlan};
