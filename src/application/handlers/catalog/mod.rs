//! Subscription catalog handlers.
//!
//! Plan CRUD. Deleting a plan also removes its periods from every account.

mod create_plan;
mod delete_plan;
mod get_plans;
mod update_plan;

pub use create_plan::{CreatePlanCommand, CreatePlanHandler};
pub use delete_plan::{DeletePlanCommand, DeletePlanHandler, DeletePlanResult};
pub use get_plans::{GetPlanHandler, GetPlanQuery, ListPlansHandler};
pub use update_plan::{UpdatePlanCommand, UpdatePlanHandler};
