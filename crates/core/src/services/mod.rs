//! Business logic services.

#![allow(missing_docs)]

pub mod approval;
pub mod notification;
pub mod plan;
pub mod push_delivery;
pub mod schedule;

pub use approval::{ApprovableItem, ApprovalService, ApprovalSummary, ItemRef};
pub use notification::NotificationDispatcher;
pub use plan::{CreatePlanInput, PlanService, PostOutcome, PublishInput, UpdateDraftInput};
pub use push_delivery::PushDeliveryService;
pub use schedule::{ContentItem, PostDraft, WeeklyPattern, assign_content, generate_slots};
