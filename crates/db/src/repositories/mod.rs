//! Database repositories.

pub mod notification;
pub mod plan;
pub mod post;
pub mod team_member;

pub use notification::NotificationRepository;
pub use plan::PlanRepository;
pub use post::PostRepository;
pub use team_member::TeamMemberRepository;
