//! Database entities.

pub mod notification;
pub mod plan;
pub mod post;
pub mod team_member;

pub use notification::Entity as Notification;
pub use plan::Entity as Plan;
pub use post::Entity as Post;
pub use team_member::Entity as TeamMember;
