//! Domain models for qa-service.

mod answer;
mod badge;
mod category;
mod notification;
mod question;
mod tag;
mod user;
mod vote;

pub use answer::{Answer, CreateAnswer};
pub use badge::{AwardedBadge, Badge, BadgeCategory, BadgeLevel, CreateBadge, UpdateBadge};
pub use category::Category;
pub use notification::{CreateNotification, Notification, NotificationType};
pub use question::{CreateQuestion, Question, UpdateQuestion};
pub use tag::Tag;
pub use user::{CreateUser, UpdateUser, User, UserRole};
pub use vote::{AnswerVote, QuestionVote, VoteOutcome, VoteValue};
