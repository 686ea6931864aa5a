pub mod answers;
pub mod badges;
pub mod common;
pub mod notifications;
pub mod questions;
pub mod taxonomy;
pub mod users;
pub mod votes;
