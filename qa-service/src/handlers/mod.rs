pub mod answers;
pub mod badges;
pub mod health;
pub mod notifications;
pub mod questions;
pub mod search;
pub mod taxonomy;
pub mod users;
pub mod votes;
