pub mod badges;
pub mod database;
pub mod jwt;
pub mod metrics;
pub mod password;
