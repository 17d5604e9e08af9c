pub mod auth;
pub mod health;
pub mod message;
pub mod team;
