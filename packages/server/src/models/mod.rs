pub mod auth;
pub mod message;
pub mod shared;
pub mod team;
