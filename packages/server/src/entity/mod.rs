pub mod message;
pub mod room;
pub mod team;
pub mod team_member;
pub mod user;
