pub mod admin;
pub mod auth;
pub mod checkin;
pub mod member;
pub mod root;
