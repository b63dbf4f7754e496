pub mod audition;
pub mod auth;
pub mod dashboard;
pub mod movie;
pub mod notification;
pub mod page;
pub mod payment;
pub mod profile;
pub mod role;
pub mod setting;
pub mod user;
