mod common;

mod dashboard;
mod movie;
mod notification;
mod page;
mod payment;
mod role;
mod setting;
mod user;
