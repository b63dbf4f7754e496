pub mod audition;
pub mod movie;
pub mod movie_role;
pub mod notification;
pub mod page;
pub mod payment;
pub mod role;
pub mod system_setting;
pub mod user;
