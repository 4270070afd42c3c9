pub mod auth;
pub mod booking;
pub mod calendar;
pub mod facility;
pub mod faculty;
pub mod maintenance;
pub mod rbac;
pub mod room;
