pub mod auth;
pub mod bookings;
pub mod calendar;
pub mod facilities;
pub mod faculty;
pub mod maintenance;
pub mod rooms;
