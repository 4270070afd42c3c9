pub mod auth;
pub mod booking_service;
pub mod calendar_service;
pub mod conflict_checker;
pub mod facility_naming;
pub mod facility_service;
pub mod faculty_service;
pub mod maintenance_service;
pub mod room_service;
pub mod scope_service;
pub mod storage;
