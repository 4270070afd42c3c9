pub mod user_repo;
pub use user_repo::UserRepository;
pub mod faculty_repo;
pub use faculty_repo::FacultyRepository;
pub mod facility_repo;
pub use facility_repo::FacilityRepository;
pub mod room_repo;
pub use room_repo::RoomRepository;
pub mod booking_repo;
pub use booking_repo::BookingRepository;
pub mod maintenance_repo;
pub use maintenance_repo::MaintenanceRepository;
pub mod calendar_repo;
