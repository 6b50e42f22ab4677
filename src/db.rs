pub mod hours_repo;
pub use hours_repo::HoursRepository;
pub mod reservation_repo;
pub use reservation_repo::ReservationRepository;
pub mod restaurant_repo;
pub use restaurant_repo::RestaurantRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
