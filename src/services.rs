pub mod auth;
pub mod hours_service;
pub mod reservation_service;
pub mod restaurant_service;
