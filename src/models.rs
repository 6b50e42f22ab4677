pub mod auth;
pub mod hours;
pub mod reservation;
pub mod restaurant;
