pub mod brands;
pub mod catalog;
pub mod error;
pub mod likes;
pub mod repos;
pub mod users;
