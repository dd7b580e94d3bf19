pub mod catalog;
pub mod error;
pub mod like;
pub mod user;
