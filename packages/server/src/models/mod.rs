pub mod admin;
pub mod auth;
pub mod payment;
pub mod registration;
pub mod shared;
pub mod upload;
pub mod workshop;
