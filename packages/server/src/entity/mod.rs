pub mod payment_record;
pub mod registration;
pub mod user;
pub mod workshop;
