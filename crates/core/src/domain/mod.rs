pub mod client;
pub mod fee;
pub mod payment;
pub mod sale;
