pub mod client;
pub mod models;

pub use client::{ApiError, BitapsClient};
pub use models::BlockPage;
