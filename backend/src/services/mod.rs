pub mod deal_service;
pub mod spin_service;
