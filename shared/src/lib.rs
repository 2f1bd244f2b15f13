pub mod constants;
pub mod deal_ranking;
pub mod geo;
pub mod pagination;
pub mod prize_wheel;
pub mod spin_allowance;
pub mod validation;
pub mod wheel_layout;
