pub mod deals;
pub mod spin;
