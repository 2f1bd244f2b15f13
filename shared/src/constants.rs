pub const DEALS_ENDPOINT: &str = "/api/deals";
pub const SPIN_ENDPOINT: &str = "/api/spin";
pub const HEALTH_CHECK_ENDPOINT: &str = "/api/health_check";
pub const DEVICE_ID_HEADER: &str = "x-device-id";

pub const INVALID_PHONE_ERROR: &str = "Please enter a valid phone number";
pub const PHONE_ALREADY_USED_ERROR: &str = "This phone number has already been used";
pub const BONUS_ALREADY_CLAIMED_ERROR: &str = "You already claimed today's bonus spin";
pub const SPIN_STILL_AVAILABLE_ERROR: &str = "You still have a spin left today";
pub const NO_SPINS_LEFT_ERROR: &str = "No spins left. Come back in 24 hours for another spin.";
pub const SEARCH_TOO_LONG_ERROR: &str = "Search text is too long";
pub const MISSING_DEVICE_ID_ERROR: &str = "Missing or invalid device id";

pub const MAX_SEARCH_LENGTH: usize = 100;
pub const WHEEL_RADIUS: f64 = 50.0;
