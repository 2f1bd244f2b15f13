use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::wheel_layout::WheelLayout;

// Constants for wheel animation
pub const MIN_REVOLUTIONS: u32 = 5;      // Minimum number of full rotations
pub const EXTRA_REVOLUTIONS: u32 = 3;    // Extra rotations drawn from 0..EXTRA_REVOLUTIONS
pub const SPIN_DURATION_MS: u32 = 5000;  // Duration of spin animation in milliseconds
pub const DEAL_SPINS_PER_USER: i64 = 3;  // Spins each device gets on a deal wheel

pub const WIN_COLOR: &str = "#4361EE";
pub const TRY_AGAIN_COLOR: &str = "#E94F37";

/// How a discount is applied
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "percentage" => Ok(Self::Percentage),
            "fixed" => Ok(Self::Fixed),
            other => Err(format!("Unknown discount type: {}", other)),
        }
    }
}

/// Renders a discount the way deal cards show it: `50% off`, `$5.00 off`.
pub fn format_discount(amount: f64, discount_type: DiscountType) -> String {
    match discount_type {
        DiscountType::Percentage => format!("{}% off", amount),
        DiscountType::Fixed => format!("${:.2} off", amount),
    }
}

/// What landing on a slice gives the player
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrizeKind {
    Discount,
    TryAgain,
    ExclusiveDeal,
    Bonus,
    FreeSpin,
}

/// One slice of the wheel
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Prize {
    pub name: String,
    pub color: String,
    pub discount_amount: f64,
    pub discount_type: DiscountType,
    pub kind: PrizeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Prize {
    pub fn discount(name: &str, color: &str, amount: f64, discount_type: DiscountType) -> Self {
        Self {
            name: name.to_string(),
            color: color.to_string(),
            discount_amount: amount,
            discount_type,
            kind: PrizeKind::Discount,
            description: None,
        }
    }

    pub fn try_again() -> Self {
        Self {
            name: "Try Again".to_string(),
            color: TRY_AGAIN_COLOR.to_string(),
            discount_amount: 0.0,
            discount_type: DiscountType::Fixed,
            kind: PrizeKind::TryAgain,
            description: None,
        }
    }

    pub fn is_win(&self) -> bool {
        self.kind != PrizeKind::TryAgain
    }

    /// Discount label for slices that carry an amount, `None` otherwise.
    pub fn label(&self) -> Option<String> {
        if self.discount_amount > 0.0 {
            Some(format_discount(self.discount_amount, self.discount_type))
        } else {
            None
        }
    }
}

/// Builds the six-slice wheel shown on a deal page. The deal itself is slice 0.
pub fn deal_prizes(deal_title: &str, discount_amount: f64, discount_type: DiscountType) -> Vec<Prize> {
    vec![
        Prize::discount(deal_title, WIN_COLOR, discount_amount, discount_type),
        Prize::try_again(),
        Prize::discount("5% Off", WIN_COLOR, 5.0, DiscountType::Percentage),
        Prize::try_again(),
        Prize::discount("$5 Off", WIN_COLOR, 5.0, DiscountType::Fixed),
        Prize::try_again(),
    ]
}

fn exclusive(name: &str, color: &str, description: &str, kind: PrizeKind, percent: f64) -> Prize {
    Prize {
        name: name.to_string(),
        color: color.to_string(),
        discount_amount: percent,
        discount_type: DiscountType::Percentage,
        kind,
        description: Some(description.to_string()),
    }
}

/// The static promotional wheel. Every slice is a prize.
pub fn promotional_prizes() -> Vec<Prize> {
    vec![
        exclusive("50% Off Any Deal", "#FF6B6B", "Get 50% off any deal of your choice!", PrizeKind::ExclusiveDeal, 50.0),
        exclusive("Free Spin", "#4ECDC4", "Try your luck again!", PrizeKind::FreeSpin, 0.0),
        exclusive("Mystery Deal", "#9B59B6", "Unlock an exclusive mystery deal!", PrizeKind::ExclusiveDeal, 0.0),
        exclusive("Extra 20% Off", "#45B7D1", "Stack an extra 20% off on any deal!", PrizeKind::Bonus, 20.0),
        exclusive("VIP Deal", "#FFB627", "Unlock a special VIP-only deal!", PrizeKind::ExclusiveDeal, 0.0),
        exclusive("Double Discount", "#96CEB4", "Double your next deal's discount!", PrizeKind::Bonus, 0.0),
        exclusive("Premium Deal", "#D4A5A5", "Access a premium exclusive deal!", PrizeKind::ExclusiveDeal, 0.0),
        exclusive("Bonus Spin", "#95A5A6", "Get another chance to win!", PrizeKind::FreeSpin, 0.0),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WheelError {
    InvalidArgument(&'static str),
}

impl fmt::Display for WheelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for WheelError {}

/// Result of a single spin
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SpinOutcome {
    pub index: usize,
    pub prize: Prize,
    pub revolutions: u32,
    pub rotation_degrees: f64,
}

pub fn slice_width(prize_count: usize) -> f64 {
    360.0 / prize_count as f64
}

/// Clockwise rotation that centres slice `index` under the pointer after `revolutions` turns.
pub fn rotation_for(index: usize, prize_count: usize, revolutions: u32) -> f64 {
    let width = slice_width(prize_count);
    revolutions as f64 * 360.0 + width * index as f64 + width / 2.0
}

/// Recovers the slice index encoded in a rotation produced by [`rotation_for`].
pub fn slice_index_for_rotation(rotation_degrees: f64, prize_count: usize) -> usize {
    let width = slice_width(prize_count);
    let offset = rotation_degrees.rem_euclid(360.0);
    let index = ((offset - width / 2.0) / width).round();
    (index.max(0.0) as usize) % prize_count
}

/// Picks a prize uniformly at random. The index is drawn first and the rotation follows from it.
pub fn select_prize<R: Rng + ?Sized>(prizes: &[Prize], rng: &mut R) -> Result<SpinOutcome, WheelError> {
    if prizes.is_empty() {
        return Err(WheelError::InvalidArgument("prize list must not be empty"));
    }
    Ok(draw(prizes, rng))
}

fn draw<R: Rng + ?Sized>(prizes: &[Prize], rng: &mut R) -> SpinOutcome {
    let index = rng.gen_range(0..prizes.len());
    let revolutions = MIN_REVOLUTIONS + rng.gen_range(0..EXTRA_REVOLUTIONS);
    let rotation_degrees = rotation_for(index, prizes.len(), revolutions);

    log::debug!("wheel of {} slices landed on {} after {} turns", prizes.len(), index, revolutions);

    SpinOutcome {
        index,
        prize: prizes[index].clone(),
        revolutions,
        rotation_degrees,
    }
}

/// An ordered, non-empty set of equal slices
#[derive(Debug, Clone, PartialEq)]
pub struct PrizeWheel {
    prizes: Vec<Prize>,
}

impl PrizeWheel {
    pub fn new(prizes: Vec<Prize>) -> Result<Self, WheelError> {
        if prizes.is_empty() {
            return Err(WheelError::InvalidArgument("prize list must not be empty"));
        }
        Ok(Self { prizes })
    }

    pub fn prizes(&self) -> &[Prize] {
        &self.prizes
    }

    pub fn slice_width(&self) -> f64 {
        slice_width(self.prizes.len())
    }

    pub fn spin<R: Rng + ?Sized>(&self, rng: &mut R) -> SpinOutcome {
        draw(&self.prizes, rng)
    }

    pub fn layout(&self, radius: f64) -> WheelLayout {
        WheelLayout::new(self.prizes.len(), radius)
    }

    pub fn view(&self, radius: f64) -> WheelView {
        WheelView {
            prizes: self.prizes.clone(),
            slice_width: self.slice_width(),
            layout: self.layout(radius),
            spin_duration_ms: SPIN_DURATION_MS,
        }
    }
}

// === API Types ===

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WheelView {
    pub prizes: Vec<Prize>,
    pub slice_width: f64,
    pub layout: WheelLayout,
    pub spin_duration_ms: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpinResponse {
    pub success: bool,
    pub outcome: Option<SpinOutcome>,
    pub spins_remaining: i64,
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpinStatusResponse {
    pub spins_remaining: i64,
    pub cooldown_seconds: i64,
}
