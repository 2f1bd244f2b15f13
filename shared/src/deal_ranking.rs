use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::{try_parse_point, Coordinate};
use crate::prize_wheel::{format_discount, DiscountType};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Business {
    pub name: String,
    pub address: String,
    // Serialized point, e.g. POINT(lon lat). May be empty.
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Deal {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub discount_type: DiscountType,
    pub discount_amount: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub business_id: Uuid,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub is_spin_exclusive: bool,
    #[serde(alias = "businesses")]
    pub business: Business,
}

fn default_active() -> bool {
    true
}

impl Deal {
    /// Publicly listed while active, not yet ended and not reserved for the wheel.
    pub fn is_listable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now < self.end_date && !self.is_spin_exclusive
    }

    /// Deal wheels stay open for spin-exclusive deals too.
    pub fn is_spinnable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now < self.end_date
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        try_parse_point(&self.business.location)
    }

    pub fn discount_label(&self) -> String {
        format_discount(self.discount_amount, self.discount_type)
    }

    fn matches_search(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.business.name.to_lowercase().contains(needle)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiscountTypeFilter {
    #[default]
    All,
    Percentage,
    Fixed,
}

impl DiscountTypeFilter {
    pub fn matches(&self, discount_type: DiscountType) -> bool {
        match self {
            Self::All => true,
            Self::Percentage => discount_type == DiscountType::Percentage,
            Self::Fixed => discount_type == DiscountType::Fixed,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    #[serde(rename = "distance")]
    Distance,
    #[serde(rename = "discount")]
    Discount,
    #[serde(rename = "endDate", alias = "end_date")]
    EndDate,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DealFilters {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub discount_type: DiscountTypeFilter,
    #[serde(default)]
    pub sort_by: SortKey,
    #[serde(default)]
    pub max_distance_miles: Option<f64>,
}

/// A deal plus its distance from the viewer, when both ends are known
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RankedDeal {
    pub deal: Deal,
    pub distance_miles: Option<f64>,
}

impl RankedDeal {
    pub fn new(deal: Deal, viewer: Option<Coordinate>) -> Self {
        let distance_miles = viewer.and_then(|v| deal.coordinate().map(|c| v.distance_to(&c)));
        Self { deal, distance_miles }
    }

    pub fn distance_label(&self) -> Option<String> {
        self.distance_miles.map(|d| format!("{:.1} miles away", d))
    }
}

pub fn listable_deals(deals: &[Deal], now: DateTime<Utc>) -> Vec<Deal> {
    deals.iter().filter(|d| d.is_listable(now)).cloned().collect()
}

/// Filters and sorts a copy of `deals`. All sorts are stable.
pub fn rank_deals(deals: &[Deal], viewer: Option<Coordinate>, filters: &DealFilters) -> Vec<RankedDeal> {
    let needle = filters.search.trim().to_lowercase();

    let mut ranked: Vec<RankedDeal> = deals
        .iter()
        .filter(|deal| deal.matches_search(&needle))
        .filter(|deal| filters.discount_type.matches(deal.discount_type))
        .map(|deal| RankedDeal::new(deal.clone(), viewer))
        .filter(|r| match (filters.max_distance_miles, r.distance_miles) {
            (Some(max), Some(distance)) => distance <= max,
            _ => true,
        })
        .collect();

    match filters.sort_by {
        SortKey::Distance => {
            if viewer.is_some() {
                ranked.sort_by(|a, b| compare_distance(a.distance_miles, b.distance_miles));
            }
        }
        SortKey::Discount => ranked.sort_by(|a, b| compare_discount(&a.deal, &b.deal)),
        SortKey::EndDate => ranked.sort_by_key(|r| r.deal.end_date),
    }

    ranked
}

// Unknown distances get no advantage: they follow every known one.
fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// Percentage deals rank above fixed ones regardless of magnitude.
fn compare_discount(a: &Deal, b: &Deal) -> Ordering {
    if a.discount_type == b.discount_type {
        return b.discount_amount.total_cmp(&a.discount_amount);
    }
    match a.discount_type {
        DiscountType::Percentage => Ordering::Less,
        DiscountType::Fixed => Ordering::Greater,
    }
}
