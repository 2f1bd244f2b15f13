use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use zilk_shared::deal_ranking::{Business, Deal, RankedDeal};
use zilk_shared::prize_wheel::DiscountType;

/// Row shape of the deals/businesses join
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DealRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub discount_type: String,
    pub discount_amount: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub business_id: Uuid,
    pub is_active: bool,
    pub is_spin_exclusive: bool,
    pub business_name: Option<String>,
    pub business_address: Option<String>,
    pub business_location: Option<String>,
}

impl TryFrom<DealRow> for Deal {
    type Error = String;

    fn try_from(row: DealRow) -> Result<Self, Self::Error> {
        let discount_type: DiscountType = row.discount_type.parse()?;

        Ok(Deal {
            id: row.id,
            title: row.title,
            description: row.description.unwrap_or_default(),
            discount_type,
            discount_amount: row.discount_amount,
            start_date: row.start_date,
            end_date: row.end_date,
            business_id: row.business_id,
            is_active: row.is_active,
            is_spin_exclusive: row.is_spin_exclusive,
            business: Business {
                name: row.business_name.unwrap_or_else(|| "Unknown Business".to_string()),
                address: row.business_address.unwrap_or_else(|| "Address not available".to_string()),
                location: row.business_location.unwrap_or_default(),
            },
        })
    }
}

/// A deal card as the listing page renders it
#[derive(Debug, Serialize)]
pub struct DealListing {
    #[serde(flatten)]
    pub deal: Deal,
    pub discount_label: String,
    pub distance_miles: Option<f64>,
    pub distance_label: Option<String>,
}

impl From<RankedDeal> for DealListing {
    fn from(ranked: RankedDeal) -> Self {
        Self {
            discount_label: ranked.deal.discount_label(),
            distance_label: ranked.distance_label(),
            distance_miles: ranked.distance_miles,
            deal: ranked.deal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> DealRow {
        DealRow {
            id: Uuid::new_v4(),
            title: "Free Pizza Slice".to_string(),
            description: None,
            discount_type: "percentage".to_string(),
            discount_amount: 15.0,
            start_date: "2024-01-01T00:00:00Z".parse().unwrap(),
            end_date: "2024-12-31T00:00:00Z".parse().unwrap(),
            business_id: Uuid::new_v4(),
            is_active: true,
            is_spin_exclusive: false,
            business_name: None,
            business_address: Some("12 Elm St".to_string()),
            business_location: Some("POINT(-74.006 40.7128)".to_string()),
        }
    }

    #[test]
    fn test_row_into_deal() {
        let deal = Deal::try_from(row()).unwrap();
        assert_eq!(deal.discount_type, DiscountType::Percentage);
        assert_eq!(deal.description, "");
        assert_eq!(deal.business.name, "Unknown Business");
        assert!(deal.coordinate().is_some());
    }

    #[test]
    fn test_unknown_discount_type_is_rejected() {
        let mut bad = row();
        bad.discount_type = "bogo".to_string();
        assert!(Deal::try_from(bad).is_err());
    }

    #[test]
    fn test_listing_labels() {
        let listing = DealListing::from(RankedDeal { deal: Deal::try_from(row()).unwrap(), distance_miles: Some(1.26) });
        assert_eq!(listing.discount_label, "15% off");
        assert_eq!(listing.distance_label.as_deref(), Some("1.3 miles away"));

        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["title"], "Free Pizza Slice");
        assert_eq!(json["business"]["address"], "12 Elm St");
    }
}
