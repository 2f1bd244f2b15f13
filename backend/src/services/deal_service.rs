use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;
use zilk_shared::deal_ranking::Deal;

use crate::models::DealRow;

const DEAL_COLUMNS: &str = r#"
    SELECT
        d.id,
        d.title,
        d.description,
        d.discount_type,
        d.discount_amount::float8 AS discount_amount,
        d.start_date,
        d.end_date,
        d.business_id,
        d.is_active,
        COALESCE(d.is_spin_exclusive, false) AS is_spin_exclusive,
        b.name AS business_name,
        b.address AS business_address,
        ST_AsText(b.location::geometry) AS business_location
    FROM deals d
    LEFT JOIN businesses b ON b.id = d.business_id
"#;

fn into_deals(rows: Vec<DealRow>) -> Vec<Deal> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            match Deal::try_from(row) {
                Ok(deal) => Some(deal),
                Err(e) => {
                    warn!("Skipping deal {}: {}", id, e);
                    None
                }
            }
        })
        .collect()
}

/// Active deals with their businesses. Expiry is checked by the caller.
pub async fn fetch_active_deals(pool: &PgPool) -> Result<Vec<Deal>, sqlx::Error> {
    let query = format!("{} WHERE d.is_active = true", DEAL_COLUMNS);
    let rows = sqlx::query_as::<_, DealRow>(&query).fetch_all(pool).await?;
    Ok(into_deals(rows))
}

pub async fn fetch_deal(pool: &PgPool, deal_id: Uuid) -> Result<Option<Deal>, sqlx::Error> {
    let query = format!("{} WHERE d.id = $1", DEAL_COLUMNS);
    let row = sqlx::query_as::<_, DealRow>(&query)
        .bind(deal_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| into_deals(vec![row])).and_then(|mut deals| deals.pop()))
}
