use chrono::{DateTime, Utc};
use redis::Client as RedisClient;
use tracing::info;
use uuid::Uuid;
use zilk_shared::prize_wheel::DEAL_SPINS_PER_USER;
use zilk_shared::spin_allowance::{SpinError, SPIN_COOLDOWN_HOURS};
use zilk_shared::validation::validate_phone_number;

use crate::error::AppError;

pub const PROMO_SPIN_COOLDOWN: i64 = SPIN_COOLDOWN_HOURS * 3600;
pub const PHONE_NUMBERS_KEY: &str = "phone_numbers";

pub fn cooldown_key(device_id: Uuid) -> String {
    format!("spin_cooldown:{}", device_id)
}

pub fn bonus_claim_key(device_id: Uuid) -> String {
    format!("spin_phone:{}", device_id)
}

pub fn bonus_spin_key(device_id: Uuid) -> String {
    format!("spin_bonus:{}", device_id)
}

/// Digits plus an optional leading `+`, so spacing and dashes can't register a number twice.
pub fn normalize_phone(phone: &str) -> String {
    let phone = phone.trim();
    let prefix = if phone.starts_with('+') { "+" } else { "" };
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    format!("{}{}", prefix, digits)
}

pub fn deal_spins_key(deal_id: Uuid, device_id: Uuid) -> String {
    format!("deal_spins:{}:{}", deal_id, device_id)
}

/// Seconds until the device may spin the promotional wheel again, 0 when it may spin now.
pub async fn promo_cooldown_seconds(redis: &RedisClient, device_id: Uuid) -> Result<i64, redis::RedisError> {
    let mut conn = redis.get_async_connection().await?;

    // TTL is negative when the key doesn't exist
    let ttl: i64 = redis::cmd("TTL")
        .arg(cooldown_key(device_id))
        .query_async(&mut conn)
        .await?;

    Ok(ttl.max(0))
}

pub async fn bonus_spin_available(redis: &RedisClient, device_id: Uuid) -> Result<bool, redis::RedisError> {
    let mut conn = redis.get_async_connection().await?;

    let exists: i64 = redis::cmd("EXISTS")
        .arg(bonus_spin_key(device_id))
        .query_async(&mut conn)
        .await?;

    Ok(exists > 0)
}

/// Starts the cooldown if none is running, otherwise spends a granted bonus spin.
/// Returns false when the device is cooling down with no bonus left.
pub async fn claim_promo_spin(redis: &RedisClient, device_id: Uuid) -> Result<bool, redis::RedisError> {
    let mut conn = redis.get_async_connection().await?;

    let set: Option<String> = redis::cmd("SET")
        .arg(cooldown_key(device_id))
        .arg(1)
        .arg("NX")
        .arg("EX")
        .arg(PROMO_SPIN_COOLDOWN)
        .query_async(&mut conn)
        .await?;

    if set.is_some() {
        return Ok(true);
    }

    let removed: i64 = redis::cmd("DEL")
        .arg(bonus_spin_key(device_id))
        .query_async(&mut conn)
        .await?;

    if removed > 0 {
        info!("📱 BONUS SPIN: device {} used its phone bonus", device_id);
    }
    Ok(removed > 0)
}

/// Records `phone` and grants one extra promotional spin for the current cooldown window.
/// A number earns a bonus once across all devices, and a device claims at most one per window.
pub async fn grant_phone_bonus(redis: &RedisClient, device_id: Uuid, phone: &str) -> Result<(), AppError> {
    validate_phone_number(phone).map_err(|_| SpinError::InvalidPhoneNumber)?;

    let mut conn = redis.get_async_connection().await?;

    let cooldown: i64 = redis::cmd("TTL")
        .arg(cooldown_key(device_id))
        .query_async(&mut conn)
        .await?;
    if cooldown <= 0 {
        return Err(SpinError::SpinStillAvailable.into());
    }

    let claimed: Option<String> = redis::cmd("SET")
        .arg(bonus_claim_key(device_id))
        .arg(1)
        .arg("NX")
        .arg("EX")
        .arg(cooldown)
        .query_async(&mut conn)
        .await?;
    if claimed.is_none() {
        return Err(SpinError::BonusAlreadyClaimed.into());
    }

    let added: i64 = redis::cmd("SADD")
        .arg(PHONE_NUMBERS_KEY)
        .arg(normalize_phone(phone))
        .query_async(&mut conn)
        .await?;
    if added == 0 {
        // Free the device to try a different number
        let _: i64 = redis::cmd("DEL")
            .arg(bonus_claim_key(device_id))
            .query_async(&mut conn)
            .await?;
        return Err(SpinError::PhoneAlreadyUsed.into());
    }

    let _: () = redis::cmd("SET")
        .arg(bonus_spin_key(device_id))
        .arg(1)
        .arg("EX")
        .arg(cooldown)
        .query_async(&mut conn)
        .await?;

    info!("📱 PHONE BONUS: device {} earned a bonus spin", device_id);
    Ok(())
}

pub async fn deal_spins_remaining(redis: &RedisClient, deal_id: Uuid, device_id: Uuid) -> Result<i64, redis::RedisError> {
    let mut conn = redis.get_async_connection().await?;

    let remaining: Option<i64> = redis::cmd("GET")
        .arg(deal_spins_key(deal_id, device_id))
        .query_async(&mut conn)
        .await?;

    Ok(remaining.unwrap_or(DEAL_SPINS_PER_USER).max(0))
}

/// Takes one deal spin. Returns the spins left afterwards, or `None` when none were left.
/// The counter expires with the deal.
pub async fn take_deal_spin(
    redis: &RedisClient,
    deal_id: Uuid,
    device_id: Uuid,
    deal_ends_at: DateTime<Utc>,
) -> Result<Option<i64>, redis::RedisError> {
    let key = deal_spins_key(deal_id, device_id);
    let ttl = (deal_ends_at - Utc::now()).num_seconds().max(1);
    let mut conn = redis.get_async_connection().await?;

    let _: Option<String> = redis::cmd("SET")
        .arg(&key)
        .arg(DEAL_SPINS_PER_USER)
        .arg("NX")
        .arg("EX")
        .arg(ttl)
        .query_async(&mut conn)
        .await?;

    let remaining: i64 = redis::cmd("DECR")
        .arg(&key)
        .query_async(&mut conn)
        .await?;

    if remaining < 0 {
        let _: i64 = redis::cmd("INCR")
            .arg(&key)
            .query_async(&mut conn)
            .await?;
        return Ok(None);
    }

    Ok(Some(remaining))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        let deal = Uuid::nil();
        let device = Uuid::from_u128(1);
        assert_eq!(cooldown_key(device), "spin_cooldown:00000000-0000-0000-0000-000000000001");
        assert_eq!(bonus_spin_key(device), "spin_bonus:00000000-0000-0000-0000-000000000001");
        assert_eq!(
            deal_spins_key(deal, device),
            "deal_spins:00000000-0000-0000-0000-000000000000:00000000-0000-0000-0000-000000000001"
        );
        assert_eq!(PROMO_SPIN_COOLDOWN, 86400);
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone(" +1 555-123-4567 "), "+15551234567");
        assert_eq!(normalize_phone("555 123 4567"), "5551234567");
        assert_eq!(normalize_phone("+1 555-123-4567"), normalize_phone("+15551234567"));
    }

    #[tokio::test]
    async fn test_invalid_phone_fails_before_redis() {
        // Nothing listens here; validation must answer first
        let redis = RedisClient::open("redis://127.0.0.1:1").unwrap();
        let result = grant_phone_bonus(&redis, Uuid::new_v4(), "12345").await;
        assert!(matches!(result, Err(AppError::Spin(SpinError::InvalidPhoneNumber))));
    }

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
    }

    fn random_phone() -> String {
        format!("+1 {:010}", rand::random::<u64>() % 10_000_000_000)
    }

    async fn cleanup(redis: &RedisClient, devices: &[Uuid], phones: &[&str]) {
        let mut conn = redis.get_async_connection().await.unwrap();
        for device in devices {
            let _: i64 = redis::cmd("DEL")
                .arg(cooldown_key(*device))
                .arg(bonus_claim_key(*device))
                .arg(bonus_spin_key(*device))
                .query_async(&mut conn)
                .await
                .unwrap();
        }
        for phone in phones {
            let _: i64 = redis::cmd("SREM")
                .arg(PHONE_NUMBERS_KEY)
                .arg(normalize_phone(phone))
                .query_async(&mut conn)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    #[ignore = "needs a running Redis"]
    async fn test_phone_bonus_grants_one_extra_spin() {
        let redis = RedisClient::open(redis_url()).unwrap();
        let device = Uuid::new_v4();
        let (phone, other_phone) = (random_phone(), random_phone());

        let early = grant_phone_bonus(&redis, device, &phone).await;
        assert!(matches!(early, Err(AppError::Spin(SpinError::SpinStillAvailable))));

        assert!(claim_promo_spin(&redis, device).await.unwrap());
        assert!(!claim_promo_spin(&redis, device).await.unwrap());

        grant_phone_bonus(&redis, device, &phone).await.unwrap();
        assert!(bonus_spin_available(&redis, device).await.unwrap());
        assert!(claim_promo_spin(&redis, device).await.unwrap());
        assert!(!claim_promo_spin(&redis, device).await.unwrap());

        let again = grant_phone_bonus(&redis, device, &other_phone).await;
        assert!(matches!(again, Err(AppError::Spin(SpinError::BonusAlreadyClaimed))));

        cleanup(&redis, &[device], &[&phone, &other_phone]).await;
    }

    #[tokio::test]
    #[ignore = "needs a running Redis"]
    async fn test_phone_number_is_used_once_across_devices() {
        let redis = RedisClient::open(redis_url()).unwrap();
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
        let (phone, other_phone) = (random_phone(), random_phone());

        assert!(claim_promo_spin(&redis, first).await.unwrap());
        assert!(claim_promo_spin(&redis, second).await.unwrap());

        grant_phone_bonus(&redis, first, &phone).await.unwrap();

        let reused = grant_phone_bonus(&redis, second, &phone.replace(' ', "")).await;
        assert!(matches!(reused, Err(AppError::Spin(SpinError::PhoneAlreadyUsed))));
        assert!(!bonus_spin_available(&redis, second).await.unwrap());

        grant_phone_bonus(&redis, second, &other_phone).await.unwrap();
        assert!(bonus_spin_available(&redis, second).await.unwrap());

        cleanup(&redis, &[first, second], &[&phone, &other_phone]).await;
    }
}
