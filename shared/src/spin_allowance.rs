use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::constants::{
    BONUS_ALREADY_CLAIMED_ERROR, INVALID_PHONE_ERROR, NO_SPINS_LEFT_ERROR, PHONE_ALREADY_USED_ERROR,
    SPIN_STILL_AVAILABLE_ERROR,
};
use crate::validation::validate_phone_number;

pub const SPIN_COOLDOWN_HOURS: i64 = 24;

pub const DEVICE_ID_KEY: &str = "zilk_device_id";
pub const LAST_SPIN_KEY: &str = "lastSpinDate";
pub const PHONE_SUBMITTED_KEY: &str = "spinPhoneSubmitted";
pub const BONUS_USED_KEY: &str = "spinBonusUsed";

/// Client-side string store, the role browser local storage plays in the web app.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Returns the anonymous device id, creating and storing one on first use.
pub fn device_id<S: KeyValueStore + ?Sized>(store: &mut S) -> Uuid {
    if let Some(id) = store.get(DEVICE_ID_KEY).and_then(|raw| Uuid::parse_str(&raw).ok()) {
        return id;
    }
    let id = Uuid::new_v4();
    store.set(DEVICE_ID_KEY, &id.to_string());
    id
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpinError {
    NoSpinsRemaining { next_spin_at: DateTime<Utc> },
    InvalidPhoneNumber,
    /// The phone number already earned a bonus spin, on any device.
    PhoneAlreadyUsed,
    /// This device already claimed its bonus in the current window.
    BonusAlreadyClaimed,
    SpinStillAvailable,
}

impl fmt::Display for SpinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSpinsRemaining { next_spin_at } => {
                write!(f, "{} Next spin at {}", NO_SPINS_LEFT_ERROR, next_spin_at.to_rfc3339())
            }
            Self::InvalidPhoneNumber => f.write_str(INVALID_PHONE_ERROR),
            Self::PhoneAlreadyUsed => f.write_str(PHONE_ALREADY_USED_ERROR),
            Self::BonusAlreadyClaimed => f.write_str(BONUS_ALREADY_CLAIMED_ERROR),
            Self::SpinStillAvailable => f.write_str(SPIN_STILL_AVAILABLE_ERROR),
        }
    }
}

impl std::error::Error for SpinError {}

/// Daily free spin plus one phone-number bonus spin, tracked in a [`KeyValueStore`].
#[derive(Debug)]
pub struct SpinAllowance<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> SpinAllowance<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        self.store
            .get(key)
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|t| t.with_timezone(&Utc))
    }

    pub fn last_spin_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp(LAST_SPIN_KEY)
    }

    pub fn next_spin_at(&self) -> Option<DateTime<Utc>> {
        self.last_spin_at().map(|t| t + Duration::hours(SPIN_COOLDOWN_HOURS))
    }

    fn flag(&self, key: &str) -> bool {
        self.store.get(key).is_some()
    }

    /// Spins available at `now`. An expired window clears the stored state.
    pub fn spins_remaining(&mut self, now: DateTime<Utc>) -> u32 {
        let last_spin = match self.last_spin_at() {
            Some(t) => t,
            None => return 1,
        };

        if now - last_spin >= Duration::hours(SPIN_COOLDOWN_HOURS) {
            self.store.remove(LAST_SPIN_KEY);
            self.store.remove(PHONE_SUBMITTED_KEY);
            self.store.remove(BONUS_USED_KEY);
            return 1;
        }

        if self.flag(PHONE_SUBMITTED_KEY) && !self.flag(BONUS_USED_KEY) {
            1
        } else {
            0
        }
    }

    /// Uses the daily spin, or the bonus spin once the daily one is gone.
    /// The bonus spin does not move the cooldown window.
    pub fn record_spin(&mut self, now: DateTime<Utc>) -> Result<(), SpinError> {
        if self.spins_remaining(now) == 0 {
            let next_spin_at = self
                .next_spin_at()
                .unwrap_or(now + Duration::hours(SPIN_COOLDOWN_HOURS));
            return Err(SpinError::NoSpinsRemaining { next_spin_at });
        }

        if self.last_spin_at().is_some() {
            self.store.set(BONUS_USED_KEY, &now.to_rfc3339());
        } else {
            self.store.set(LAST_SPIN_KEY, &now.to_rfc3339());
        }
        Ok(())
    }

    /// Grants one extra spin for a phone number once the daily spin is used.
    /// Whether the number was used elsewhere is for the server to decide.
    pub fn grant_phone_bonus(&mut self, phone: &str, now: DateTime<Utc>) -> Result<(), SpinError> {
        validate_phone_number(phone).map_err(|_| SpinError::InvalidPhoneNumber)?;

        if self.spins_remaining(now) > 0 {
            return Err(SpinError::SpinStillAvailable);
        }
        if self.flag(PHONE_SUBMITTED_KEY) {
            return Err(SpinError::BonusAlreadyClaimed);
        }

        self.store.set(PHONE_SUBMITTED_KEY, "true");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(raw: &str) -> DateTime<Utc> {
        raw.parse().unwrap()
    }

    #[test]
    fn test_device_id_is_stable() {
        let mut store = MemoryStore::new();
        let first = device_id(&mut store);
        assert_eq!(device_id(&mut store), first);

        store.set(DEVICE_ID_KEY, "not-a-uuid");
        assert_ne!(device_id(&mut store), first);
    }

    #[test]
    fn test_one_spin_per_day() {
        let mut allowance = SpinAllowance::new(MemoryStore::new());
        let now = at("2024-05-01T12:00:00Z");
        assert_eq!(allowance.spins_remaining(now), 1);
        allowance.record_spin(now).unwrap();
        assert_eq!(allowance.spins_remaining(now + Duration::hours(23)), 0);

        let err = allowance.record_spin(now + Duration::hours(1)).unwrap_err();
        assert_eq!(err, SpinError::NoSpinsRemaining { next_spin_at: at("2024-05-02T12:00:00Z") });

        assert_eq!(allowance.spins_remaining(now + Duration::hours(24)), 1);
        assert!(allowance.last_spin_at().is_none());
    }

    #[test]
    fn test_phone_bonus_spin() {
        let mut allowance = SpinAllowance::new(MemoryStore::new());
        let now = at("2024-05-01T12:00:00Z");

        assert_eq!(allowance.grant_phone_bonus("+1 555-123-4567", now), Err(SpinError::SpinStillAvailable));
        allowance.record_spin(now).unwrap();

        assert_eq!(allowance.grant_phone_bonus("12345", now), Err(SpinError::InvalidPhoneNumber));
        let later = now + Duration::minutes(5);
        allowance.grant_phone_bonus("+1 555-123-4567", later).unwrap();
        assert_eq!(allowance.spins_remaining(later), 1);

        let spin_time = later + Duration::minutes(1);
        allowance.record_spin(spin_time).unwrap();
        assert_eq!(allowance.spins_remaining(spin_time), 0);
        assert_eq!(
            allowance.grant_phone_bonus("+1 555-123-4567", spin_time),
            Err(SpinError::BonusAlreadyClaimed)
        );
    }

    #[test]
    fn test_bonus_granted_at_the_spin_instant_is_usable() {
        let mut allowance = SpinAllowance::new(MemoryStore::new());
        let now = at("2024-05-01T12:00:00Z");

        allowance.record_spin(now).unwrap();
        allowance.grant_phone_bonus("5551234567", now).unwrap();
        assert_eq!(allowance.spins_remaining(now), 1);

        allowance.record_spin(now).unwrap();
        assert_eq!(allowance.spins_remaining(now), 0);
        assert_eq!(allowance.next_spin_at(), Some(at("2024-05-02T12:00:00Z")));
    }

    #[test]
    fn test_new_window_clears_bonus_state() {
        let mut allowance = SpinAllowance::new(MemoryStore::new());
        let now = at("2024-05-01T12:00:00Z");
        allowance.record_spin(now).unwrap();
        allowance.grant_phone_bonus("5551234567", now).unwrap();
        allowance.record_spin(now).unwrap();

        let tomorrow = now + Duration::hours(25);
        assert_eq!(allowance.spins_remaining(tomorrow), 1);
        assert!(allowance.store().get(PHONE_SUBMITTED_KEY).is_none());
        assert!(allowance.store().get(BONUS_USED_KEY).is_none());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(SpinError::PhoneAlreadyUsed.to_string(), PHONE_ALREADY_USED_ERROR);
        assert_ne!(SpinError::BonusAlreadyClaimed.to_string(), PHONE_ALREADY_USED_ERROR);
    }

    #[test]
    fn test_corrupt_timestamp_counts_as_absent() {
        let mut store = MemoryStore::new();
        store.set(LAST_SPIN_KEY, "yesterday-ish");
        let mut allowance = SpinAllowance::new(store);
        assert_eq!(allowance.spins_remaining(at("2024-05-01T12:00:00Z")), 1);
    }
}
