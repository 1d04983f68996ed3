use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database_url: String,
    pub sync_interval_minutes: u64,
    pub settlement_day_of_month: u32,
    pub source_fetch_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let sync_interval_minutes: u64 = parse_var("SYNC_INTERVAL_MINUTES", 15)?;
        if sync_interval_minutes == 0 {
            return Err(config::ConfigError::Message(
                "SYNC_INTERVAL_MINUTES must be at least 1".to_string(),
            ));
        }

        // Capped at 28 so the trigger day exists in every month.
        let settlement_day_of_month: u32 = parse_var("SETTLEMENT_DAY_OF_MONTH", 7)?;
        if !(1..=28).contains(&settlement_day_of_month) {
            return Err(config::ConfigError::Message(
                "SETTLEMENT_DAY_OF_MONTH must be between 1 and 28".to_string(),
            ));
        }

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/salarysync".to_string()),
            sync_interval_minutes,
            settlement_day_of_month,
            source_fetch_timeout_secs: parse_var("SOURCE_FETCH_TIMEOUT_SECS", 60)?,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, config::ConfigError>
where
    T: FromStr,
{
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            config::ConfigError::Message(format!("{name} must be an integer, got {raw:?}"))
        }),
        Err(_) => Ok(default),
    }
}
