use std::env;

use anyhow::{anyhow, Context};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub session_ttl_hours: i64,
    /// Offset of the shop's wall clock from UTC, in minutes.
    pub shop_utc_offset_minutes: i32,
}

const MAX_OFFSET_MINUTES: i32 = 14 * 60;

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string());
        let session_ttl_hours = lookup("SESSION_TTL_HOURS")
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(24);

        let shop_utc_offset_minutes = match lookup("SHOP_UTC_OFFSET_MINUTES") {
            Some(raw) => raw
                .trim()
                .parse::<i32>()
                .with_context(|| format!("SHOP_UTC_OFFSET_MINUTES is not an integer: {raw}"))?,
            None => 0,
        };
        if shop_utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(anyhow!(
                "SHOP_UTC_OFFSET_MINUTES must be within +/-{MAX_OFFSET_MINUTES}"
            ));
        }

        Ok(Self {
            database_url,
            bind_addr,
            session_ttl_hours,
            shop_utc_offset_minutes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")])).unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:8080");
        assert_eq!(cfg.session_ttl_hours, 24);
        assert_eq!(cfg.shop_utc_offset_minutes, 0);
    }

    #[test]
    fn test_database_url_required() {
        assert!(Config::from_lookup(lookup_from(&[])).is_err());
    }

    #[test]
    fn test_offset_parsing() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("SHOP_UTC_OFFSET_MINUTES", "-300"),
            ("SESSION_TTL_HOURS", "not-a-number"),
        ]))
        .unwrap();
        assert_eq!(cfg.shop_utc_offset_minutes, -300);
        assert_eq!(cfg.session_ttl_hours, 24);

        assert!(Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("SHOP_UTC_OFFSET_MINUTES", "900"),
        ]))
        .is_err());
        assert!(Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("SHOP_UTC_OFFSET_MINUTES", "two"),
        ]))
        .is_err());
    }
}
