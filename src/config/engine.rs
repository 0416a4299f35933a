//! Engine configuration structures.

use serde::{Deserialize, Serialize};

use crate::core::availability::DEFAULT_SEARCH_DAYS;
use crate::core::entitlement::DEFAULT_SESSION_MINUTES;

/// One row of the expiry rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryRuleConfig {
    /// Language the rule applies to; unset matches any language.
    #[serde(default)]
    pub language: Option<String>,
    /// Smallest session count covered.
    pub min_sessions: u32,
    /// Largest session count covered; unset means unbounded.
    #[serde(default)]
    pub max_sessions: Option<u32>,
    /// Days of validity counted from the reference date.
    pub validity_days: u32,
}

impl ExpiryRuleConfig {
    /// Validate a single rule.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(max) = self.max_sessions {
            if max < self.min_sessions {
                return Err(format!(
                    "max_sessions {max} is below min_sessions {}",
                    self.min_sessions
                ));
            }
        }
        if self.validity_days == 0 {
            return Err("validity_days must be greater than 0".into());
        }
        Ok(())
    }
}

/// Root engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tenant the engine instance serves.
    pub tenant: String,
    /// Minutes per purchased session.
    #[serde(default = "default_session_minutes")]
    pub session_minutes: u32,
    /// Availability horizon when no end date is given.
    #[serde(default = "default_search_days")]
    pub default_search_days: u64,
    /// Audit events kept in memory.
    #[serde(default = "default_audit_buffer")]
    pub audit_buffer: usize,
    /// Expiry rules, first match wins.
    #[serde(default)]
    pub expiry_rules: Vec<ExpiryRuleConfig>,
}

const fn default_session_minutes() -> u32 {
    DEFAULT_SESSION_MINUTES
}

const fn default_search_days() -> u64 {
    DEFAULT_SEARCH_DAYS
}

const fn default_audit_buffer() -> usize {
    1024
}

impl EngineConfig {
    /// Defaults for `tenant`.
    pub fn new(tenant: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            session_minutes: default_session_minutes(),
            default_search_days: default_search_days(),
            audit_buffer: default_audit_buffer(),
            expiry_rules: Vec::new(),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.tenant.trim().is_empty() {
            return Err("tenant must not be empty".into());
        }
        if self.session_minutes == 0 {
            return Err("session_minutes must be greater than 0".into());
        }
        if self.default_search_days == 0 {
            return Err("default_search_days must be greater than 0".into());
        }
        for (index, rule) in self.expiry_rules.iter().enumerate() {
            rule.validate()
                .map_err(|e| format!("expiry rule #{index} invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse engine configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the environment, loading `.env` first.
    ///
    /// Reads `SCHEDULER_TENANT` (required), `SCHEDULER_SESSION_MINUTES`,
    /// `SCHEDULER_DEFAULT_SEARCH_DAYS`, `SCHEDULER_AUDIT_BUFFER` and
    /// `SCHEDULER_EXPIRY_RULES` (a JSON array of rules).
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let tenant = lookup("SCHEDULER_TENANT").ok_or("SCHEDULER_TENANT is not set")?;
        let mut cfg = Self::new(tenant);
        if let Some(raw) = lookup("SCHEDULER_SESSION_MINUTES") {
            cfg.session_minutes = parse_var("SCHEDULER_SESSION_MINUTES", &raw)?;
        }
        if let Some(raw) = lookup("SCHEDULER_DEFAULT_SEARCH_DAYS") {
            cfg.default_search_days = parse_var("SCHEDULER_DEFAULT_SEARCH_DAYS", &raw)?;
        }
        if let Some(raw) = lookup("SCHEDULER_AUDIT_BUFFER") {
            cfg.audit_buffer = parse_var("SCHEDULER_AUDIT_BUFFER", &raw)?;
        }
        if let Some(raw) = lookup("SCHEDULER_EXPIRY_RULES") {
            cfg.expiry_rules = serde_json::from_str(&raw)
                .map_err(|e| format!("SCHEDULER_EXPIRY_RULES: {e}"))?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| format!("{key}: {e}"))
}
