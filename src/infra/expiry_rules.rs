//! Expiry rule lookups.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

use crate::config::ExpiryRuleConfig;
use crate::core::ExpiryRuleLookup;

/// Lookup that never yields an expiry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExpiryRules;

impl ExpiryRuleLookup for NoExpiryRules {
    fn calculate_expiry_date(
        &self,
        _language: Option<&str>,
        _session_count: u32,
        _reference_date: NaiveDate,
    ) -> Option<DateTime<Utc>> {
        None
    }
}

/// Rule table keyed by language and session count. First match wins.
#[derive(Debug, Clone, Default)]
pub struct RuleTableExpiryLookup {
    rules: Vec<ExpiryRuleConfig>,
}

impl RuleTableExpiryLookup {
    /// Lookup over `rules` in priority order.
    pub const fn new(rules: Vec<ExpiryRuleConfig>) -> Self {
        Self { rules }
    }

    fn find(&self, language: Option<&str>, session_count: u32) -> Option<&ExpiryRuleConfig> {
        self.rules.iter().find(|rule| {
            let language_ok = rule
                .language
                .as_deref()
                .is_none_or(|wanted| language == Some(wanted));
            let upper_ok = rule.max_sessions.is_none_or(|max| session_count <= max);
            language_ok && session_count >= rule.min_sessions && upper_ok
        })
    }
}

impl ExpiryRuleLookup for RuleTableExpiryLookup {
    /// The entitlement stays valid through the last day of its validity
    /// period, so expiry is the end of that day in UTC.
    fn calculate_expiry_date(
        &self,
        language: Option<&str>,
        session_count: u32,
        reference_date: NaiveDate,
    ) -> Option<DateTime<Utc>> {
        let rule = self.find(language, session_count)?;
        let last_day = reference_date.checked_add_days(Days::new(u64::from(rule.validity_days)))?;
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59)?;
        Some(last_day.and_time(end_of_day).and_utc())
    }
}
