//! Common types used across Fintrack

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Subscription Tiers
// =============================================================================

/// Subscription tier for billing
///
/// Declaration order defines the tier order: Free < Pro < Premium.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Free,
    Pro,
    Premium,
}

impl Default for SubscriptionTier {
    fn default() -> Self {
        Self::Free
    }
}

impl SubscriptionTier {
    /// All tiers in ascending order
    pub const ALL: [SubscriptionTier; 3] = [Self::Free, Self::Pro, Self::Premium];

    /// Numeric rank: free=0, pro=1, premium=2
    pub fn rank(&self) -> u8 {
        match self {
            Self::Free => 0,
            Self::Pro => 1,
            Self::Premium => 2,
        }
    }

    /// Check whether this tier meets or exceeds a required tier
    pub fn is_at_least(&self, required: SubscriptionTier) -> bool {
        self.rank() >= required.rank()
    }

    /// The next tier up, suggested when access is denied
    ///
    /// Free upgrades to Pro; everything else points at Premium.
    pub fn upgrade_target(&self) -> SubscriptionTier {
        match self {
            Self::Free => Self::Pro,
            _ => Self::Premium,
        }
    }

    /// Parse a tier from an untrusted string, normalizing unknown input to Free
    ///
    /// Tier strings come from the external billing/account system. A corrupted
    /// or malicious value never grants more than free-tier access, so the
    /// fallback is deliberate and silent.
    pub fn from_str_lossy(s: &str) -> Self {
        s.parse().unwrap_or(Self::Free)
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Pro => write!(f, "pro"),
            Self::Premium => write!(f, "premium"),
        }
    }
}

impl std::str::FromStr for SubscriptionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            "premium" => Ok(Self::Premium),
            _ => Err(format!("Invalid subscription tier: {}", s)),
        }
    }
}

// =============================================================================
// Metered Credit Types
// =============================================================================

/// Storage accessor backing a credit type's usage counters
///
/// AI credit types share the `ai_usage` table; everything else is stubbed as
/// always-zero until a dedicated table exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageStorage {
    AiUsage,
    Unmetered,
}

/// A consumable, rate-limited allowance for a metered action
///
/// Closed set: adding a metered feature means adding a variant here and one
/// arm in `storage()`, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum CreditType {
    AiChat,
    AiDigestRegeneration,
    BankSync,
}

impl CreditType {
    /// All credit types
    pub const ALL: [CreditType; 3] = [Self::AiChat, Self::AiDigestRegeneration, Self::BankSync];

    /// Which store holds this credit type's counters
    pub fn storage(&self) -> UsageStorage {
        match self {
            Self::AiChat | Self::AiDigestRegeneration => UsageStorage::AiUsage,
            Self::BankSync => UsageStorage::Unmetered,
        }
    }

    /// Whether the free tier meters this credit against a lifetime allowance
    /// instead of a rolling period
    pub fn lifetime_gated(&self) -> bool {
        matches!(self, Self::AiChat)
    }

    /// Plural noun for quota messages shown to end users
    pub fn noun(&self) -> &'static str {
        match self {
            Self::AiChat => "AI questions",
            Self::AiDigestRegeneration => "digest regenerations",
            Self::BankSync => "bank syncs",
        }
    }
}

impl std::fmt::Display for CreditType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AiChat => write!(f, "aiChat"),
            Self::AiDigestRegeneration => write!(f, "aiDigestRegeneration"),
            Self::BankSync => write!(f, "bankSync"),
        }
    }
}

impl std::str::FromStr for CreditType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aiChat" => Ok(Self::AiChat),
            "aiDigestRegeneration" => Ok(Self::AiDigestRegeneration),
            "bankSync" => Ok(Self::BankSync),
            _ => Err(format!("Invalid credit type: {}", s)),
        }
    }
}

// =============================================================================
// Credit Periods
// =============================================================================

/// Rolling window over which a credit's usage counter resets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditPeriod {
    Daily,
    Weekly,
    Monthly,
    Lifetime,
}

impl CreditPeriod {
    /// The window named in quota messages ("today", "this week", "this month")
    pub fn window_name(&self) -> &'static str {
        match self {
            Self::Daily => "today",
            Self::Weekly => "this week",
            Self::Monthly => "this month",
            Self::Lifetime => "in total",
        }
    }

    /// When the user can retry after exhausting the window
    pub fn retry_hint(&self) -> &'static str {
        match self {
            Self::Daily => "tomorrow",
            Self::Weekly => "next week",
            Self::Monthly => "next month",
            Self::Lifetime => "after upgrading",
        }
    }
}

impl std::fmt::Display for CreditPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
            Self::Lifetime => write!(f, "lifetime"),
        }
    }
}

// =============================================================================
// Limits
// =============================================================================

/// A quota value: a non-negative count or unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Limit {
    Limited(u64),
    Unlimited,
}

impl Limit {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited)
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Limited(0))
    }

    /// Remaining quota after `used` consumptions, clamped at zero
    pub fn remaining_after(&self, used: i64) -> Limit {
        match self {
            Self::Limited(limit) => {
                let used = u64::try_from(used).unwrap_or(0);
                Self::Limited(limit.saturating_sub(used))
            }
            Self::Unlimited => Self::Unlimited,
        }
    }

    /// Render for display: the count, or the literal "unlimited"
    pub fn display(&self) -> String {
        match self {
            Self::Limited(n) => n.to_string(),
            Self::Unlimited => "unlimited".to_string(),
        }
    }
}

impl Ord for Limit {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (Self::Unlimited, Self::Unlimited) => Ordering::Equal,
            (Self::Unlimited, Self::Limited(_)) => Ordering::Greater,
            (Self::Limited(_), Self::Unlimited) => Ordering::Less,
            (Self::Limited(a), Self::Limited(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Limit {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Limited(n) => write!(f, "{}", n),
            Self::Unlimited => write!(f, "unlimited"),
        }
    }
}

// =============================================================================
// Usage Records
// =============================================================================

/// Per-user, per-credit-type usage counters
///
/// Reset timestamps are local wall-clock time. Counters are only ever mutated
/// through the metering service's increment path; a missing record means zero
/// usage and is materialized lazily on first write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UsageRecord {
    pub user_id: Uuid,
    pub credit_type: CreditType,
    pub count_today: i64,
    pub count_this_week: i64,
    pub count_this_month: i64,
    pub count_lifetime: i64,
    pub last_daily_reset: NaiveDateTime,
    pub last_weekly_reset: NaiveDateTime,
    pub last_monthly_reset: NaiveDateTime,
}

impl UsageRecord {
    /// A fresh record with zero counters and reset stamps at `now`
    pub fn zeroed(user_id: Uuid, credit_type: CreditType, now: NaiveDateTime) -> Self {
        Self {
            user_id,
            credit_type,
            count_today: 0,
            count_this_week: 0,
            count_this_month: 0,
            count_lifetime: 0,
            last_daily_reset: now,
            last_weekly_reset: now,
            last_monthly_reset: now,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_tier_default() {
        assert_eq!(SubscriptionTier::default(), SubscriptionTier::Free);
    }

    #[test]
    fn test_tier_order() {
        assert!(SubscriptionTier::Free < SubscriptionTier::Pro);
        assert!(SubscriptionTier::Pro < SubscriptionTier::Premium);
        assert_eq!(SubscriptionTier::Free.rank(), 0);
        assert_eq!(SubscriptionTier::Pro.rank(), 1);
        assert_eq!(SubscriptionTier::Premium.rank(), 2);
    }

    #[test]
    fn test_tier_is_at_least() {
        assert!(SubscriptionTier::Premium.is_at_least(SubscriptionTier::Free));
        assert!(SubscriptionTier::Pro.is_at_least(SubscriptionTier::Pro));
        assert!(!SubscriptionTier::Free.is_at_least(SubscriptionTier::Pro));
    }

    #[test]
    fn test_tier_upgrade_target() {
        assert_eq!(
            SubscriptionTier::Free.upgrade_target(),
            SubscriptionTier::Pro
        );
        assert_eq!(
            SubscriptionTier::Pro.upgrade_target(),
            SubscriptionTier::Premium
        );
        assert_eq!(
            SubscriptionTier::Premium.upgrade_target(),
            SubscriptionTier::Premium
        );
    }

    #[test]
    fn test_tier_from_str() {
        assert_eq!(
            "free".parse::<SubscriptionTier>().unwrap(),
            SubscriptionTier::Free
        );
        assert_eq!(
            "PREMIUM".parse::<SubscriptionTier>().unwrap(),
            SubscriptionTier::Premium
        );
        assert!("platinum".parse::<SubscriptionTier>().is_err());
    }

    #[test]
    fn test_tier_from_str_lossy_normalizes_unknown() {
        assert_eq!(
            SubscriptionTier::from_str_lossy("bogus"),
            SubscriptionTier::Free
        );
        assert_eq!(SubscriptionTier::from_str_lossy(""), SubscriptionTier::Free);
        assert_eq!(
            SubscriptionTier::from_str_lossy("pro"),
            SubscriptionTier::Pro
        );
    }

    #[test]
    fn test_credit_type_roundtrip() {
        for ct in CreditType::ALL {
            assert_eq!(ct.to_string().parse::<CreditType>().unwrap(), ct);
        }
        assert!("espresso".parse::<CreditType>().is_err());
    }

    #[test]
    fn test_credit_type_storage_dispatch() {
        assert_eq!(CreditType::AiChat.storage(), UsageStorage::AiUsage);
        assert_eq!(
            CreditType::AiDigestRegeneration.storage(),
            UsageStorage::AiUsage
        );
        assert_eq!(CreditType::BankSync.storage(), UsageStorage::Unmetered);
    }

    #[test]
    fn test_credit_type_lifetime_gating() {
        assert!(CreditType::AiChat.lifetime_gated());
        assert!(!CreditType::AiDigestRegeneration.lifetime_gated());
        assert!(!CreditType::BankSync.lifetime_gated());
    }

    #[test]
    fn test_period_messages() {
        assert_eq!(CreditPeriod::Daily.window_name(), "today");
        assert_eq!(CreditPeriod::Daily.retry_hint(), "tomorrow");
        assert_eq!(CreditPeriod::Weekly.window_name(), "this week");
        assert_eq!(CreditPeriod::Weekly.retry_hint(), "next week");
        assert_eq!(CreditPeriod::Monthly.window_name(), "this month");
        assert_eq!(CreditPeriod::Monthly.retry_hint(), "next month");
    }

    #[test]
    fn test_limit_ordering() {
        assert!(Limit::Limited(0) < Limit::Limited(1));
        assert!(Limit::Limited(u64::MAX) < Limit::Unlimited);
        assert_eq!(Limit::Unlimited, Limit::Unlimited);
    }

    #[test]
    fn test_limit_remaining_after() {
        assert_eq!(Limit::Limited(5).remaining_after(3), Limit::Limited(2));
        assert_eq!(Limit::Limited(5).remaining_after(9), Limit::Limited(0));
        // Negative counts cannot reduce the quota
        assert_eq!(Limit::Limited(5).remaining_after(-1), Limit::Limited(5));
        assert_eq!(Limit::Unlimited.remaining_after(1_000_000), Limit::Unlimited);
    }

    #[test]
    fn test_limit_display() {
        assert_eq!(Limit::Limited(42).display(), "42");
        assert_eq!(Limit::Unlimited.display(), "unlimited");
    }

    #[test]
    fn test_usage_record_zeroed() {
        let now = NaiveDate::from_ymd_opt(2025, 3, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        let record = UsageRecord::zeroed(Uuid::new_v4(), CreditType::AiChat, now);
        assert_eq!(record.count_today, 0);
        assert_eq!(record.count_lifetime, 0);
        assert_eq!(record.last_daily_reset, now);
        assert_eq!(record.last_weekly_reset, now);
        assert_eq!(record.last_monthly_reset, now);
    }
}
