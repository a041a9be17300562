//! Entitlement Catalog
//!
//! Static mapping from subscription tier to feature flags, credit limits, and
//! data limits. This module answers the question: "what does this tier get?"
//!
//! The catalog is immutable data built once at startup and injected into the
//! metering service, so tests can swap in alternate configurations. Unknown
//! tier strings are normalized to Free before they reach the catalog
//! (`SubscriptionTier::from_str_lossy`); the catalog itself is total over the
//! tier enum and has no failure modes.

use fintrack_shared::{CreditPeriod, CreditType, Limit, SubscriptionTier};
use serde::{Deserialize, Serialize};

// =============================================================================
// Features
// =============================================================================

/// Non-metered capabilities gated per tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    CurrencyWidget,
    StockPortfolio,
    CsvExport,
    AiDigest,
    ExtensionSync,
}

impl Feature {
    pub const ALL: [Feature; 5] = [
        Self::CurrencyWidget,
        Self::StockPortfolio,
        Self::CsvExport,
        Self::AiDigest,
        Self::ExtensionSync,
    ];

    /// Human-readable name used in denial messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::CurrencyWidget => "Currency widget",
            Self::StockPortfolio => "Stock portfolio",
            Self::CsvExport => "CSV export",
            Self::AiDigest => "AI digest",
            Self::ExtensionSync => "Browser extension sync",
        }
    }
}

/// Feature flags for a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub currency_widget: bool,
    pub stock_portfolio: bool,
    pub csv_export: bool,
    pub ai_digest: bool,
    pub extension_sync: bool,
}

impl FeatureFlags {
    pub fn has(&self, feature: Feature) -> bool {
        match feature {
            Feature::CurrencyWidget => self.currency_widget,
            Feature::StockPortfolio => self.stock_portfolio,
            Feature::CsvExport => self.csv_export,
            Feature::AiDigest => self.ai_digest,
            Feature::ExtensionSync => self.extension_sync,
        }
    }
}

// =============================================================================
// Credit Limits
// =============================================================================

/// Limit configuration for one metered credit type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditConfig {
    /// Allowance per rolling period
    pub limit: Limit,
    /// The rolling window the allowance applies to
    pub period: CreditPeriod,
    /// Total-allowance override for tiers metered across their whole lifetime
    /// (the free-tier introductory AI bundle)
    pub lifetime_limit: Option<u64>,
}

/// Credit limits for a tier, one entry per credit type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditLimits {
    pub ai_chat: CreditConfig,
    pub ai_digest_regeneration: CreditConfig,
    pub bank_sync: CreditConfig,
}

impl CreditLimits {
    pub fn get(&self, credit_type: CreditType) -> &CreditConfig {
        match credit_type {
            CreditType::AiChat => &self.ai_chat,
            CreditType::AiDigestRegeneration => &self.ai_digest_regeneration,
            CreditType::BankSync => &self.bank_sync,
        }
    }
}

// =============================================================================
// Data Limits
// =============================================================================

/// Structural (non-metered) quota names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataLimit {
    MaxBanks,
    MaxAccountsPerBank,
    MaxCurrenciesPerAccount,
    MaxStocks,
    HistoryRetentionDays,
    MaxChatSessions,
}

impl DataLimit {
    pub const ALL: [DataLimit; 6] = [
        Self::MaxBanks,
        Self::MaxAccountsPerBank,
        Self::MaxCurrenciesPerAccount,
        Self::MaxStocks,
        Self::HistoryRetentionDays,
        Self::MaxChatSessions,
    ];
}

/// Structural quotas for a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLimits {
    pub max_banks: Limit,
    pub max_accounts_per_bank: Limit,
    pub max_currencies_per_account: Limit,
    pub max_stocks: Limit,
    pub history_retention_days: Limit,
    pub max_chat_sessions: Limit,
}

impl DataLimits {
    pub fn get(&self, limit: DataLimit) -> Limit {
        match limit {
            DataLimit::MaxBanks => self.max_banks,
            DataLimit::MaxAccountsPerBank => self.max_accounts_per_bank,
            DataLimit::MaxCurrenciesPerAccount => self.max_currencies_per_account,
            DataLimit::MaxStocks => self.max_stocks,
            DataLimit::HistoryRetentionDays => self.history_retention_days,
            DataLimit::MaxChatSessions => self.max_chat_sessions,
        }
    }
}

// =============================================================================
// Display / Marketing
// =============================================================================

/// Pricing and marketing metadata, passed through to presentation layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub name: String,
    pub monthly_price_cents: u32,
    pub annual_price_cents: u32,
    pub tagline: String,
}

// =============================================================================
// Subscription Config and Catalog
// =============================================================================

/// Everything a tier grants: features, credits, data limits, display metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    pub features: FeatureFlags,
    pub credits: CreditLimits,
    pub data: DataLimits,
    pub display: DisplayConfig,
}

/// Result of a feature-access query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureAccess {
    pub allowed: bool,
    pub reason: Option<String>,
    pub upgrade_target: Option<SubscriptionTier>,
}

/// The tier-to-entitlement mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    free: SubscriptionConfig,
    pro: SubscriptionConfig,
    premium: SubscriptionConfig,
}

impl Catalog {
    pub fn new(
        free: SubscriptionConfig,
        pro: SubscriptionConfig,
        premium: SubscriptionConfig,
    ) -> Self {
        Self { free, pro, premium }
    }

    /// The production tier configuration
    pub fn standard() -> Self {
        Self::new(free_config(), pro_config(), premium_config())
    }

    /// Config for a tier. Total over the enum, no side effects.
    pub fn config(&self, tier: SubscriptionTier) -> &SubscriptionConfig {
        match tier {
            SubscriptionTier::Free => &self.free,
            SubscriptionTier::Pro => &self.pro,
            SubscriptionTier::Premium => &self.premium,
        }
    }

    /// Config for a raw tier string; unrecognized input degrades to Free
    pub fn config_lossy(&self, tier: &str) -> &SubscriptionConfig {
        self.config(SubscriptionTier::from_str_lossy(tier))
    }

    pub fn has_feature(&self, tier: SubscriptionTier, feature: Feature) -> bool {
        self.config(tier).features.has(feature)
    }

    pub fn credit_limit(&self, tier: SubscriptionTier, credit_type: CreditType) -> &CreditConfig {
        self.config(tier).credits.get(credit_type)
    }

    pub fn data_limit(&self, tier: SubscriptionTier, limit: DataLimit) -> Limit {
        self.config(tier).data.get(limit)
    }

    /// Feature gate with an upgrade suggestion on denial
    pub fn can_access_feature(&self, tier: SubscriptionTier, feature: Feature) -> FeatureAccess {
        if self.has_feature(tier, feature) {
            return FeatureAccess {
                allowed: true,
                reason: None,
                upgrade_target: None,
            };
        }
        let target = tier.upgrade_target();
        FeatureAccess {
            allowed: false,
            reason: Some(format!(
                "{} is available on the {} plan",
                feature.name(),
                self.config(target).display.name
            )),
            upgrade_target: Some(target),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

// =============================================================================
// Standard Tier Data
// =============================================================================

fn free_config() -> SubscriptionConfig {
    SubscriptionConfig {
        features: FeatureFlags {
            currency_widget: false,
            stock_portfolio: false,
            csv_export: false,
            ai_digest: false,
            extension_sync: true,
        },
        credits: CreditLimits {
            // Free gets an introductory lifetime bundle of AI questions
            // rather than a rolling allowance
            ai_chat: CreditConfig {
                limit: Limit::Limited(0),
                period: CreditPeriod::Daily,
                lifetime_limit: Some(3),
            },
            ai_digest_regeneration: CreditConfig {
                limit: Limit::Limited(0),
                period: CreditPeriod::Weekly,
                lifetime_limit: None,
            },
            bank_sync: CreditConfig {
                limit: Limit::Limited(1),
                period: CreditPeriod::Daily,
                lifetime_limit: None,
            },
        },
        data: DataLimits {
            max_banks: Limit::Limited(2),
            max_accounts_per_bank: Limit::Limited(3),
            max_currencies_per_account: Limit::Limited(1),
            max_stocks: Limit::Limited(5),
            history_retention_days: Limit::Limited(90),
            max_chat_sessions: Limit::Limited(3),
        },
        display: DisplayConfig {
            name: "Free".to_string(),
            monthly_price_cents: 0,
            annual_price_cents: 0,
            tagline: "Track your money, on us".to_string(),
        },
    }
}

fn pro_config() -> SubscriptionConfig {
    SubscriptionConfig {
        features: FeatureFlags {
            currency_widget: true,
            stock_portfolio: true,
            csv_export: true,
            ai_digest: false,
            extension_sync: true,
        },
        credits: CreditLimits {
            ai_chat: CreditConfig {
                limit: Limit::Limited(50),
                period: CreditPeriod::Daily,
                lifetime_limit: None,
            },
            ai_digest_regeneration: CreditConfig {
                limit: Limit::Limited(3),
                period: CreditPeriod::Weekly,
                lifetime_limit: None,
            },
            bank_sync: CreditConfig {
                limit: Limit::Limited(12),
                period: CreditPeriod::Daily,
                lifetime_limit: None,
            },
        },
        data: DataLimits {
            max_banks: Limit::Limited(10),
            max_accounts_per_bank: Limit::Limited(10),
            max_currencies_per_account: Limit::Limited(5),
            max_stocks: Limit::Limited(50),
            history_retention_days: Limit::Limited(365),
            max_chat_sessions: Limit::Limited(50),
        },
        display: DisplayConfig {
            name: "Pro".to_string(),
            monthly_price_cents: 999,
            annual_price_cents: 9_999,
            tagline: "Daily AI credits and every widget".to_string(),
        },
    }
}

fn premium_config() -> SubscriptionConfig {
    SubscriptionConfig {
        features: FeatureFlags {
            currency_widget: true,
            stock_portfolio: true,
            csv_export: true,
            ai_digest: true,
            extension_sync: true,
        },
        credits: CreditLimits {
            ai_chat: CreditConfig {
                limit: Limit::Unlimited,
                period: CreditPeriod::Daily,
                lifetime_limit: None,
            },
            ai_digest_regeneration: CreditConfig {
                limit: Limit::Unlimited,
                period: CreditPeriod::Weekly,
                lifetime_limit: None,
            },
            bank_sync: CreditConfig {
                limit: Limit::Unlimited,
                period: CreditPeriod::Daily,
                lifetime_limit: None,
            },
        },
        data: DataLimits {
            max_banks: Limit::Unlimited,
            max_accounts_per_bank: Limit::Unlimited,
            max_currencies_per_account: Limit::Unlimited,
            max_stocks: Limit::Unlimited,
            history_retention_days: Limit::Unlimited,
            max_chat_sessions: Limit::Unlimited,
        },
        display: DisplayConfig {
            name: "Premium".to_string(),
            monthly_price_cents: 1_999,
            annual_price_cents: 19_999,
            tagline: "Everything, unlimited".to_string(),
        },
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tier_degrades_to_free() {
        let catalog = Catalog::standard();
        assert_eq!(
            catalog.config_lossy("bogus"),
            catalog.config(SubscriptionTier::Free)
        );
        assert_eq!(
            catalog.config_lossy("premium"),
            catalog.config(SubscriptionTier::Premium)
        );
    }

    #[test]
    fn test_feature_flags_per_tier() {
        let catalog = Catalog::standard();
        assert!(!catalog.has_feature(SubscriptionTier::Free, Feature::CurrencyWidget));
        assert!(catalog.has_feature(SubscriptionTier::Pro, Feature::CurrencyWidget));
        assert!(!catalog.has_feature(SubscriptionTier::Pro, Feature::AiDigest));
        assert!(catalog.has_feature(SubscriptionTier::Premium, Feature::AiDigest));
        // Extension sync ships on every tier
        assert!(catalog.has_feature(SubscriptionTier::Free, Feature::ExtensionSync));
    }

    #[test]
    fn test_can_access_feature_suggests_upgrade() {
        let catalog = Catalog::standard();

        let denied = catalog.can_access_feature(SubscriptionTier::Free, Feature::CurrencyWidget);
        assert!(!denied.allowed);
        assert_eq!(denied.upgrade_target, Some(SubscriptionTier::Pro));
        assert!(denied.reason.unwrap().contains("Pro"));

        let denied = catalog.can_access_feature(SubscriptionTier::Pro, Feature::AiDigest);
        assert_eq!(denied.upgrade_target, Some(SubscriptionTier::Premium));

        let allowed = catalog.can_access_feature(SubscriptionTier::Premium, Feature::AiDigest);
        assert!(allowed.allowed);
        assert!(allowed.reason.is_none());
        assert!(allowed.upgrade_target.is_none());
    }

    #[test]
    fn test_free_ai_chat_is_lifetime_bundled() {
        let catalog = Catalog::standard();
        let config = catalog.credit_limit(SubscriptionTier::Free, CreditType::AiChat);
        assert_eq!(config.lifetime_limit, Some(3));
        assert!(config.limit.is_zero());
    }

    #[test]
    fn test_data_limit_lookup() {
        let catalog = Catalog::standard();
        assert_eq!(
            catalog.data_limit(SubscriptionTier::Free, DataLimit::MaxBanks),
            Limit::Limited(2)
        );
        assert_eq!(
            catalog.data_limit(SubscriptionTier::Premium, DataLimit::MaxBanks),
            Limit::Unlimited
        );
    }

    /// Design intent: every flag, credit limit, and data limit is
    /// monotonically non-decreasing across free -> pro -> premium. Exhaustive
    /// over all enum variants, so a config edit breaking the ordering fails
    /// here rather than in production.
    #[test]
    fn test_tier_monotonicity() {
        let catalog = Catalog::standard();
        for pair in SubscriptionTier::ALL.windows(2) {
            let (lower, upper) = (catalog.config(pair[0]), catalog.config(pair[1]));

            for feature in Feature::ALL {
                assert!(
                    !lower.features.has(feature) || upper.features.has(feature),
                    "feature {:?} regresses from {} to {}",
                    feature,
                    pair[0],
                    pair[1]
                );
            }
            for credit_type in CreditType::ALL {
                assert!(
                    lower.credits.get(credit_type).limit <= upper.credits.get(credit_type).limit,
                    "credit {:?} regresses from {} to {}",
                    credit_type,
                    pair[0],
                    pair[1]
                );
            }
            for data_limit in DataLimit::ALL {
                assert!(
                    lower.data.get(data_limit) <= upper.data.get(data_limit),
                    "data limit {:?} regresses from {} to {}",
                    data_limit,
                    pair[0],
                    pair[1]
                );
            }
        }
    }

    #[test]
    fn test_display_config_passthrough() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.config(SubscriptionTier::Free).display.name, "Free");
        assert_eq!(
            catalog
                .config(SubscriptionTier::Pro)
                .display
                .monthly_price_cents,
            999
        );
    }
}
