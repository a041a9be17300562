//! Credit Metering Service
//!
//! Decides whether a metered action is currently allowed for a user and
//! records consumption. Consumes the Catalog for limits and a `UsageStore`
//! for counters; the decision logic itself is pure and split into free
//! functions so it can be tested with a pinned clock.
//!
//! Reset semantics: each rolling period has a canonical start instant derived
//! from *today* (midnight, the most recent Monday, the 1st of the month), and
//! a counter is treated as zero whenever its last-reset stamp predates that
//! instant. The stored counter is only physically rewritten on the increment
//! path.

use std::sync::Arc;

use chrono::{Datelike, Duration, Local, NaiveDateTime, NaiveTime};
use fintrack_shared::{CreditPeriod, CreditType, Limit, SubscriptionTier, UsageRecord};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::error::{CreditError, CreditResult};
use crate::store::UsageStore;

// =============================================================================
// Period arithmetic
// =============================================================================

/// Canonical start instant of the rolling period containing `now`
///
/// Day: today 00:00. Week: the most recent Monday 00:00 (ISO week, so a
/// Sunday is 6 days past it). Month: the 1st 00:00. Lifetime has no start.
pub fn period_start(period: CreditPeriod, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let today = now.date();
    let start_date = match period {
        CreditPeriod::Daily => today,
        CreditPeriod::Weekly => {
            today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
        }
        CreditPeriod::Monthly => today.with_day(1)?,
        CreditPeriod::Lifetime => return None,
    };
    Some(start_date.and_time(NaiveTime::MIN))
}

/// Whether a counter last reset before the current period began
pub fn needs_reset(last_reset: NaiveDateTime, period: CreditPeriod, now: NaiveDateTime) -> bool {
    period_start(period, now).is_some_and(|start| last_reset < start)
}

/// The counter value `check_credit` should see: the stored count, or zero if
/// the period has rolled over since the last physical reset
pub fn effective_count(record: &UsageRecord, period: CreditPeriod, now: NaiveDateTime) -> i64 {
    match period {
        CreditPeriod::Daily => {
            if needs_reset(record.last_daily_reset, period, now) {
                0
            } else {
                record.count_today
            }
        }
        CreditPeriod::Weekly => {
            if needs_reset(record.last_weekly_reset, period, now) {
                0
            } else {
                record.count_this_week
            }
        }
        CreditPeriod::Monthly => {
            if needs_reset(record.last_monthly_reset, period, now) {
                0
            } else {
                record.count_this_month
            }
        }
        CreditPeriod::Lifetime => record.count_lifetime,
    }
}

// =============================================================================
// Results
// =============================================================================

/// Outcome of a credit check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCheck {
    pub allowed: bool,
    pub remaining: Limit,
    pub limit: Limit,
    pub period: CreditPeriod,
    /// User-facing denial message; None when allowed
    pub message: Option<String>,
}

/// Display-ready credit status for the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemainingCredits {
    pub remaining: String,
    pub limit: String,
    pub period: CreditPeriod,
}

// =============================================================================
// Service
// =============================================================================

/// Credit metering service
#[derive(Clone)]
pub struct CreditMeter {
    catalog: Arc<Catalog>,
    store: Arc<dyn UsageStore>,
}

impl CreditMeter {
    pub fn new(catalog: Arc<Catalog>, store: Arc<dyn UsageStore>) -> Self {
        Self { catalog, store }
    }

    /// Can this user perform the metered action right now?
    ///
    /// Read-only and idempotent: repeated calls without an intervening
    /// `use_credit` return the same result.
    pub async fn check_credit(
        &self,
        user_id: Uuid,
        tier: SubscriptionTier,
        credit_type: CreditType,
    ) -> CreditResult<CreditCheck> {
        self.check_credit_at(user_id, tier, credit_type, Local::now().naive_local())
            .await
    }

    async fn check_credit_at(
        &self,
        user_id: Uuid,
        tier: SubscriptionTier,
        credit_type: CreditType,
        now: NaiveDateTime,
    ) -> CreditResult<CreditCheck> {
        let config = *self.catalog.credit_limit(tier, credit_type);
        let upgrade_name = &self.catalog.config(tier.upgrade_target()).display.name;

        // Free tier meters lifetime-gated credits against a one-time bundle
        if let Some(lifetime_limit) = config.lifetime_limit {
            if tier == SubscriptionTier::Free && credit_type.lifetime_gated() {
                let usage = self.load_or_zeroed(user_id, credit_type, now).await?;
                let limit = Limit::Limited(lifetime_limit);
                let remaining = limit.remaining_after(usage.count_lifetime);
                if remaining.is_zero() {
                    return Ok(CreditCheck {
                        allowed: false,
                        remaining,
                        limit,
                        period: CreditPeriod::Lifetime,
                        message: Some(format!(
                            "You've used all {} free {}. Upgrade to {} for daily credits.",
                            lifetime_limit,
                            credit_type.noun(),
                            upgrade_name
                        )),
                    });
                }
                return Ok(CreditCheck {
                    allowed: true,
                    remaining,
                    limit,
                    period: CreditPeriod::Lifetime,
                    message: None,
                });
            }
        }

        // Zero allowance: deny without touching the store
        if config.limit.is_zero() {
            return Ok(CreditCheck {
                allowed: false,
                remaining: Limit::Limited(0),
                limit: Limit::Limited(0),
                period: config.period,
                message: Some(format!(
                    "Your plan does not include {}. Upgrade to {} to unlock them.",
                    credit_type.noun(),
                    upgrade_name
                )),
            });
        }

        if config.limit.is_unlimited() {
            return Ok(CreditCheck {
                allowed: true,
                remaining: Limit::Unlimited,
                limit: Limit::Unlimited,
                period: config.period,
                message: None,
            });
        }

        let usage = self.load_or_zeroed(user_id, credit_type, now).await?;
        let current = effective_count(&usage, config.period, now);
        let remaining = config.limit.remaining_after(current);
        if remaining.is_zero() {
            return Ok(CreditCheck {
                allowed: false,
                remaining,
                limit: config.limit,
                period: config.period,
                message: Some(format!(
                    "You've reached your limit of {} {} {}. Try again {}.",
                    config.limit,
                    credit_type.noun(),
                    config.period.window_name(),
                    config.period.retry_hint()
                )),
            });
        }

        Ok(CreditCheck {
            allowed: true,
            remaining,
            limit: config.limit,
            period: config.period,
            message: None,
        })
    }

    /// Consume one credit, failing with the check's message when denied
    ///
    /// The check and the increment are separate store round trips; concurrent
    /// callers can race past the gate (documented soft limit, see store.rs).
    pub async fn use_credit(
        &self,
        user_id: Uuid,
        tier: SubscriptionTier,
        credit_type: CreditType,
    ) -> CreditResult<()> {
        let check = self.check_credit(user_id, tier, credit_type).await?;
        if !check.allowed {
            let message = check
                .message
                .unwrap_or_else(|| format!("No {} remaining", credit_type.noun()));
            tracing::warn!(
                user_id = %user_id,
                %tier,
                %credit_type,
                "credit denied"
            );
            return Err(CreditError::QuotaExceeded { message });
        }
        self.increment_usage(user_id, credit_type).await
    }

    /// Record one consumption, lazily creating the record on first use
    pub async fn increment_usage(&self, user_id: Uuid, credit_type: CreditType) -> CreditResult<()> {
        self.increment_usage_at(user_id, credit_type, Local::now().naive_local())
            .await
    }

    async fn increment_usage_at(
        &self,
        user_id: Uuid,
        credit_type: CreditType,
        now: NaiveDateTime,
    ) -> CreditResult<()> {
        let record = match self.store.load(user_id, credit_type).await? {
            None => {
                let mut record = UsageRecord::zeroed(user_id, credit_type, now);
                record.count_today = 1;
                record.count_this_week = 1;
                record.count_this_month = 1;
                record.count_lifetime = 1;
                record
            }
            Some(mut record) => {
                // The daily physical reset is decided by calendar date, a
                // coarser rule than the instant comparison the read path
                // uses. The two can disagree right around a period boundary;
                // both sides depend on the current behavior, so neither is
                // changed without product sign-off (see DESIGN.md).
                if record.last_daily_reset.date() != now.date() {
                    record.count_today = 1;
                    record.last_daily_reset = now;
                } else {
                    record.count_today += 1;
                }
                if needs_reset(record.last_weekly_reset, CreditPeriod::Weekly, now) {
                    record.count_this_week = 1;
                    record.last_weekly_reset = now;
                } else {
                    record.count_this_week += 1;
                }
                if needs_reset(record.last_monthly_reset, CreditPeriod::Monthly, now) {
                    record.count_this_month = 1;
                    record.last_monthly_reset = now;
                } else {
                    record.count_this_month += 1;
                }
                record.count_lifetime += 1;
                record
            }
        };

        self.store.upsert(&record).await?;
        tracing::debug!(
            user_id = %user_id,
            %credit_type,
            count_today = record.count_today,
            count_lifetime = record.count_lifetime,
            "usage incremented"
        );
        Ok(())
    }

    /// Current counters for display; never creates persistent state
    pub async fn get_usage(
        &self,
        user_id: Uuid,
        credit_type: CreditType,
    ) -> CreditResult<UsageRecord> {
        self.load_or_zeroed(user_id, credit_type, Local::now().naive_local())
            .await
    }

    /// Credit status rendered for the UI; unbounded limits read "unlimited"
    pub async fn get_remaining_credits(
        &self,
        user_id: Uuid,
        tier: SubscriptionTier,
        credit_type: CreditType,
    ) -> CreditResult<RemainingCredits> {
        let check = self.check_credit(user_id, tier, credit_type).await?;
        Ok(RemainingCredits {
            remaining: check.remaining.display(),
            limit: check.limit.display(),
            period: check.period,
        })
    }

    async fn load_or_zeroed(
        &self,
        user_id: Uuid,
        credit_type: CreditType,
        now: NaiveDateTime,
    ) -> CreditResult<UsageRecord> {
        Ok(self
            .store
            .load(user_id, credit_type)
            .await?
            .unwrap_or_else(|| UsageRecord::zeroed(user_id, credit_type, now)))
    }
}

// =============================================================================
// Tests
// =============================================================================
