//! Payment-Status Reconciler
//!
//! Pure functions deciding which billing cycle of a recurring obligation
//! (credit card, mortgage, subscription) is currently due and whether it has
//! been paid. Two mutually exclusive policies:
//!
//! - `monthly`: the target cycle is simply the current calendar month.
//! - `period`: a lead-time threshold around the obligation's due day decides
//!   whether the upcoming or the just-passed due date's month is the target.
//!
//! No storage, no mutation; malformed input degrades to "not paid", never an
//! error.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Hard default when neither a per-type nor a global setting resolves
pub const DEFAULT_PERIOD_DAYS: u32 = 15;

// =============================================================================
// Types
// =============================================================================

/// Kind of recurring obligation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObligationKind {
    Credit,
    Mortgage,
    Subscription,
}

impl ObligationKind {
    /// Credits and mortgages record payments with an explicit "YYYY-MM"
    /// label; subscriptions only carry a paid-at timestamp
    pub fn uses_month_year_label(&self) -> bool {
        matches!(self, Self::Credit | Self::Mortgage)
    }
}

/// Which reconciliation rule applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatusLogic {
    Monthly,
    Period,
}

/// Resolved reconciliation policy for one obligation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusPolicy {
    pub logic: PaymentStatusLogic,
    /// Lead-time threshold in days, only meaningful for `Period` logic
    pub period_days: u32,
}

impl Default for PaymentStatusPolicy {
    fn default() -> Self {
        Self {
            logic: PaymentStatusLogic::Monthly,
            period_days: DEFAULT_PERIOD_DAYS,
        }
    }
}

/// User-settings snapshot with the raw (string) policy fields
///
/// Per-type overrides win over the global pair; both are stored as strings by
/// the settings screen and parsed leniently here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentSettings {
    pub payment_status_logic: Option<String>,
    pub payment_status_period: Option<String>,
    pub credit_status_logic: Option<String>,
    pub credit_status_period: Option<String>,
    pub mortgage_status_logic: Option<String>,
    pub mortgage_status_period: Option<String>,
    pub subscription_status_logic: Option<String>,
    pub subscription_status_period: Option<String>,
}

/// One recorded payment against an obligation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payment {
    /// Explicit cycle label ("YYYY-MM"), used by credits and mortgages
    pub month_year: Option<String>,
    /// Payment timestamp, used by subscriptions
    pub paid_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Policy resolution
// =============================================================================

fn parse_logic(value: &str) -> Option<PaymentStatusLogic> {
    match value {
        "monthly" => Some(PaymentStatusLogic::Monthly),
        "period" => Some(PaymentStatusLogic::Period),
        _ => None,
    }
}

/// Parse a period setting, falling back when missing or non-numeric
pub fn parse_period_or_default(value: Option<&str>, fallback: u32) -> u32 {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(fallback)
}

/// Resolve the effective policy for an obligation kind:
/// per-kind override, then the global setting, then the hard default
pub fn resolve_policy(settings: &PaymentSettings, kind: ObligationKind) -> PaymentStatusPolicy {
    let (kind_logic, kind_period) = match kind {
        ObligationKind::Credit => (&settings.credit_status_logic, &settings.credit_status_period),
        ObligationKind::Mortgage => (
            &settings.mortgage_status_logic,
            &settings.mortgage_status_period,
        ),
        ObligationKind::Subscription => (
            &settings.subscription_status_logic,
            &settings.subscription_status_period,
        ),
    };

    let logic = kind_logic
        .as_deref()
        .and_then(parse_logic)
        .or_else(|| settings.payment_status_logic.as_deref().and_then(parse_logic))
        .unwrap_or(PaymentStatusLogic::Monthly);

    let global_period = parse_period_or_default(
        settings.payment_status_period.as_deref(),
        DEFAULT_PERIOD_DAYS,
    );
    let period_days = parse_period_or_default(kind_period.as_deref(), global_period);

    PaymentStatusPolicy { logic, period_days }
}

// =============================================================================
// Cycle labels
// =============================================================================

fn month_label(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

fn prev_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = next_month(year, month);
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

/// A real date for `(year, month, day)` with the day clamped to the month's
/// length, so a day-31 obligation falls due on Feb 28
fn date_clamped(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day.min(days_in_month(year, month)))
}

/// The "YYYY-MM" label of the billing cycle currently considered due
///
/// Monthly logic ignores the billing day entirely: "paid this month" is
/// checked against the current month. Period logic looks at the upcoming due
/// date; within `period_days` of it the upcoming month is the target,
/// otherwise we're still in the grace window of the previous due date and its
/// month is the target. A missing billing day defaults to the 1st.
pub fn target_cycle_label(
    billing_day: Option<u32>,
    policy: &PaymentStatusPolicy,
    today: NaiveDate,
) -> String {
    match policy.logic {
        PaymentStatusLogic::Monthly => month_label(today.year(), today.month()),
        PaymentStatusLogic::Period => {
            let billing_day = billing_day.unwrap_or(1).clamp(1, 31);
            let (due_year, due_month) = if today.day() > billing_day {
                next_month(today.year(), today.month())
            } else {
                (today.year(), today.month())
            };
            let next_due = match date_clamped(due_year, due_month, billing_day) {
                Some(date) => date,
                None => return month_label(today.year(), today.month()),
            };
            let days_until_due = (next_due - today).num_days();
            if days_until_due <= i64::from(policy.period_days) {
                month_label(due_year, due_month)
            } else {
                let (prev_year, prev_month) = prev_month(due_year, due_month);
                month_label(prev_year, prev_month)
            }
        }
    }
}

/// `target_cycle_label` against today's local date
pub fn current_target_cycle_label(billing_day: Option<u32>, policy: &PaymentStatusPolicy) -> String {
    target_cycle_label(billing_day, policy, chrono::Local::now().date_naive())
}

// =============================================================================
// Payment matching
// =============================================================================

/// Whether any recorded payment satisfies the target cycle
///
/// Label-based obligations match on the exact "YYYY-MM" string; timestamp
/// based ones match any payment inside the target calendar month. A payment
/// carrying neither field never matches.
pub fn is_paid_for_cycle(
    payments: &[Payment],
    target_cycle: &str,
    uses_month_year_label: bool,
) -> bool {
    payments.iter().any(|payment| {
        if uses_month_year_label {
            payment.month_year.as_deref() == Some(target_cycle)
        } else {
            match payment.paid_at {
                Some(paid_at) => month_label(paid_at.year(), paid_at.month()) == target_cycle,
                None => false,
            }
        }
    })
}

/// One-shot reconciliation: resolve the policy, compute the target cycle,
/// and check it against the payment history
pub fn reconcile(
    settings: &PaymentSettings,
    kind: ObligationKind,
    billing_day: Option<u32>,
    payments: &[Payment],
    today: NaiveDate,
) -> PaymentStatus {
    let policy = resolve_policy(settings, kind);
    let target_cycle = target_cycle_label(billing_day, &policy, today);
    let paid = is_paid_for_cycle(payments, &target_cycle, kind.uses_month_year_label());
    PaymentStatus {
        target_cycle,
        paid,
        policy,
    }
}

/// Result of reconciling one obligation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatus {
    pub target_cycle: String,
    pub paid: bool,
    pub policy: PaymentStatusPolicy,
}

// =============================================================================
// Tests
// =============================================================================
