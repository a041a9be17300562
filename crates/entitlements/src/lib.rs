//! Fintrack Entitlement Core
//!
//! The tier catalog, credit metering service, and payment-status reconciler
//! backing the Fintrack clients. Consumed as a library by the RPC layer; this
//! crate owns no wire protocol of its own.

pub mod catalog;
pub mod credits;
pub mod error;
pub mod payment_status;
pub mod store;

pub use catalog::{
    Catalog, CreditConfig, CreditLimits, DataLimit, DataLimits, DisplayConfig, Feature,
    FeatureAccess, FeatureFlags, SubscriptionConfig,
};
pub use credits::{CreditCheck, CreditMeter, RemainingCredits};
pub use error::{CreditError, CreditResult};
pub use payment_status::{
    is_paid_for_cycle, reconcile, resolve_policy, target_cycle_label, ObligationKind, Payment,
    PaymentSettings, PaymentStatus, PaymentStatusLogic, PaymentStatusPolicy,
};
pub use store::{InMemoryUsageStore, PgUsageStore, UsageStore};
