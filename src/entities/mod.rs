//! Entity type definitions
//!
//! The console moderates five backend collections:
//!
//! **Moderated:**
//! - [`Campaign`] - Fundraising campaigns with an approval and publishing lifecycle
//! - [`Withdrawal`] - Payout requests approved or rejected by a reviewer
//!
//! **Reference data:**
//! - [`Bank`] - Payout institutions
//! - [`Language`] - Supported locales (exactly one default)
//! - [`Translation`] - UI strings keyed by dot path, one text per language

pub mod bank;
pub mod campaign;
pub mod language;
pub mod translation;
pub mod withdrawal;

pub use bank::{Bank, BankColumn, BankFilters};
pub use campaign::{Campaign, CampaignFilters, CampaignSort, CampaignStatus};
pub use language::{Language, LanguageColumn, LanguageFilters};
pub use translation::{Coverage, Translation, TranslationFilters};
pub use withdrawal::{PaymentMethod, Withdrawal, WithdrawalFilters, WithdrawalSort, WithdrawalStatus};
