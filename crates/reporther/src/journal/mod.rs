//! Journal-specific logic that runs on the client: keyword flagging and the
//! permission probe that guards journal writes.

pub mod permission;
pub mod risk;

pub use permission::ensure_user_role;
pub use risk::{assess_entries, flag_keywords, KeywordFlag, RiskAssessment, RiskCategory};
