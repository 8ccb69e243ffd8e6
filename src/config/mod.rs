//! Tax policy configuration for the payroll engine.
//!
//! This module provides the per-year [`TaxPolicy`] the calculator consumes,
//! the [`PolicySet`] that selects a policy by tax year, and the
//! [`PolicyLoader`] that reads policies from YAML files.
//!
//! # Example
//!
//! ```
//! use payroll_engine::config::PolicySet;
//!
//! let policies = PolicySet::builtin();
//! let policy = policies.policy_for(2024).unwrap();
//! assert_eq!(policy.fica.ss_wage_base.to_string(), "168600.00");
//! ```

mod builtin;
mod loader;
mod types;

pub use loader::PolicyLoader;
pub use types::{
    BracketSchedules, FicaRates, OvertimeRule, PolicyMetadata, PolicySet, StateTaxConfig,
    TaxBracket, TaxPolicy,
};
