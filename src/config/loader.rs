//! Policy loading functionality.
//!
//! This module provides the [`PolicyLoader`] type for loading tax policies
//! from YAML files.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};

use super::types::{PolicyMetadata, PolicySet, TaxPolicy};

/// Loads tax policies from a configuration directory.
///
/// # Directory Structure
///
/// ```text
/// config/tax/
/// ├── policy.yaml      # Policy set metadata
/// └── years/
///     ├── 2024.yaml    # One TaxPolicy per file
///     └── 2025.yaml
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::PolicyLoader;
///
/// let policies = PolicyLoader::load("./config/tax")?;
/// let policy = policies.policy_for(2025)?;
/// println!("SS wage base: {}", policy.fica.ss_wage_base);
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PolicyLoader;

impl PolicyLoader {
    /// Loads and validates every policy under `path`.
    ///
    /// Fails if `policy.yaml` or the `years` directory is missing, a file
    /// is not valid YAML, a policy fails validation, or two files describe
    /// the same tax year.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<PolicySet> {
        let path = path.as_ref();

        let metadata = Self::load_yaml::<PolicyMetadata>(&path.join("policy.yaml"))?;
        let policies = Self::load_years(&path.join("years"))?;

        let mut set = PolicySet::new(metadata);
        for policy in policies {
            set.insert(policy);
        }

        info!(
            path = %path.display(),
            years = ?set.years(),
            "Loaded tax policies"
        );
        Ok(set)
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads all policy files from the years directory.
    fn load_years(years_dir: &Path) -> EngineResult<Vec<TaxPolicy>> {
        let years_dir_str = years_dir.display().to_string();

        let entries = fs::read_dir(years_dir).map_err(|_| EngineError::ConfigNotFound {
            path: years_dir_str.clone(),
        })?;

        let mut policies: Vec<TaxPolicy> = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: years_dir_str.clone(),
            })?;

            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "yaml") {
                continue;
            }

            let policy = Self::load_yaml::<TaxPolicy>(&path)?;
            policy.validate().map_err(|e| EngineError::ConfigParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

            if policies.iter().any(|p| p.tax_year == policy.tax_year) {
                return Err(EngineError::ConfigParseError {
                    path: path.display().to_string(),
                    message: format!("duplicate policy for tax year {}", policy.tax_year),
                });
            }

            debug!(path = %path.display(), tax_year = policy.tax_year, "Loaded policy file");
            policies.push(policy);
        }

        if policies.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no policy files found)", years_dir_str),
            });
        }

        Ok(policies)
    }
}
