//! Covariate Validator for Range Checking

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Accepted age range in years (both bounds exclusive)
    pub age_range: (f64, f64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            age_range: (10.0, 120.0),
        }
    }
}

/// Biological sex as encoded for the downstream model (female = 0, male = 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    /// Numeric encoding used in the feature vector
    pub fn encoded(&self) -> u8 {
        match self {
            Sex::Female => 0,
            Sex::Male => 1,
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Female => "female",
            Sex::Male => "male",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "1" => Ok(Sex::Male),
            "female" | "0" => Ok(Sex::Female),
            _ => Err(ValidationError::InvalidSex(s.to_string())),
        }
    }
}

/// Validated non-acoustic inputs for one recording
///
/// Only obtainable through [`CovariateValidator::validate`], so every instance
/// is known to be in range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Covariates {
    age: u32,
    sex: Sex,
    test_time: f64,
}

impl Covariates {
    /// Age in years
    pub fn age(&self) -> u32 {
        self.age
    }

    /// Sex of the speaker
    pub fn sex(&self) -> Sex {
        self.sex
    }

    /// Time since recruitment into the trial (days, fractional)
    pub fn test_time(&self) -> f64 {
        self.test_time
    }
}

/// Validator for caller-supplied covariates
pub struct CovariateValidator {
    config: ValidationConfig,
}

impl CovariateValidator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a value against an exclusive range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { field });
        }
        if value <= range.0 || value >= range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Validate age
    pub fn validate_age(&self, age: u32) -> Result<(), ValidationError> {
        self.validate_range("age", f64::from(age), self.config.age_range)
    }

    /// Validate test time
    pub fn validate_test_time(&self, test_time: f64) -> Result<(), ValidationError> {
        if !test_time.is_finite() {
            return Err(ValidationError::NotFinite { field: "test_time" });
        }
        if test_time <= 0.0 {
            return Err(ValidationError::NotPositive {
                field: "test_time",
                value: test_time,
            });
        }
        Ok(())
    }

    /// Validate all covariates and build the checked record
    pub fn validate(&self, age: u32, sex: Sex, test_time: f64) -> Result<Covariates, ValidationError> {
        self.validate_age(age)?;
        self.validate_test_time(test_time)?;
        debug!(age, sex = sex.as_str(), test_time, "Covariates validated");
        Ok(Covariates { age, sex, test_time })
    }

    /// Validate covariates with the sex given as a label (`male`/`female`)
    pub fn validate_labelled(
        &self,
        age: u32,
        sex: &str,
        test_time: f64,
    ) -> Result<Covariates, ValidationError> {
        let sex = sex.parse::<Sex>()?;
        self.validate(age, sex, test_time)
    }
}

impl Default for CovariateValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
