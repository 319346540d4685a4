//! Covariate Validation
//!
//! Range checking and encoding for the non-acoustic inputs (age, sex, test time)
//! that are merged into every voice feature vector.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{Covariates, CovariateValidator, Sex, ValidationConfig};
