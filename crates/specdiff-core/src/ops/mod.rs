pub mod batch_ops;
pub mod endpoint_ops;
pub mod path_ops;
pub mod shape_ops;

use crate::errors::{Result, SpecDiffError};

/// Names of path segments and fields share one rule set
pub(crate) fn validate_name(name: &str, what: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SpecDiffError::InvalidName {
            reason: format!("{} name cannot be empty or whitespace-only", what),
        });
    }
    if name.contains('/') {
        return Err(SpecDiffError::InvalidName {
            reason: format!("{} name '{}' cannot contain '/'", what, name),
        });
    }
    Ok(())
}
