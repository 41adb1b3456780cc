use super::error::ServiceError;
use crate::models::OwnedResource;

/// Only the recorded owner may replace or delete a resource. No role
/// overrides this.
pub fn ensure_owner<R: OwnedResource>(resource: &R, caller_id: &str) -> Result<(), ServiceError> {
    if resource.owner_id() == caller_id {
        Ok(())
    } else {
        tracing::warn!(
            kind = R::KIND,
            owner_id = %resource.owner_id(),
            caller_id = %caller_id,
            "Ownership check failed"
        );
        Err(ServiceError::NotOwner(R::KIND))
    }
}
