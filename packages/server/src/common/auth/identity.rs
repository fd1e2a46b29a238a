use super::{AuthError, Capability, PermissionSet};

/// The caller behind a verified token
#[derive(Debug, Clone, PartialEq)]
pub struct AuthIdentity {
    pub subject_id: i64,
    pub email: String,
    pub permissions: PermissionSet,
}

impl AuthIdentity {
    pub fn has_permission(&self, capability: &Capability) -> bool {
        self.permissions.contains(capability)
    }

    /// Fail with [`AuthError::Forbidden`] unless the capability was granted
    ///
    /// ```rust,ignore
    /// identity.require(&Capability::WRITE_RESOURCES)?;
    /// ```
    pub fn require(&self, capability: &Capability) -> Result<(), AuthError> {
        if self.has_permission(capability) {
            Ok(())
        } else {
            Err(AuthError::Forbidden(capability.clone()))
        }
    }
}
