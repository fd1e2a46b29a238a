//! Authorization primitives shared by the HTTP layer and the CLI
//!
//! Tokens are decoded once at the trust boundary into an [`AuthIdentity`];
//! handlers then check capabilities against it:
//!
//! ```rust,ignore
//! use crate::common::auth::{AuthIdentity, Capability};
//!
//! async fn handler(identity: AuthIdentity) -> Result<(), ApiError> {
//!     identity.require(&Capability::WRITE_RESOURCES)?;
//!     // ...
//! }
//! ```

mod capability;
mod errors;
mod identity;

pub use capability::{Capability, PermissionSet};
pub use errors::AuthError;
pub use identity::AuthIdentity;
