//! Session token authentication.
//!
//! Protected routers are wrapped in [`require_identity`], which verifies the
//! `Authorization` header and binds an [`Identity`] for the handlers. Handlers
//! take `Identity` as an extractor argument.

mod errors;
mod extractors;
mod middleware;
mod state;
mod types;

pub use errors::{AuthError, AuthErrorKind};
pub use middleware::{authorize, require_identity};
pub use state::HasAuthBackend;
pub use types::{Identity, PresentedToken};
