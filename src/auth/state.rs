//! Authentication state trait and macro.

use crate::db::Database;
use crate::jwt::KeyMaterial;

/// Trait for state types that provide the database and token keys needed to
/// authenticate a request.
pub trait HasAuthBackend {
    fn keys(&self) -> &KeyMaterial;
    fn db(&self) -> &Database;
}

/// Macro to implement `HasAuthBackend` for state structs with the standard fields.
///
/// The struct must have these fields:
/// - `keys: Arc<KeyMaterial>`
/// - `db: Database`
///
/// # Example
/// ```ignore
/// use crate::impl_has_auth_backend;
///
/// #[derive(Clone)]
/// pub struct MyState {
///     pub db: Database,
///     pub keys: Arc<KeyMaterial>,
/// }
///
/// impl_has_auth_backend!(MyState);
/// ```
#[macro_export]
macro_rules! impl_has_auth_backend {
    ($state_type:ty) => {
        impl $crate::auth::HasAuthBackend for $state_type {
            fn keys(&self) -> &$crate::jwt::KeyMaterial {
                &self.keys
            }
            fn db(&self) -> &$crate::db::Database {
                &self.db
            }
        }
    };
}
