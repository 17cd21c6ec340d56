/// Router Module Index
///
/// Routes are split by access tier so the authentication layer is applied per module
/// in `create_router` rather than per handler.

/// Routes open to everyone. Catalog reads resolve the caller optionally and gate
/// premium content in the handler.
pub mod public;

/// Routes wrapped in the authentication layer. Requires a valid token for an active account.
pub mod authenticated;

/// Catalog writes. Authenticated like the module above; the 'admin' role is checked
/// inside each handler.
pub mod admin;
