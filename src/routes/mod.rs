/// Router Module Index
///
/// Routes are split by access level. Authentication is applied to a whole module
/// with a route layer in `create_router`, so a protected endpoint cannot be exposed
/// by forgetting an extractor.

/// Routes open to anonymous clients.
pub mod public;

/// Routes behind the session gate.
pub mod authenticated;
