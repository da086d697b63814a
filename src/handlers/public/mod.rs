// handlers/public/mod.rs - Unauthenticated handlers
//
// Route Prefix: /api/v1/:resource[/:id]
// Any resource type the registry can resolve is reachable without credentials.
pub mod data;
