// handlers/mod.rs - Two-tier CRUD dispatch
//
// Public (no auth, /api/v1/*) → Protected (bearer auth + permissions, /api/v2/*)
pub mod protected;
pub mod public;
