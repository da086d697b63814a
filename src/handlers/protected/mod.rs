// handlers/protected/mod.rs - Bearer-authenticated handlers
//
// Route Prefix: /api/v2/:resource[/:id]
// Gate order per request: resolve resource → authenticate → authorize (mutations) → handler.
pub mod data;
