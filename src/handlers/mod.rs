// handlers/mod.rs - two handler tiers
//
// Public (no session) → Protected (session cookie, then the request gates)
pub mod protected;
pub mod public;
