// handlers/public/mod.rs - endpoints reachable without a session
//
// Account creation and log in, the verification flows that precede them, and
// the read side of the catalog. Bodies go through `Body`, so malformed input
// is answered with the same envelope the gated endpoints use.
pub mod account;
pub mod catalog;
pub mod verification;
