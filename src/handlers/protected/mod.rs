// handlers/protected/mod.rs - endpoints that need a session
//
// Session-only reads take `UserPath`; mutations take `Authorized<R>`, which
// has already checked the session, the body structure and ownership by the
// time the handler runs.
pub mod user;
pub mod word_set;
