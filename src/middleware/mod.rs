pub mod gate;
pub mod origin;
pub mod rate_limit;
pub mod response;

pub use gate::{Authorized, Body, Gate, Gated, Owner, Session, UserPath};
pub use origin::origin_middleware;
pub use rate_limit::{rate_limit_middleware, RateLimiter};
pub use response::{ApiResponse, ApiResult, MessagePayload};
