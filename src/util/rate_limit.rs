//! Rate limiting for inbound socket traffic

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a rate limiter with the specified messages per second
pub fn create_limiter(per_second: u32) -> Arc<Limiter> {
    let quota = Quota::per_second(NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Max move/shoot messages per second per session. Clients send a move every frame
/// at 60 Hz plus shots.
pub const INPUT_RATE_LIMIT: u32 = 120;

/// Max join/teleport/count requests per second per session, counted apart from input
pub const CONTROL_RATE_LIMIT: u32 = 10;

/// Per-session rate limiter state
#[derive(Clone)]
pub struct SessionRateLimiter {
    input_limiter: Arc<Limiter>,
    control_limiter: Arc<Limiter>,
}

impl SessionRateLimiter {
    pub fn new() -> Self {
        Self::with_rates(INPUT_RATE_LIMIT, CONTROL_RATE_LIMIT)
    }

    pub fn with_rates(input_per_second: u32, control_per_second: u32) -> Self {
        Self {
            input_limiter: create_limiter(input_per_second),
            control_limiter: create_limiter(control_per_second),
        }
    }

    /// Check if an input message is allowed (returns true if allowed)
    pub fn check_input(&self) -> bool {
        self.input_limiter.check().is_ok()
    }

    /// Check if a control message is allowed (returns true if allowed)
    pub fn check_control(&self) -> bool {
        self.control_limiter.check().is_ok()
    }
}

impl Default for SessionRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
