//! Monotonic millisecond time source.
//!
//! Timestamps are `u32` milliseconds that roll over every ~49.7 days.
//! Every comparison goes through [`elapsed`], i.e. unsigned wrapping
//! subtraction, which yields the right answer across a rollover as long
//! as the window being measured is shorter than [`HALF_ROLLOVER_MS`].

/// Millisecond timestamp / duration.
pub type Millis = u32;

/// Half of the `Millis` rollover period (2^31 ms, ~24.8 days).
pub const HALF_ROLLOVER_MS: Millis = 1 << 31;

/// Source of the current monotonic time.
pub trait Clock {
    fn now_ms(&self) -> Millis;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> Millis {
        (**self).now_ms()
    }
}

/// Milliseconds from `since` to `now`, correct across a counter rollover.
#[inline]
pub const fn elapsed(now: Millis, since: Millis) -> Millis {
    now.wrapping_sub(since)
}

/// `true` if a window of `ms` can be measured with [`elapsed`] without
/// being confused by a rollover.
pub const fn fits_wrap_window(ms: Millis) -> bool {
    ms < HALF_ROLLOVER_MS
}
