//! Synchronous, handle-based access to PWM channels.
//!
//! Unlike the job API in [crate::dispatch], these calls run on the caller's thread and report
//! failures as [crate::PwmError]s. They also allow reading the configuration back.

mod chip;
mod ext;

use crate::PwmResult;
use std::fmt::Debug;
pub use chip::*;
pub use ext::*;

pub trait PwmDriver: Debug {
    /// Gets the amount of PWM channels the chip provides.
    fn count(&self) -> PwmResult<usize>;

    /// Exports the channel at the given index if needed and returns a handle to it.
    fn get_pin(&self, index: u32) -> PwmResult<Box<dyn PwmPin + '_>>;
}

/// Raw access to one channel's control files, in nanoseconds.
pub trait PwmPin: Debug {
    fn period_ns(&self) -> PwmResult<u32>;
    fn set_period_ns(&mut self, period_ns: u32) -> PwmResult<()>;

    fn duty_ns(&self) -> PwmResult<u32>;
    fn set_duty_ns(&mut self, duty_ns: u32) -> PwmResult<()>;

    fn is_enabled(&self) -> PwmResult<bool>;
    fn enable(&mut self) -> PwmResult<()>;
    fn disable(&mut self) -> PwmResult<()>;
}
