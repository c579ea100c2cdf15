//! Higher-level channel control on top of the raw nanosecond values.

use std::time::Duration;
use crate::{PwmError, PwmResult};
use crate::channel::PwmPin;
use crate::value::period_ns;

/// Period as a [Duration] and duty cycle as a ratio of the period.
pub trait PwmExtension {
    fn period(&self) -> PwmResult<Duration>;
    /// Sets the period, saturating at one second like the job API does.
    fn set_period(&mut self, period: Duration) -> PwmResult<()>;

    /// Fraction of the configured period the output is active, `0.0` for a zero period.
    fn duty_cycle(&self) -> PwmResult<f64>;
    /// Sets the duty cycle as a ratio of the period currently configured on the device.
    ///
    /// # Errors
    /// - `PwmError::InvalidArgument` if `ratio` is not finite or outside `[0, 1]`.
    fn set_duty_cycle(&mut self, ratio: f64) -> PwmResult<()>;
}

impl PwmExtension for dyn PwmPin + '_ {
    fn period(&self) -> PwmResult<Duration> {
        Ok(Duration::from_nanos(self.period_ns()?.into()))
    }

    fn set_period(&mut self, period: Duration) -> PwmResult<()> {
        let period_ns = period_ns(period.as_secs_f64()).ok_or(PwmError::InvalidArgument)?;
        self.set_period_ns(period_ns)
    }

    fn duty_cycle(&self) -> PwmResult<f64> {
        let period_ns = self.period_ns()?;
        if period_ns == 0 {
            return Ok(0.0);
        }
        Ok(self.duty_ns()? as f64 / period_ns as f64)
    }

    fn set_duty_cycle(&mut self, ratio: f64) -> PwmResult<()> {
        if !ratio.is_finite() || !(0.0..=1.0).contains(&ratio) {
            return Err(PwmError::InvalidArgument);
        }
        let duty_ns = (self.period_ns()? as f64 * ratio) as u32;
        self.set_duty_ns(duty_ns)
    }
}
