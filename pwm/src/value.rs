//! Conversion of request values into the nanosecond strings the control files expect.

use log::trace;
use crate::control::PwmContext;
use crate::path::{DUTY_CYCLE, PERIOD};
use crate::{PwmError, PwmRequest, PwmResult};

const NANOS_PER_SECOND: f64 = 1e9;

/// Limits a period to `[0, 1]` seconds.
pub fn clamp_period(period: f64) -> f64 {
    if period < 0.0 {
        0.0
    } else if period > 1.0 {
        1.0
    } else {
        period
    }
}

/// Period in whole nanoseconds, or `None` if `period` is negative or not finite.
pub fn period_ns(period: f64) -> Option<u32> {
    if !period.is_finite() || period < 0.0 {
        return None;
    }
    Some((clamp_period(period) * NANOS_PER_SECOND) as u32)
}

/// Active time in whole nanoseconds for `duty_cycle` of the (clamped) `period`.
///
/// `None` unless the period is finite and non-negative and the duty cycle is finite and in `[0, 1]`.
pub fn duty_cycle_ns(period: f64, duty_cycle: f64) -> Option<u32> {
    if !period.is_finite() || period < 0.0 {
        return None;
    }
    if !duty_cycle.is_finite() || !(0.0..=1.0).contains(&duty_cycle) {
        return None;
    }
    Some((clamp_period(period) * duty_cycle * NANOS_PER_SECOND) as u32)
}

fn write_leaf(ctx: &PwmContext, pin: u32, leaf: &str, value: u32) -> PwmResult<()> {
    let path = ctx.layout.channel_file(pin, leaf)?;
    let value = value.to_string();
    trace!("PWM write: path={} value={}", path, value);
    if ctx.control.write_value(&path, &value) {
        Ok(())
    } else {
        Err(PwmError::Write(path))
    }
}

/// Writes the request's period to the channel.
///
/// Rejected input performs no write.
pub fn set_period(ctx: &PwmContext, request: &PwmRequest) -> PwmResult<()> {
    let value = period_ns(request.period).ok_or(PwmError::InvalidArgument)?;
    write_leaf(ctx, request.pin, PERIOD, value)
}

/// Writes the request's duty cycle to the channel.
///
/// The value is computed from the request's own period; the period currently configured on
/// the device is not read back.
pub fn set_duty_cycle(ctx: &PwmContext, request: &PwmRequest) -> PwmResult<()> {
    let value = duty_cycle_ns(request.period, request.duty_cycle)
        .ok_or(PwmError::InvalidArgument)?;
    write_leaf(ctx, request.pin, DUTY_CYCLE, value)
}
