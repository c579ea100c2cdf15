//! The PWM operations, each run as one job against a [PwmContext].

use std::fmt::{Display, Formatter};
use log::{debug, warn};
use crate::control::PwmContext;
use crate::path::ENABLE;
use crate::value::{set_duty_cycle, set_period};
use crate::{protocol, PwmRequest, PwmResult, ResultCode};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PwmOp {
    /// Exports the channel, then applies the requested period and duty cycle.
    Export,
    SetPeriod,
    /// Same as [PwmOp::SetPeriod]; the request already carries the period of the frequency.
    SetFrequency,
    SetDutyCycle,
    SetEnable,
    Unexport,
}

impl Display for PwmOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            PwmOp::Export => "export",
            PwmOp::SetPeriod => "set period",
            PwmOp::SetFrequency => "set frequency",
            PwmOp::SetDutyCycle => "set duty cycle",
            PwmOp::SetEnable => "set enable",
            PwmOp::Unexport => "unexport",
        };
        write!(f, "{}", str)
    }
}

/// One operation together with the request it works on.
#[derive(Clone, Debug)]
pub struct PwmJob {
    pub op: PwmOp,
    pub request: PwmRequest,
}

impl PwmJob {
    pub fn new(op: PwmOp, request: PwmRequest) -> Self {
        Self { op, request }
    }

    /// Runs the operation and stores its result code on the request.
    ///
    /// Every path through here sets exactly one result; nothing is retried.
    pub fn run(mut self, ctx: &PwmContext) -> PwmRequest {
        let result = execute(self.op, ctx, &self.request);
        if result.is_ok() {
            debug!("PWM {} on channel {} done", self.op, self.request.pin);
        } else {
            warn!("PWM {} on channel {} failed: {}", self.op, self.request.pin, result);
        }
        self.request.result = Some(result);
        self.request
    }
}

fn execute(op: PwmOp, ctx: &PwmContext, request: &PwmRequest) -> ResultCode {
    match op {
        PwmOp::Export => protocol::export(ctx, request),
        PwmOp::SetPeriod | PwmOp::SetFrequency => value_result(set_period(ctx, request)),
        PwmOp::SetDutyCycle => value_result(set_duty_cycle(ctx, request)),
        PwmOp::SetEnable => set_enable(ctx, request),
        PwmOp::Unexport => protocol::unexport(ctx, request),
    }
}

/// Path errors are [ResultCode::SysFailure]; rejected values and failed writes are
/// [ResultCode::WriteFailed].
fn value_result(result: PwmResult<()>) -> ResultCode {
    match result {
        Ok(()) => ResultCode::Ok,
        Err(err) => ResultCode::from(&err),
    }
}

fn set_enable(ctx: &PwmContext, request: &PwmRequest) -> ResultCode {
    let path = match ctx.layout.channel_file(request.pin, ENABLE) {
        Ok(path) => path,
        Err(err) => return ResultCode::from(&err),
    };
    let value = if request.enable { "1" } else { "0" };
    if ctx.control.write_value(&path, value) {
        ResultCode::Ok
    } else {
        ResultCode::WriteFailed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::MockControl;
    use crate::path::CHANNEL_FILES;
    use crate::PwmError;
    use std::sync::Arc;

    const DIR: &str = "/sys/class/pwm/pwmchip0/pwm5/";

    fn context() -> (Arc<MockControl>, PwmContext) {
        let mock = Arc::new(MockControl::new());
        mock.add_channel(DIR, &CHANNEL_FILES);
        let ctx = PwmContext::new(Default::default(), mock.clone());
        (mock, ctx)
    }

    #[test]
    fn result_is_set_on_completion() {
        let (_mock, ctx) = context();
        let request = PwmJob::new(PwmOp::SetPeriod, PwmRequest::new(5).with_period(0.001)).run(&ctx);
        assert_eq!(request.result, Some(ResultCode::Ok));
    }

    #[test]
    fn frequency_is_period_alias() {
        let (mock, ctx) = context();
        let request = PwmRequest::new(5).with_frequency(1000.0);
        let request = PwmJob::new(PwmOp::SetFrequency, request).run(&ctx);
        assert_eq!(request.result, Some(ResultCode::Ok));
        assert_eq!(mock.last_value(&format!("{}period", DIR)).as_deref(), Some("1000000"));

        let request = PwmJob::new(PwmOp::SetFrequency, PwmRequest::new(5).with_frequency(0.0)).run(&ctx);
        assert_eq!(request.result, Some(ResultCode::WriteFailed));
    }

    #[test]
    fn value_errors_map_to_result_codes() {
        assert_eq!(value_result(Ok(())), ResultCode::Ok);
        assert_eq!(value_result(Err(PwmError::PathFormat)), ResultCode::SysFailure);
        assert_eq!(value_result(Err(PwmError::PathAlloc)), ResultCode::SysFailure);
        assert_eq!(value_result(Err(PwmError::InvalidArgument)), ResultCode::WriteFailed);
        assert_eq!(
            value_result(Err(PwmError::Write("/sys/class/pwm/pwmchip0/pwm5/period".to_string()))),
            ResultCode::WriteFailed
        );
    }

    #[test]
    fn duty_cycle_write_failure() {
        let (mock, ctx) = context();
        mock.fail_writes_to("duty_cycle");
        let request = PwmRequest::new(5).with_period(0.02).with_duty_cycle(0.5);
        let request = PwmJob::new(PwmOp::SetDutyCycle, request).run(&ctx);
        assert_eq!(request.result, Some(ResultCode::WriteFailed));
    }

    #[test]
    fn set_period_rejects_invalid() {
        let (mock, ctx) = context();
        let request = PwmJob::new(PwmOp::SetPeriod, PwmRequest::new(5).with_period(-1.0)).run(&ctx);
        assert_eq!(request.result, Some(ResultCode::WriteFailed));
        assert!(mock.writes().is_empty());
    }

    #[test]
    fn duty_cycle_uses_request_period() {
        let (mock, ctx) = context();
        let request = PwmRequest::new(5).with_period(0.02).with_duty_cycle(0.25);
        let request = PwmJob::new(PwmOp::SetDutyCycle, request).run(&ctx);
        assert_eq!(request.result, Some(ResultCode::Ok));
        assert_eq!(mock.last_value(&format!("{}duty_cycle", DIR)).as_deref(), Some("5000000"));
        assert!(mock.writes_to(&format!("{}period", DIR)).is_empty());
    }

    #[test]
    fn enable_writes_flag() {
        let (mock, ctx) = context();
        let enable = format!("{}enable", DIR);

        let request = PwmJob::new(PwmOp::SetEnable, PwmRequest::new(5).with_enable(true)).run(&ctx);
        assert_eq!(request.result, Some(ResultCode::Ok));
        let request = PwmJob::new(PwmOp::SetEnable, PwmRequest::new(5).with_enable(false)).run(&ctx);
        assert_eq!(request.result, Some(ResultCode::Ok));

        assert_eq!(mock.writes_to(&enable), vec!["1", "0"]);
    }

    #[test]
    fn enable_write_failure() {
        let (mock, ctx) = context();
        mock.set_fail_writes(true);
        let request = PwmJob::new(PwmOp::SetEnable, PwmRequest::new(5).with_enable(true)).run(&ctx);
        assert_eq!(request.result, Some(ResultCode::WriteFailed));
    }

    #[test]
    fn export_and_unexport_jobs() {
        let mock = Arc::new(MockControl::new());
        let ctx = PwmContext::new(Default::default(), mock.clone());

        let request = PwmJob::new(PwmOp::Export, PwmRequest::new(9)).run(&ctx);
        assert_eq!(request.result, Some(ResultCode::Ok));
        let request = PwmJob::new(PwmOp::Unexport, request).run(&ctx);
        assert_eq!(request.result, Some(ResultCode::Ok));
        let request = PwmJob::new(PwmOp::Unexport, request).run(&ctx);
        assert_eq!(request.result, Some(ResultCode::Ok));

        assert_eq!(mock.writes_to("/sys/class/pwm/pwmchip0/export"), vec!["9"]);
        assert_eq!(mock.writes_to("/sys/class/pwm/pwmchip0/unexport"), vec!["9"]);
    }
}
