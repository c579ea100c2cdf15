pub mod path;
pub mod value;
pub mod control;
pub mod protocol;
pub mod dispatch;
pub mod executor;
pub mod channel;

use std::fmt::{Display, Formatter};
use thiserror::Error;

pub use control::{ControlFs, MockControl, SysfsControl};
pub use dispatch::{PwmJob, PwmOp};
pub use executor::{JobId, PwmExecutor};
pub use path::SysfsLayout;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum PwmError {
    #[error("device path could not be formatted")]
    PathFormat,
    #[error("device path could not be allocated")]
    PathAlloc,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("exporting PWM channel {0} failed")]
    Export(u32),
    #[error("writing {0} failed")]
    Write(String),
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
    #[error("parsing {0} failed")]
    Parse(String),
}

impl From<std::io::Error> for PwmError {
    fn from(err: std::io::Error) -> Self {
        PwmError::Io(err.kind())
    }
}

pub type PwmResult<T> = Result<T, PwmError>;

/// Terminal outcome of a single PWM job, stored on its [PwmRequest].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ResultCode {
    /// The operation completed as requested.
    Ok,
    /// A device path could not be produced.
    SysFailure,
    /// The channel could not be exported.
    ExportFailed,
    /// A control file write failed, or the requested values were rejected.
    WriteFailed,
}

impl ResultCode {
    pub fn is_ok(&self) -> bool {
        matches!(self, ResultCode::Ok)
    }
}

impl From<&PwmError> for ResultCode {
    fn from(err: &PwmError) -> Self {
        match err {
            PwmError::PathFormat | PwmError::PathAlloc => ResultCode::SysFailure,
            PwmError::Export(_) => ResultCode::ExportFailed,
            _ => ResultCode::WriteFailed,
        }
    }
}

impl Display for ResultCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            ResultCode::Ok => "ok",
            ResultCode::SysFailure => "system failure",
            ResultCode::ExportFailed => "export failed",
            ResultCode::WriteFailed => "write failed",
        };
        write!(f, "{}", str)
    }
}

/// Marks a period or duty cycle that the caller did not ask to configure.
pub const NOT_REQUESTED: f64 = -1.0;

/// One PWM call, owned by the caller and moved into exactly one job.
///
/// `period` is in seconds and `duty_cycle` is a ratio of the period. Negative values
/// mean "leave unchanged" for [PwmOp::Export], which only configures what was given.
/// `result` stays `None` until the job has run.
#[derive(Clone, Debug, PartialEq)]
pub struct PwmRequest {
    pub pin: u32,
    pub period: f64,
    pub duty_cycle: f64,
    pub enable: bool,
    pub result: Option<ResultCode>,
}

impl PwmRequest {
    pub fn new(pin: u32) -> Self {
        Self {
            pin,
            period: NOT_REQUESTED,
            duty_cycle: NOT_REQUESTED,
            enable: false,
            result: None,
        }
    }

    pub fn with_period(mut self, period: f64) -> Self {
        self.period = period;
        self
    }

    /// Stores the period matching `frequency` (in Hz).
    ///
    /// A non-positive or non-finite frequency stores `NaN`, so the job rejects it.
    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.period = if frequency.is_finite() && frequency > 0.0 {
            1.0 / frequency
        } else {
            f64::NAN
        };
        self
    }

    pub fn with_duty_cycle(mut self, duty_cycle: f64) -> Self {
        self.duty_cycle = duty_cycle;
        self
    }

    pub fn with_enable(mut self, enable: bool) -> Self {
        self.enable = enable;
        self
    }
}
