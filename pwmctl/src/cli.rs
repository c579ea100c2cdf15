use thiserror::Error;
use pwmctl_pwm::{PwmOp, PwmRequest};

pub const USAGE: &str = "\
usage: pwmctl [--dry-run] <command> <pin> [args]

commands:
  export <pin> [period_s [duty]]   export the channel, optionally configuring it
  period <pin> <seconds>           set the period
  frequency <pin> <hz>             set the period from a frequency
  duty <pin> <period_s> <ratio>    set the duty cycle of the given period
  enable <pin> <0|1>               enable or disable the output
  unexport <pin>                   unexport the channel
  status <pin>                     export if needed and print the configuration";

#[derive(Debug, Error, Eq, PartialEq)]
pub enum UsageError {
    #[error("missing command")]
    MissingCommand,
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
    #[error("missing argument <{0}>")]
    MissingArgument(&'static str),
    #[error("invalid value {1:?} for <{0}>")]
    InvalidValue(&'static str, String),
    #[error("unexpected argument {0:?}")]
    UnexpectedArgument(String),
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Job { op: PwmOp, request: PwmRequest },
    Status { pin: u32 },
}

#[derive(Debug, PartialEq)]
pub struct Invocation {
    pub dry_run: bool,
    pub command: Command,
}

struct Args<I: Iterator<Item = String>>(I);

impl<I: Iterator<Item = String>> Args<I> {
    fn required<T: std::str::FromStr>(&mut self, name: &'static str) -> Result<T, UsageError> {
        let value = self.0.next().ok_or(UsageError::MissingArgument(name))?;
        value.parse().map_err(|_| UsageError::InvalidValue(name, value))
    }

    fn optional<T: std::str::FromStr>(&mut self, name: &'static str) -> Result<Option<T>, UsageError> {
        match self.0.next() {
            Some(value) => value.parse().map(Some).map_err(|_| UsageError::InvalidValue(name, value)),
            None => Ok(None),
        }
    }

    fn finish(mut self) -> Result<(), UsageError> {
        match self.0.next() {
            Some(extra) => Err(UsageError::UnexpectedArgument(extra)),
            None => Ok(()),
        }
    }
}

fn parse_enable(value: &str) -> Option<bool> {
    match value {
        "1" | "on" | "true" => Some(true),
        "0" | "off" | "false" => Some(false),
        _ => None,
    }
}

pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Invocation, UsageError> {
    let mut args = args.into_iter().peekable();
    let dry_run = args.next_if(|arg| arg == "--dry-run").is_some();
    let name = args.next().ok_or(UsageError::MissingCommand)?;
    let mut args = Args(args);

    let command = match name.as_str() {
        "status" => Command::Status { pin: args.required("pin")? },
        "export" => {
            let mut request = PwmRequest::new(args.required("pin")?);
            if let Some(period) = args.optional("period_s")? {
                request = request.with_period(period);
            }
            if let Some(duty) = args.optional("duty")? {
                request = request.with_duty_cycle(duty);
            }
            Command::Job { op: PwmOp::Export, request }
        }
        "period" => {
            let request = PwmRequest::new(args.required("pin")?).with_period(args.required("seconds")?);
            Command::Job { op: PwmOp::SetPeriod, request }
        }
        "frequency" => {
            let request = PwmRequest::new(args.required("pin")?).with_frequency(args.required("hz")?);
            Command::Job { op: PwmOp::SetFrequency, request }
        }
        "duty" => {
            let request = PwmRequest::new(args.required("pin")?)
                .with_period(args.required("period_s")?)
                .with_duty_cycle(args.required("ratio")?);
            Command::Job { op: PwmOp::SetDutyCycle, request }
        }
        "enable" => {
            let pin = args.required("pin")?;
            let value: String = args.required("0|1")?;
            let enable = parse_enable(&value).ok_or(UsageError::InvalidValue("0|1", value))?;
            Command::Job { op: PwmOp::SetEnable, request: PwmRequest::new(pin).with_enable(enable) }
        }
        "unexport" => Command::Job { op: PwmOp::Unexport, request: PwmRequest::new(args.required("pin")?) },
        _ => return Err(UsageError::UnknownCommand(name)),
    };

    args.finish()?;
    Ok(Invocation { dry_run, command })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Invocation, UsageError> {
        parse_args(line.split_whitespace().map(str::to_string))
    }

    fn job(line: &str) -> (PwmOp, PwmRequest) {
        match parse(line).unwrap().command {
            Command::Job { op, request } => (op, request),
            command => panic!("expected a job, got {:?}", command),
        }
    }

    #[test]
    fn export_with_optional_values() {
        let (op, request) = job("export 17");
        assert_eq!(op, PwmOp::Export);
        assert_eq!(request, PwmRequest::new(17));

        let (_, request) = job("export 17 0.02 0.5");
        assert_eq!(request, PwmRequest::new(17).with_period(0.02).with_duty_cycle(0.5));
    }

    #[test]
    fn value_commands() {
        assert_eq!(job("period 1 0.5"), (PwmOp::SetPeriod, PwmRequest::new(1).with_period(0.5)));
        assert_eq!(job("frequency 1 50"), (PwmOp::SetFrequency, PwmRequest::new(1).with_period(0.02)));
        assert_eq!(
            job("duty 1 0.02 0.25"),
            (PwmOp::SetDutyCycle, PwmRequest::new(1).with_period(0.02).with_duty_cycle(0.25))
        );
        assert_eq!(job("enable 1 on"), (PwmOp::SetEnable, PwmRequest::new(1).with_enable(true)));
        assert_eq!(job("enable 1 0"), (PwmOp::SetEnable, PwmRequest::new(1).with_enable(false)));
        assert_eq!(job("unexport 1"), (PwmOp::Unexport, PwmRequest::new(1)));
    }

    #[test]
    fn dry_run_and_status() {
        let invocation = parse("--dry-run status 4").unwrap();
        assert!(invocation.dry_run);
        assert_eq!(invocation.command, Command::Status { pin: 4 });
        assert!(!parse("status 4").unwrap().dry_run);
    }

    #[test]
    fn usage_errors() {
        assert_eq!(parse(""), Err(UsageError::MissingCommand));
        assert_eq!(parse("blink 1"), Err(UsageError::UnknownCommand("blink".to_string())));
        assert_eq!(parse("period 1"), Err(UsageError::MissingArgument("seconds")));
        assert_eq!(parse("period x 1"), Err(UsageError::InvalidValue("pin", "x".to_string())));
        assert_eq!(parse("enable 1 maybe"), Err(UsageError::InvalidValue("0|1", "maybe".to_string())));
        assert_eq!(parse("unexport 1 2"), Err(UsageError::UnexpectedArgument("2".to_string())));
    }
}
