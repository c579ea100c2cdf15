use crate::channel::{PwmDriver, PwmPin};
use crate::control::PwmContext;
use crate::path::{DUTY_CYCLE, ENABLE, NPWM, PERIOD};
use crate::{protocol, PwmError, PwmRequest, PwmResult, ResultCode};
use log::debug;
use std::fmt::{Debug, Formatter};

/// The PWM chip described by a [PwmContext].
pub struct PwmChip {
    ctx: PwmContext,
}

impl PwmChip {
    pub fn new(ctx: PwmContext) -> Self {
        Self { ctx }
    }

    /// Unexports the channel at the given index, if it is exported.
    pub fn release_pin(&self, index: u32) -> PwmResult<()> {
        match protocol::unexport(&self.ctx, &PwmRequest::new(index)) {
            ResultCode::Ok => Ok(()),
            _ => Err(PwmError::PathFormat),
        }
    }
}

impl Debug for PwmChip {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PwmChip({:?}, {})", self.ctx.layout.root(), self.ctx.layout.chip())
    }
}

impl PwmDriver for PwmChip {
    fn count(&self) -> PwmResult<usize> {
        let path = self.ctx.layout.chip_file(NPWM)?;
        let content = self.ctx.control.read_value(&path)?;
        let count: usize = content.trim().parse().map_err(|_| PwmError::Parse("PWM channel count".to_string()))?;
        Ok(count)
    }

    fn get_pin(&self, index: u32) -> PwmResult<Box<dyn PwmPin + '_>> {
        match protocol::export(&self.ctx, &PwmRequest::new(index)) {
            ResultCode::Ok => {}
            ResultCode::SysFailure => return Err(PwmError::PathFormat),
            _ => return Err(PwmError::Export(index)),
        }

        debug!("Using PWM channel {} on chip {}", index, self.ctx.layout.chip());

        Ok(Box::new(PwmChannel {
            chip: self,
            pin: index,
        }))
    }
}

/// Handle to one exported channel of a [PwmChip].
pub struct PwmChannel<'a> {
    chip: &'a PwmChip,
    pin: u32,
}

impl PwmChannel<'_> {
    fn read(&self, leaf: &str) -> PwmResult<String> {
        let path = self.chip.ctx.layout.channel_file(self.pin, leaf)?;
        let content = self.chip.ctx.control.read_value(&path)?;
        Ok(content.trim().to_string())
    }

    fn read_ns(&self, leaf: &str) -> PwmResult<u32> {
        self.read(leaf)?
            .parse()
            .map_err(|_| PwmError::Parse(format!("PWM {}", leaf)))
    }

    fn write(&self, leaf: &str, value: &str) -> PwmResult<()> {
        let path = self.chip.ctx.layout.channel_file(self.pin, leaf)?;
        if self.chip.ctx.control.write_value(&path, value) {
            Ok(())
        } else {
            Err(PwmError::Write(path))
        }
    }
}

impl Debug for PwmChannel<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}]", self.chip, self.pin)
    }
}

impl PwmPin for PwmChannel<'_> {
    fn period_ns(&self) -> PwmResult<u32> {
        self.read_ns(PERIOD)
    }

    fn set_period_ns(&mut self, period_ns: u32) -> PwmResult<()> {
        self.write(PERIOD, &period_ns.to_string())
    }

    fn duty_ns(&self) -> PwmResult<u32> {
        self.read_ns(DUTY_CYCLE)
    }

    fn set_duty_ns(&mut self, duty_ns: u32) -> PwmResult<()> {
        self.write(DUTY_CYCLE, &duty_ns.to_string())
    }

    fn is_enabled(&self) -> PwmResult<bool> {
        match self.read(ENABLE)?.as_str() {
            "1" => Ok(true),
            "0" => Ok(false),
            _ => Err(PwmError::Parse("PWM enabled state".to_string())),
        }
    }

    fn enable(&mut self) -> PwmResult<()> {
        self.write(ENABLE, "1")
    }

    fn disable(&mut self) -> PwmResult<()> {
        self.write(ENABLE, "0")
    }
}
