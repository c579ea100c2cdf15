//! Export and unexport of a channel.
//!
//! A channel counts as exported exactly when its directory exists; nothing is remembered
//! between calls. Exporting an already exported channel skips the export write but still
//! applies the requested period and duty cycle.

use log::{debug, warn};
use crate::control::PwmContext;
use crate::path::CHANNEL_FILES;
use crate::value::{set_duty_cycle, set_period};
use crate::{PwmRequest, ResultCode};

pub fn export(ctx: &PwmContext, request: &PwmRequest) -> ResultCode {
    let channel_dir = match ctx.layout.channel_dir(request.pin) {
        Ok(path) => path,
        Err(err) => return ResultCode::from(&err),
    };

    if ctx.control.path_exists(&channel_dir) {
        debug!("PWM channel {} already exported", request.pin);
    } else {
        let export_path = match ctx.layout.export_file() {
            Ok(path) => path,
            Err(err) => return ResultCode::from(&err),
        };
        if !ctx.control.activate_channel(&export_path, request.pin, &channel_dir, &CHANNEL_FILES) {
            warn!("Exporting PWM channel {} failed", request.pin);
            return ResultCode::ExportFailed;
        }
        debug!("Exported PWM channel {} at {}", request.pin, channel_dir);
    }

    if request.period >= 0.0 {
        if let Err(err) = set_period(ctx, request) {
            warn!("Configuring period of PWM channel {} failed: {}", request.pin, err);
            return ResultCode::WriteFailed;
        }
        if request.duty_cycle >= 0.0 {
            if let Err(err) = set_duty_cycle(ctx, request) {
                warn!("Configuring duty cycle of PWM channel {} failed: {}", request.pin, err);
                return ResultCode::WriteFailed;
            }
        }
    }

    ResultCode::Ok
}

/// Unexports the channel if it is exported. Always reports [ResultCode::Ok] once the
/// paths could be built; a failing unexport write is only logged.
pub fn unexport(ctx: &PwmContext, request: &PwmRequest) -> ResultCode {
    let channel_dir = match ctx.layout.channel_dir(request.pin) {
        Ok(path) => path,
        Err(err) => return ResultCode::from(&err),
    };

    if ctx.control.path_exists(&channel_dir) {
        let unexport_path = match ctx.layout.unexport_file() {
            Ok(path) => path,
            Err(err) => return ResultCode::from(&err),
        };
        ctx.control.deactivate_channel(&unexport_path, request.pin);
        debug!("Unexported PWM channel {}", request.pin);
    } else {
        debug!("PWM channel {} not exported, nothing to do", request.pin);
    }

    ResultCode::Ok
}
