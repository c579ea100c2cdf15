//! Access to the control files of the PWM subsystem.
//!
//! Everything the rest of the crate does to the filesystem goes through [ControlFs], so the
//! protocol can run against the real sysfs tree ([SysfsControl]) or an in-memory one
//! ([MockControl]).

mod sysfs;
mod mock;

use std::fmt::Debug;
use std::sync::Arc;
use crate::path::SysfsLayout;
use crate::PwmResult;
pub use sysfs::*;
pub use mock::*;

pub trait ControlFs: Debug + Send + Sync {
    /// Opens, writes and closes a control file. Returns `true` on success.
    fn write_value(&self, path: &str, value: &str) -> bool;

    /// Reads the whole content of a control file.
    fn read_value(&self, path: &str) -> PwmResult<String>;

    /// Checks whether a file or directory exists.
    fn path_exists(&self, path: &str) -> bool;

    /// Writes `pin` to the export file and waits for every file of `leaves` to become usable
    /// under `channel_dir`. Returns `true` once they all are.
    fn activate_channel(
        &self,
        export_path: &str,
        pin: u32,
        channel_dir: &str,
        leaves: &[&str],
    ) -> bool;

    /// Writes `pin` to the unexport file.
    fn deactivate_channel(&self, unexport_path: &str, pin: u32);
}

/// What every job runs against: the chip layout and the control-file backend.
#[derive(Clone, Debug)]
pub struct PwmContext {
    pub layout: SysfsLayout,
    pub control: Arc<dyn ControlFs>,
}

impl PwmContext {
    pub fn new(layout: SysfsLayout, control: Arc<dyn ControlFs>) -> Self {
        Self { layout, control }
    }

    /// Context for the default chip on the real sysfs tree.
    pub fn sysfs() -> Self {
        Self::new(SysfsLayout::default(), Arc::new(SysfsControl::new()))
    }
}
