use crate::control::ControlFs;
use crate::PwmResult;
use log::{debug, trace, warn};
use std::fmt::{Debug, Formatter};
use std::fs::OpenOptions;
use std::path::Path;
use std::thread::sleep;
use std::time::{Duration, Instant};

/// [ControlFs] backed by the real filesystem.
///
/// After an export the kernel creates the channel files asynchronously, and udev may change
/// their permissions shortly after, so activation polls until every expected file can be
/// opened for writing or the export timeout runs out.
pub struct SysfsControl {
    pub export_timeout: Duration,
    pub poll_interval: Duration,
}

impl SysfsControl {
    pub fn new() -> Self {
        Self {
            export_timeout: Duration::from_secs(1),
            poll_interval: Duration::from_millis(10),
        }
    }

    pub fn with_export_timeout(mut self, export_timeout: Duration) -> Self {
        self.export_timeout = export_timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn leaves_ready(channel_dir: &str, leaves: &[&str]) -> bool {
        leaves.iter().all(|leaf| {
            let path = Path::new(channel_dir).join(leaf);
            OpenOptions::new().write(true).open(&path).is_ok()
        })
    }
}

impl Default for SysfsControl {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for SysfsControl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SysfsControl({:?})", self.export_timeout)
    }
}

impl ControlFs for SysfsControl {
    fn write_value(&self, path: &str, value: &str) -> bool {
        match std::fs::write(path, value) {
            Ok(()) => {
                trace!("Wrote {:?} to {}", value, path);
                true
            }
            Err(err) => {
                warn!("Writing {:?} to {} failed: {}", value, path, err);
                false
            }
        }
    }

    fn read_value(&self, path: &str) -> PwmResult<String> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn path_exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }

    fn activate_channel(
        &self,
        export_path: &str,
        pin: u32,
        channel_dir: &str,
        leaves: &[&str],
    ) -> bool {
        if !self.write_value(export_path, &pin.to_string()) {
            return false;
        }

        let deadline = Instant::now() + self.export_timeout;
        loop {
            if Self::leaves_ready(channel_dir, leaves) {
                debug!("Channel {} ready at {}", pin, channel_dir);
                return true;
            }
            if Instant::now() >= deadline {
                warn!("Channel {} files did not appear under {} in {:?}", pin, channel_dir, self.export_timeout);
                return false;
            }
            sleep(self.poll_interval);
        }
    }

    fn deactivate_channel(&self, unexport_path: &str, pin: u32) {
        if !self.write_value(unexport_path, &pin.to_string()) {
            warn!("Unexporting channel {} failed", pin);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread;

    fn control() -> SysfsControl {
        SysfsControl::new()
            .with_export_timeout(Duration::from_millis(200))
            .with_poll_interval(Duration::from_millis(5))
    }

    fn dir_str(path: &Path) -> String {
        format!("{}/", path.display())
    }

    #[test]
    fn write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("period");
        let path = path.to_str().unwrap();

        let control = control();
        assert!(control.write_value(path, "20000000"));
        assert_eq!(control.read_value(path).unwrap(), "20000000");
        assert!(control.path_exists(path));
    }

    #[test]
    fn write_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("enable");
        assert!(!control().write_value(path.to_str().unwrap(), "1"));
    }

    #[test]
    fn activation_succeeds_when_files_exist() {
        let dir = tempfile::tempdir().unwrap();
        let channel = dir.path().join("pwm0");
        fs::create_dir(&channel).unwrap();
        for leaf in ["duty_cycle", "period", "enable"] {
            fs::write(channel.join(leaf), "0").unwrap();
        }
        let export = dir.path().join("export");

        let ok = control().activate_channel(
            export.to_str().unwrap(),
            0,
            &dir_str(&channel),
            &["duty_cycle", "period", "enable"],
        );
        assert!(ok);
        assert_eq!(fs::read_to_string(export).unwrap(), "0");
    }

    #[test]
    fn activation_waits_for_files() {
        let dir = tempfile::tempdir().unwrap();
        let channel = dir.path().join("pwm3");
        let export = dir.path().join("export");

        let kernel = {
            let channel = channel.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                fs::create_dir(&channel).unwrap();
                for leaf in ["duty_cycle", "period", "enable"] {
                    fs::write(channel.join(leaf), "0").unwrap();
                }
            })
        };

        let ok = control().activate_channel(
            export.to_str().unwrap(),
            3,
            &dir_str(&channel),
            &["duty_cycle", "period", "enable"],
        );
        kernel.join().unwrap();
        assert!(ok);
    }

    #[test]
    fn activation_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let channel = dir.path().join("pwm1");
        let export = dir.path().join("export");

        let ok = control().activate_channel(
            export.to_str().unwrap(),
            1,
            &dir_str(&channel),
            &["duty_cycle"],
        );
        assert!(!ok);
    }

    #[test]
    fn deactivation_writes_pin() {
        let dir = tempfile::tempdir().unwrap();
        let unexport = dir.path().join("unexport");
        control().deactivate_channel(unexport.to_str().unwrap(), 12);
        assert_eq!(fs::read_to_string(unexport).unwrap(), "12");
    }
}
