use crate::control::ControlFs;
use crate::{PwmError, PwmResult};
use log::trace;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MockState {
    dirs: BTreeSet<String>,
    files: BTreeMap<String, String>,
    writes: Vec<(String, String)>,
    fail_writes: bool,
    failing_suffixes: Vec<String>,
    fail_activation: bool,
}

/// In-memory [ControlFs] that plays the kernel's part.
///
/// Every write, including export and unexport, is recorded in order. Exporting creates the
/// channel directory and its files, unexporting removes them.
#[derive(Debug, Default)]
pub struct MockControl {
    state: Mutex<MockState>,
}

impl MockControl {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // Poisoning only means another test thread panicked; the state is still valid.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Makes a channel look already exported.
    pub fn add_channel(&self, channel_dir: &str, leaves: &[&str]) {
        let mut state = self.state();
        state.dirs.insert(channel_dir.to_string());
        for leaf in leaves {
            state.files.insert(format!("{}{}", channel_dir, leaf), "0".to_string());
        }
    }

    /// Makes every write fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    /// Makes writes to paths ending with `suffix` fail.
    pub fn fail_writes_to(&self, suffix: &str) {
        self.state().failing_suffixes.push(suffix.to_string());
    }

    /// Makes the channel files never appear after an export.
    pub fn set_fail_activation(&self, fail: bool) {
        self.state().fail_activation = fail;
    }

    /// All writes so far, as `(path, value)` pairs.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.state().writes.clone()
    }

    /// Writes so far to `path`, in order.
    pub fn writes_to(&self, path: &str) -> Vec<String> {
        self.state()
            .writes
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// The last value written to `path`.
    pub fn last_value(&self, path: &str) -> Option<String> {
        self.writes_to(path).pop()
    }
}

impl ControlFs for MockControl {
    fn write_value(&self, path: &str, value: &str) -> bool {
        let mut state = self.state();
        let failing = state.fail_writes
            || state.failing_suffixes.iter().any(|suffix| path.ends_with(suffix.as_str()));
        if failing {
            trace!("Mock write to {} failed", path);
            return false;
        }
        state.writes.push((path.to_string(), value.to_string()));
        state.files.insert(path.to_string(), value.to_string());
        true
    }

    fn read_value(&self, path: &str) -> PwmResult<String> {
        self.state()
            .files
            .get(path)
            .cloned()
            .ok_or(PwmError::Io(std::io::ErrorKind::NotFound))
    }

    fn path_exists(&self, path: &str) -> bool {
        let state = self.state();
        state.dirs.contains(path) || state.files.contains_key(path)
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
        if self.state().fail_activation {
            return false;
        }
        self.add_channel(channel_dir, leaves);
        true
    }

    fn deactivate_channel(&self, unexport_path: &str, pin: u32) {
        if !self.write_value(unexport_path, &pin.to_string()) {
            return;
        }
        let mut state = self.state();
        let suffix = format!("/pwm{}/", pin);
        let dir = state.dirs.iter().find(|dir| dir.ends_with(&suffix)).cloned();
        if let Some(dir) = dir {
            state.files.retain(|path, _| !path.starts_with(&dir));
            state.dirs.remove(&dir);
        }
    }
}
