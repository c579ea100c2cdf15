//! Device path construction for sysfs PWM channels.

use std::fmt::{Display, Formatter, Write};
use std::path::PathBuf;
use crate::{PwmError, PwmResult};

/// Chip used for every channel; only one chip per process is supported.
pub const DEFAULT_CHIP: u32 = 0;
/// Where the kernel exposes PWM chips.
pub const DEFAULT_ROOT: &str = "/sys/class/pwm";

pub const DUTY_CYCLE: &str = "duty_cycle";
pub const PERIOD: &str = "period";
pub const ENABLE: &str = "enable";
pub const EXPORT: &str = "export";
pub const UNEXPORT: &str = "unexport";
pub const NPWM: &str = "npwm";

/// Leaf files the kernel creates when a channel is exported.
pub const CHANNEL_FILES: [&str; 3] = [DUTY_CYCLE, PERIOD, ENABLE];

/// Counts the bytes a [Display] value would format to, without storing them.
struct LengthCounter(usize);

impl Write for LengthCounter {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.0 += s.len();
        Ok(())
    }
}

/// Formats `prefix` and appends `leaf` verbatim into a buffer of exactly the needed size.
///
/// The prefix length is measured first; an empty prefix fails with [PwmError::PathFormat]
/// before anything is allocated. No separator is inserted before `leaf`.
pub fn build_subpath(prefix: impl Display, leaf: Option<&str>) -> PwmResult<String> {
    let mut counter = LengthCounter(0);
    write!(counter, "{}", prefix).map_err(|_| PwmError::PathFormat)?;
    let prefix_len = counter.0;
    if prefix_len == 0 {
        return Err(PwmError::PathFormat);
    }

    let leaf = leaf.unwrap_or("");
    let mut path = String::new();
    path.try_reserve_exact(prefix_len + leaf.len())
        .map_err(|_| PwmError::PathAlloc)?;
    write!(path, "{}", prefix).map_err(|_| PwmError::PathFormat)?;
    path.push_str(leaf);
    Ok(path)
}

/// Channel directory template: `<root>/pwmchip<chip>/pwm<pin>/`.
struct ChannelDir<'a> {
    layout: &'a SysfsLayout,
    pin: u32,
}

impl Display for ChannelDir<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}pwm{}/", ChipDir(self.layout), self.pin)
    }
}

/// Chip directory template: `<root>/pwmchip<chip>/`.
struct ChipDir<'a>(&'a SysfsLayout);

impl Display for ChipDir<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let root = self.0.root.to_string_lossy();
        let root = root.trim_end_matches('/');
        write!(f, "{}/pwmchip{}/", root, self.0.chip)
    }
}

/// Names every control file of one PWM chip.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SysfsLayout {
    root: PathBuf,
    chip: u32,
}

impl SysfsLayout {
    pub fn new(root: impl Into<PathBuf>, chip: u32) -> Self {
        Self { root: root.into(), chip }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    pub fn chip(&self) -> u32 {
        self.chip
    }

    /// Directory of the channel, with a trailing `/`.
    pub fn channel_dir(&self, pin: u32) -> PwmResult<String> {
        build_subpath(ChannelDir { layout: self, pin }, None)
    }

    /// A leaf control file inside the channel directory.
    pub fn channel_file(&self, pin: u32, leaf: &str) -> PwmResult<String> {
        build_subpath(ChannelDir { layout: self, pin }, Some(leaf))
    }

    /// A control file of the chip itself, such as `export`.
    pub fn chip_file(&self, leaf: &str) -> PwmResult<String> {
        build_subpath(ChipDir(self), Some(leaf))
    }

    pub fn export_file(&self) -> PwmResult<String> {
        self.chip_file(EXPORT)
    }

    pub fn unexport_file(&self) -> PwmResult<String> {
        self.chip_file(UNEXPORT)
    }
}

impl Default for SysfsLayout {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT, DEFAULT_CHIP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Empty;

    impl Display for Empty {
        fn fmt(&self, _f: &mut Formatter<'_>) -> std::fmt::Result {
            Ok(())
        }
    }

    #[test]
    fn default_layout_paths() {
        let layout = SysfsLayout::default();
        assert_eq!(layout.channel_dir(17).unwrap(), "/sys/class/pwm/pwmchip0/pwm17/");
        assert_eq!(
            layout.channel_file(17, DUTY_CYCLE).unwrap(),
            "/sys/class/pwm/pwmchip0/pwm17/duty_cycle"
        );
        assert_eq!(layout.export_file().unwrap(), "/sys/class/pwm/pwmchip0/export");
        assert_eq!(layout.unexport_file().unwrap(), "/sys/class/pwm/pwmchip0/unexport");
    }

    #[test]
    fn root_trailing_slash_is_not_doubled() {
        let layout = SysfsLayout::new("/tmp/pwm/", 2);
        assert_eq!(layout.channel_file(0, ENABLE).unwrap(), "/tmp/pwm/pwmchip2/pwm0/enable");
    }

    #[test]
    fn leaf_is_appended_verbatim() {
        let path = build_subpath("abc", Some("def")).unwrap();
        assert_eq!(path, "abcdef");
    }

    #[test]
    fn buffer_holds_prefix_and_leaf() {
        let path = build_subpath("/sys/class/pwm/pwmchip0/pwm1/", Some(PERIOD)).unwrap();
        assert_eq!(path.len(), "/sys/class/pwm/pwmchip0/pwm1/period".len());
        assert!(path.capacity() >= path.len());
    }

    #[test]
    fn empty_prefix_fails() {
        assert_eq!(build_subpath(Empty, Some(ENABLE)), Err(PwmError::PathFormat));
        assert_eq!(build_subpath(Empty, None), Err(PwmError::PathFormat));
    }

    #[test]
    fn long_leaf_does_not_overflow() {
        let leaf = "x".repeat(4096);
        let path = SysfsLayout::default().channel_file(u32::MAX, &leaf).unwrap();
        assert!(path.starts_with("/sys/class/pwm/pwmchip0/pwm4294967295/"));
        assert!(path.ends_with(&leaf));
    }
}
