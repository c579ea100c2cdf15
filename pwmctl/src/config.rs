use std::env::var_os;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use dotenv::var;
use log::{debug, info, warn};
use serde::{Serialize, Deserialize};
use pwmctl_pwm::path::{DEFAULT_CHIP, DEFAULT_ROOT};
use pwmctl_pwm::{SysfsControl, SysfsLayout};

const CONFIG_VAR: &str = "PWMCTL_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "pwmctl.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub sysfs_root: PathBuf,
    pub chip: u32,
    pub workers: usize,
    pub export_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Config {
    /// Config file named by `PWMCTL_CONFIG`, or `pwmctl.json`.
    pub fn path() -> PathBuf {
        let config_str = var_os(CONFIG_VAR);
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new(DEFAULT_CONFIG_FILE));
        PathBuf::from(config_str)
    }

    /// Loads the config at `config_path`.
    ///
    /// `Ok(None)` only when the file does not exist; unreadable or malformed files are errors.
    pub fn try_load(config_path: &Path) -> eyre::Result<Option<Self>> {
        let file = match std::fs::File::open(config_path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(eyre::eyre!("opening {} failed: {}", config_path.display(), err)),
        };
        let reader = std::io::BufReader::new(file);
        let config = serde_json::from_reader(reader)
            .map_err(|err| eyre::eyre!("parsing {} failed: {}", config_path.display(), err))?;
        Ok(Some(config))
    }

    /// Loads the config at `config_path`, writing the defaults there if no file exists yet.
    pub fn load_or_create(config_path: &Path) -> eyre::Result<Self> {
        if let Some(config) = Self::try_load(config_path)? {
            debug!("Config loaded from {}.", config_path.display());
            return Ok(config);
        }

        info!("Config not found. Using default");
        let config = Config::default();
        if let Err(err) = config.save(config_path) {
            warn!("Saving default config to {} failed: {}", config_path.display(), err);
        }
        Ok(config)
    }

    pub fn save(&self, config_path: &Path) -> std::io::Result<()> {
        let file = std::fs::File::create(config_path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Applies `PWMCTL_SYSFS_ROOT`, `PWMCTL_CHIP` and `PWMCTL_WORKERS` on top of the file.
    pub fn apply_env(&mut self) -> eyre::Result<()> {
        if let Ok(root) = var("PWMCTL_SYSFS_ROOT") {
            self.sysfs_root = PathBuf::from(root);
        }
        if let Ok(chip) = var("PWMCTL_CHIP") {
            self.chip = chip.parse()?;
        }
        if let Ok(workers) = var("PWMCTL_WORKERS") {
            self.workers = workers.parse()?;
        }
        Ok(())
    }

    pub fn layout(&self) -> SysfsLayout {
        SysfsLayout::new(self.sysfs_root.clone(), self.chip)
    }

    pub fn control(&self) -> SysfsControl {
        SysfsControl::new()
            .with_export_timeout(Duration::from_millis(self.export_timeout_ms))
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sysfs_root: PathBuf::from(DEFAULT_ROOT),
            chip: DEFAULT_CHIP,
            workers: 2,
            export_timeout_ms: 1000,
            poll_interval_ms: 10,
        }
    }
}
