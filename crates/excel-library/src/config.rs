use std::path::{Path, PathBuf};

pub const TEMP_DIR_ENV: &str = "EXCEL_LIBRARY_TEMP_DIR";
pub const WORKING_DIR_ENV: &str = "EXCEL_LIBRARY_WORKING_DIR";

/// Where a file name passed to an open or save operation is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMode {
    AsGiven,
    TempDir,
    WorkingDir,
}

impl PathMode {
    #[must_use]
    pub const fn from_temp_flag(use_temp_dir: bool) -> Self {
        if use_temp_dir {
            Self::TempDir
        } else {
            Self::AsGiven
        }
    }
}

/// Path resolution settings for [`crate::ExcelLibrary`].
///
/// The temp directory defaults to `/Temp` on Windows and `/tmp` elsewhere.
/// The working directory defaults to the process's current directory at the
/// moment a path is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryConfig {
    pub temp_dir: PathBuf,
    pub working_dir: Option<PathBuf>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            working_dir: None,
        }
    }
}

impl LibraryConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a config from `EXCEL_LIBRARY_TEMP_DIR` and
    /// `EXCEL_LIBRARY_WORKING_DIR`, falling back to the defaults for unset or
    /// empty variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(dir) = lookup(TEMP_DIR_ENV).filter(|s| !s.is_empty()) {
            config.temp_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(WORKING_DIR_ENV).filter(|s| !s.is_empty()) {
            config.working_dir = Some(PathBuf::from(dir));
        }
        config
    }

    #[must_use]
    pub fn with_temp_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.temp_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_working_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn resolve<P: AsRef<Path>>(&self, file_name: P, mode: PathMode) -> std::io::Result<PathBuf> {
        let file_name = file_name.as_ref();
        let resolved = match mode {
            PathMode::AsGiven => file_name.to_path_buf(),
            PathMode::TempDir => self.temp_dir.join(file_name),
            PathMode::WorkingDir => match &self.working_dir {
                Some(dir) => dir.join(file_name),
                None => std::env::current_dir()?.join(file_name),
            },
        };
        log::debug!(
            "Resolved {} ({:?}) to {}",
            file_name.display(),
            mode,
            resolved.display()
        );
        Ok(resolved)
    }
}

fn default_temp_dir() -> PathBuf {
    let name = if cfg!(windows) { "Temp" } else { "tmp" };
    PathBuf::from("/").join(name)
}
