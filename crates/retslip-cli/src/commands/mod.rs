pub mod assemble;
pub mod profile;
pub mod summary;
pub mod validate;

use retslip_core::error::RetslipError;
use retslip_core::extraction::source_for_path;
use retslip_core::parsing::detect::Detectors;
use retslip_core::profile::builtin::{load_preset, DEFAULT_PRESET};
use retslip_core::profile::load_profile;
use retslip_core::profile::schema::ProfileDef;
use retslip_core::{choose_best_attempt, read_and_assemble, Attempt};
use std::path::{Path, PathBuf};

/// Profile and compiled detectors shared by the run commands.
pub struct Pipeline {
    pub profile: ProfileDef,
    pub detectors: Detectors,
}

impl Pipeline {
    pub fn load(profile_file: Option<PathBuf>) -> Result<Self, RetslipError> {
        let profile = match profile_file {
            Some(path) => load_profile(&path)?,
            None => load_preset(DEFAULT_PRESET)?,
        };
        let detectors = Detectors::compile(&profile)?;
        Ok(Pipeline { profile, detectors })
    }

    /// Assemble every file as an independent attempt and keep the best.
    ///
    /// A file that cannot be read is skipped with a warning as long as
    /// another attempt succeeds.
    pub fn best_attempt(&self, files: &[PathBuf]) -> Result<Attempt, RetslipError> {
        let mut attempts = Vec::new();
        let mut last_err = None;

        for file in files {
            match self.attempt(file) {
                Ok(attempt) => attempts.push(attempt),
                Err(e) => {
                    tracing::warn!(file = %file.display(), "skipping attempt: {e}");
                    last_err = Some(e);
                }
            }
        }

        let chosen = choose_best_attempt(attempts, &self.detectors);
        match (chosen, last_err) {
            (Some(attempt), _) => {
                if files.len() > 1 {
                    eprintln!("Using attempt {}", attempt.name);
                }
                Ok(attempt)
            }
            (None, Some(e)) => Err(e),
            (None, None) => Err(RetslipError::NoTables),
        }
    }

    fn attempt(&self, file: &Path) -> Result<Attempt, RetslipError> {
        let source = source_for_path(file)?;
        let bytes = std::fs::read(file)?;
        let assembly = read_and_assemble(&bytes, source.as_ref(), &self.profile)?;
        Ok(Attempt {
            name: file.display().to_string(),
            assembly,
        })
    }
}
