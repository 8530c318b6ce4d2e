// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{ControllerError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ControllerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_project(cfg)?;
    validate_run(cfg)?;
    validate_output(cfg)?;
    validate_archive(cfg)?;
    Ok(())
}

fn validate_project(cfg: &RawConfigFile) -> Result<()> {
    if cfg.project.name.trim().is_empty() {
        return Err(ControllerError::ConfigError(
            "[project].name must not be empty".to_string(),
        ));
    }
    if cfg.project.results_dir.as_os_str().is_empty() {
        return Err(ControllerError::ConfigError(
            "[project].results_dir must not be empty".to_string(),
        ));
    }
    if cfg.project.build_script.as_os_str().is_empty() {
        return Err(ControllerError::ConfigError(
            "[project].build_script must not be empty".to_string(),
        ));
    }
    if let Some(date) = &cfg.project.current_date {
        if date.is_empty() || date.contains(['/', '\\']) {
            return Err(ControllerError::ConfigError(format!(
                "[project].current_date must be a plain directory name (got {date:?})"
            )));
        }
    }
    Ok(())
}

fn validate_run(cfg: &RawConfigFile) -> Result<()> {
    if cfg.run.clean_results < -1 {
        return Err(ControllerError::ConfigError(format!(
            "[run].clean_results must be >= -1 (got {})",
            cfg.run.clean_results
        )));
    }
    if cfg.run.clean_project && cfg.project.base_dir.is_none() {
        return Err(ControllerError::ConfigError(
            "[run].clean_project requires [project].base_dir".to_string(),
        ));
    }
    Ok(())
}

fn validate_output(cfg: &RawConfigFile) -> Result<()> {
    // "\t" is accepted as an escaped tab separator.
    if cfg.output.csv_separator != "\\t" && cfg.output.csv_separator.chars().count() != 1 {
        return Err(ControllerError::ConfigError(format!(
            "[output].csv_separator must be a single character (got {:?})",
            cfg.output.csv_separator
        )));
    }
    if cfg.output.csv_decimal_mark.chars().count() != 1 {
        return Err(ControllerError::ConfigError(format!(
            "[output].csv_decimal_mark must be a single character (got {:?})",
            cfg.output.csv_decimal_mark
        )));
    }
    if cfg.output.analysis_output_dir.is_empty() {
        return Err(ControllerError::ConfigError(
            "[output].analysis_output_dir must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_archive(cfg: &RawConfigFile) -> Result<()> {
    let cmd = &cfg.archive.extract_cmd;
    if cmd.is_empty() {
        return Err(ControllerError::ConfigError(
            "[archive].extract_cmd must name a program".to_string(),
        ));
    }
    for placeholder in ["{archive}", "{dir}"] {
        if !cmd.iter().any(|arg| arg.contains(placeholder)) {
            return Err(ControllerError::ConfigError(format!(
                "[archive].extract_cmd must contain the {placeholder} placeholder"
            )));
        }
    }
    Ok(())
}
