use super::{AppConfig, MAX_FPS};
use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::{fs, path::Path};

const FFMPEG_ALLOWLIST: &[&str] = &["ffmpeg"];
const FFPROBE_ALLOWLIST: &[&str] = &["ffprobe"];

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values and normalize paths.
    pub fn validate(&mut self) -> Result<()> {
        let metadata = fs::metadata(&self.input)
            .with_context(|| format!("file not found: {}", self.input.display()))?;
        if !metadata.is_file() {
            bail!("{} is not a file", self.input.display());
        }

        if let Some(fps) = self.fps {
            if !fps.is_finite() || fps <= 0.0 || fps > MAX_FPS {
                bail!("--fps must be greater than 0 and at most {MAX_FPS}, got {fps}");
            }
        }

        if let Some(dir) = &self.frames_dir {
            if dir.as_os_str().is_empty() {
                bail!("--frames-dir cannot be empty");
            }
            if dir.exists() && !dir.is_dir() {
                bail!("--frames-dir {} is not a directory", dir.display());
            }
        }

        if !self.is_image() {
            self.ffmpeg_cmd = sanitize_binary(&self.ffmpeg_cmd, "--ffmpeg-cmd", FFMPEG_ALLOWLIST)?;
            self.ffprobe_cmd =
                sanitize_binary(&self.ffprobe_cmd, "--ffprobe-cmd", FFPROBE_ALLOWLIST)?;
        }
        Ok(())
    }
}

/// Accept a known command name, or an existing executable path (canonicalized).
pub(super) fn sanitize_binary(value: &str, flag: &str, allowlist: &[&str]) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("{flag} cannot be empty");
    }
    if let Some(allowed) = allowlist
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(trimmed))
    {
        return Ok((*allowed).to_string());
    }

    let path = Path::new(trimmed);
    if path.is_absolute() || trimmed.contains(std::path::MAIN_SEPARATOR) {
        let canonical = path
            .canonicalize()
            .with_context(|| format!("failed to canonicalize {flag} '{trimmed}'"))?;
        let metadata = fs::metadata(&canonical)
            .with_context(|| format!("failed to inspect {flag} '{}'", canonical.display()))?;
        if !metadata.is_file() {
            bail!("{flag} '{}' is not a file", canonical.display());
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = metadata.permissions().mode();
            if mode & 0o111 == 0 {
                bail!(
                    "{flag} '{}' exists but is not executable (mode {:o})",
                    canonical.display(),
                    mode
                );
            }
        }
        return canonical
            .to_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow!("{flag} must be valid UTF-8"));
    }

    bail!("{flag} must be one of {allowlist:?} or an existing binary path");
}
