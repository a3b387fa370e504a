use anyhow::{Context, Result};
use pixterm::config::{AppConfig, DEFAULT_FPS};
use pixterm::source::{default_frames_dir, is_frame_file_name, probe_frame_rate};
use pixterm::{log_debug, log_debug_content};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// `--fps` wins; otherwise ask ffprobe and fall back to a fixed rate.
pub(crate) fn resolve_fps(config: &AppConfig) -> f64 {
    if let Some(fps) = config.fps {
        return fps;
    }
    match probe_frame_rate(&config.ffprobe_cmd, &config.input) {
        Ok(fps) => {
            log_debug(&format!("probed frame rate: {fps:.3}"));
            fps
        }
        Err(err) => {
            log_debug(&format!(
                "frame rate probe failed, using {DEFAULT_FPS}: {err:#}"
            ));
            DEFAULT_FPS
        }
    }
}

/// Directory that receives extracted frames; removes what it created on cleanup.
pub(crate) struct FramesDir {
    path: PathBuf,
    created: bool,
}

impl FramesDir {
    pub(crate) fn prepare(config: &AppConfig) -> Result<Self> {
        let path = match &config.frames_dir {
            Some(dir) => dir.clone(),
            None => {
                let millis = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_millis();
                default_frames_dir(Path::new("."), millis)
            }
        };
        let created = !path.exists();
        fs::create_dir_all(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        log_debug_content(&format!("frames directory: {}", path.display()));
        Ok(Self { path, created })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Remove extracted frames: the whole directory if we made it, else only frame files.
    pub(crate) fn cleanup(&self) -> Result<()> {
        if self.created {
            return fs::remove_dir_all(&self.path)
                .with_context(|| format!("failed to remove {}", self.path.display()));
        }
        let entries = fs::read_dir(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            if is_frame_file_name(&name.to_string_lossy()) {
                let path = entry.path();
                fs::remove_file(&path)
                    .with_context(|| format!("failed to remove {}", path.display()))?;
            }
        }
        Ok(())
    }
}
