use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use tracing::warn;

use super::metric_sink_trait::MetricSink;

/// FS adapter for the scraped metrics file.
///
/// Writes go to a hidden sibling temp file which is synced and renamed over
/// the target, so the textfile scraper only ever sees a complete document.
#[derive(Debug, Clone)]
pub struct MetricFileFsAdapter {
    path: PathBuf,
}

impl MetricFileFsAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `.cost.prom.tmp` next to `cost.prom`; scrapers only pick up `*.prom`.
    fn tmp_path(&self) -> Result<PathBuf> {
        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("Metric path {:?} has no file name", self.path))?;
        Ok(self.path.with_file_name(format!(".{}.tmp", file_name)))
    }

    fn write_tmp(tmp_path: &Path, contents: &str) -> Result<()> {
        let file = File::create(tmp_path).context("Failed to create temp metric file")?;
        let mut writer = BufWriter::new(file);
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
        writer
            .get_ref()
            .sync_all()
            .context("Failed to sync temp metric file")?;
        Ok(())
    }
}

impl MetricSink for MetricFileFsAdapter {
    fn replace(&self, contents: &str) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).context("Failed to create metric directory")?;
        }

        let tmp_path = self.tmp_path()?;

        // handle is closed when write_tmp returns, on every path
        if let Err(e) = Self::write_tmp(&tmp_path, contents) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e).context("Failed to finalize metric file");
        }

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            sync_dir_best_effort(dir);
        }

        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// The rename already published the file; a failed directory sync only weakens durability.
fn sync_dir_best_effort(dir: &Path) {
    #[cfg(unix)]
    {
        let synced = File::open(dir).and_then(|dir_file| dir_file.sync_all());
        if let Err(e) = synced {
            warn!(dir = %dir.display(), error = %e, "Failed to sync metric directory");
        }
    }
    #[cfg(not(unix))]
    let _ = dir;
}
