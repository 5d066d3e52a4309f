//! Size-bounded rotating log file
//!
//! `RollingFile` is the file collaborator behind
//! [`RollingFileSink`](crate::sinks::RollingFileSink). It appends to a single
//! active file and, once that file reaches its size limit, shifts it into a
//! numbered backup (`app.log.1`, `app.log.2`, ...). Backups beyond the
//! retention count or older than the retention age are deleted on rotation.
//! Rotated files can optionally be gzip-compressed (`app.log.1.gz`).

use crate::core::error::{LoggerError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const MEGABYTE: u64 = 1024 * 1024;
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Retention and rotation limits for a [`RollingFile`]
///
/// A zero limit disables that limit, so `max_backups == 0` keeps every
/// backup and `max_age == Duration::ZERO` never expires one.
///
/// # Examples
///
/// ```
/// use rust_sink_logger::rolling::RollingPolicy;
///
/// let policy = RollingPolicy::new()
///     .with_max_size_megabytes(50)
///     .with_max_backups(7)
///     .with_max_age_days(14)
///     .with_compression(true);
///
/// assert_eq!(policy.max_size_bytes, 50 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollingPolicy {
    pub max_size_bytes: u64,
    pub max_backups: usize,
    pub max_age: Duration,
    pub compress: bool,
}

impl Default for RollingPolicy {
    fn default() -> Self {
        Self {
            max_size_bytes: 500 * MEGABYTE,
            max_backups: 3,
            max_age: 28 * DAY,
            compress: false,
        }
    }
}

impl RollingPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size_megabytes(mut self, megabytes: u64) -> Self {
        self.max_size_bytes = megabytes.saturating_mul(MEGABYTE);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size_bytes(mut self, bytes: u64) -> Self {
        self.max_size_bytes = bytes;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age_days(mut self, days: u64) -> Self {
        self.max_age = Duration::from_secs(days.saturating_mul(DAY.as_secs()));
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age(mut self, age: Duration) -> Self {
        self.max_age = age;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }
}

/// Append-only log file that rotates itself by size
pub struct RollingFile {
    base_path: PathBuf,
    policy: RollingPolicy,
    writer: Option<BufWriter<File>>,
    current_size: u64,
}

impl RollingFile {
    /// Open (or create) the active file, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created
    pub fn open<P: AsRef<Path>>(path: P, policy: RollingPolicy) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let (file, current_size) = Self::open_active(&base_path)?;

        Ok(Self {
            base_path,
            policy,
            writer: Some(BufWriter::new(file)),
            current_size,
        })
    }

    fn open_active(path: &Path) -> Result<(File, u64)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::file_sink(path.display().to_string(), format!("Failed to open: {}", e))
            })?;

        let size = file
            .metadata()
            .map_err(|e| {
                LoggerError::file_sink(
                    path.display().to_string(),
                    format!("Cannot access file metadata: {}", e),
                )
            })?
            .len();

        Ok((file, size))
    }

    /// Write one record, rotating first if it would overflow the size limit
    pub fn write_record(&mut self, record: &[u8]) -> Result<()> {
        let incoming = record.len() as u64;
        let limit = self.policy.max_size_bytes;

        if limit > 0 && self.current_size > 0 && self.current_size + incoming > limit {
            if let Err(e) = self.rotate() {
                eprintln!("[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.", e);
                // Let the file grow past its limit instead of retrying on every write
                self.current_size = 0;
            }
        }

        if self.writer.is_none() {
            let (file, size) = Self::open_active(&self.base_path)?;
            self.writer = Some(BufWriter::new(file));
            self.current_size = size;
        }

        let path = &self.base_path;
        if let Some(writer) = self.writer.as_mut() {
            writer.write_all(record).map_err(|e| {
                LoggerError::file_sink(
                    path.display().to_string(),
                    format!("Failed to write log entry: {}", e),
                )
            })?;
            self.current_size += incoming;
        }

        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush().map_err(|e| {
                LoggerError::file_sink(
                    self.base_path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }

    /// Flush and release the file handle. A later write reopens the file.
    pub fn close(&mut self) -> Result<()> {
        let result = self.flush();
        self.writer = None;
        result
    }

    /// Move the active file to `.1`, shifting older backups up by one
    pub fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        let highest = match self.policy.max_backups {
            0 => self.highest_backup_index(),
            max => {
                self.remove_backup(max);
                max.saturating_sub(1)
            }
        };

        for i in (1..=highest).rev() {
            self.shift_backup(i)?;
        }

        let backup_path = self.backup_path(1);
        if self.base_path.exists() {
            fs::rename(&self.base_path, &backup_path).map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to rotate current log file: {}", e),
                )
            })?;

            if self.policy.compress {
                self.compress_file(&backup_path)?;
            }
        }

        let (file, size) = Self::open_active(&self.base_path).map_err(|e| {
            LoggerError::file_rotation(
                self.base_path.display().to_string(),
                format!("Failed to create new log file: {}", e),
            )
        })?;
        self.writer = Some(BufWriter::new(file));
        self.current_size = size;

        self.remove_expired_backups();
        Ok(())
    }

    fn shift_backup(&self, index: usize) -> Result<()> {
        let old_path = self.backup_path(index);
        let new_path = self.backup_path(index + 1);
        let old_compressed = gz_path(&old_path);

        if old_compressed.exists() {
            fs::rename(&old_compressed, gz_path(&new_path)).map_err(|e| {
                LoggerError::file_rotation(
                    old_compressed.display().to_string(),
                    format!("Failed to rotate backup files: {}", e),
                )
            })?;
        } else if old_path.exists() {
            fs::rename(&old_path, &new_path).map_err(|e| {
                LoggerError::file_rotation(
                    old_path.display().to_string(),
                    format!("Failed to rotate backup files: {}", e),
                )
            })?;
        }
        Ok(())
    }

    fn remove_backup(&self, index: usize) {
        let path = self.backup_path(index);
        for candidate in [gz_path(&path), path] {
            if candidate.exists() {
                if let Err(e) = fs::remove_file(&candidate) {
                    eprintln!(
                        "[LOGGER WARNING] Failed to remove old backup {}: {}",
                        candidate.display(),
                        e
                    );
                }
            }
        }
    }

    fn remove_expired_backups(&self) {
        if self.policy.max_age.is_zero() {
            return;
        }

        let now = SystemTime::now();
        for index in 1..=self.highest_backup_index() {
            let path = self.backup_path(index);
            for candidate in [gz_path(&path), path] {
                let expired = fs::metadata(&candidate)
                    .and_then(|m| m.modified())
                    .map(|modified| {
                        now.duration_since(modified).unwrap_or(Duration::ZERO) > self.policy.max_age
                    })
                    .unwrap_or(false);

                if expired {
                    if let Err(e) = fs::remove_file(&candidate) {
                        eprintln!(
                            "[LOGGER WARNING] Failed to remove expired backup {}: {}",
                            candidate.display(),
                            e
                        );
                    }
                }
            }
        }
    }

    fn highest_backup_index(&self) -> usize {
        let mut index = 0;
        loop {
            let next = self.backup_path(index + 1);
            if next.exists() || gz_path(&next).exists() {
                index += 1;
            } else {
                return index;
            }
        }
    }

    /// Backup file path for the given index
    pub fn backup_path(&self, index: usize) -> PathBuf {
        let mut path = self.base_path.clone();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("app.log")
            .to_string();
        path.set_file_name(format!("{}.{}", filename, index));
        path
    }

    /// Gzip `path` next to itself, removing the original only on success
    fn compress_file(&self, path: &Path) -> Result<()> {
        let target = gz_path(path);
        let temp = path.with_file_name(format!(
            "{}.tmp",
            target.file_name().and_then(|n| n.to_str()).unwrap_or("backup.gz")
        ));

        let compress = || -> io::Result<()> {
            let mut input = io::BufReader::with_capacity(64 * 1024, File::open(path)?);
            let output = BufWriter::with_capacity(64 * 1024, File::create(&temp)?);
            let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());
            io::copy(&mut input, &mut encoder)?;
            encoder.finish()?.flush()?;
            fs::rename(&temp, &target)
        };

        if let Err(e) = compress() {
            let _ = fs::remove_file(&temp);
            return Err(LoggerError::io_operation(
                "compress log file",
                format!("Failed to compress {}", path.display()),
                e,
            ));
        }

        if let Err(e) = fs::remove_file(path) {
            eprintln!(
                "[LOGGER WARNING] Compression succeeded but failed to remove original file {}: {}",
                path.display(),
                e
            );
        }

        Ok(())
    }

    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    #[must_use]
    pub fn policy(&self) -> &RollingPolicy {
        &self.policy
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_record(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        RollingFile::flush(self).map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}

impl Drop for RollingFile {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

fn gz_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".gz");
    PathBuf::from(name)
}
