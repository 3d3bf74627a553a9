use crate::app_config;
use chrono::NaiveDate;
use std::io;
use std::io::Write;
use std::iter;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::task;
use tokio::task::JoinError;
use tracing::{debug, info, instrument};

const CSV_DIR: &str = "csv";

/// Writes rendered reports into the destination directories, one PDF and one waypoint CSV per day.
#[derive(Clone, Debug)]
pub struct Publisher {
    output_dir: PathBuf,
    extra_output_dirs: Vec<PathBuf>,
    latest_alias: Option<String>,
    create_output_dir: bool,
}

impl Publisher {
    pub fn new(config: &app_config::Report) -> Self {
        Publisher {
            output_dir: config.output_dir().to_path_buf(),
            extra_output_dirs: config.extra_output_dirs().to_vec(),
            latest_alias: config.latest_alias().map(str::to_string),
            create_output_dir: config.create_output_dir(),
        }
    }

    pub fn file_name(date: NaiveDate) -> String {
        format!("{}.pdf", date.format("%Y-%m-%d"))
    }

    pub fn csv_file_name(date: NaiveDate) -> String {
        format!("{}.csv", date.format("%Y-%m-%d"))
    }

    fn directories(&self) -> impl Iterator<Item = &Path> {
        iter::once(self.output_dir.as_path()).chain(self.extra_output_dirs.iter().map(PathBuf::as_path))
    }

    /// Publishes `pdf` as `YYYY-MM-DD.pdf` and `csv` as `csv/YYYY-MM-DD.csv` in every destination directory,
    /// replacing earlier files for the same day. Other days are never touched, and readers never observe a partially
    /// written file. Returns the PDF path in the primary directory.
    #[instrument(skip_all, fields(output_dir = %self.output_dir.display(), bytes = pdf.len()))]
    pub async fn publish(&self, date: NaiveDate, pdf: &[u8], csv: &[u8]) -> Result<PathBuf, PublishError> {
        info!("📂 Publishing report for {}...", date);

        let publisher = self.clone();
        let pdf = pdf.to_vec();
        let csv = csv.to_vec();
        let path = task::spawn_blocking(move || publisher.publish_blocking(date, &pdf, &csv)).await??;

        info!("📂 Publishing report for {}... OK, '{}'", date, path.display());
        Ok(path)
    }

    fn publish_blocking(&self, date: NaiveDate, pdf: &[u8], csv: &[u8]) -> Result<PathBuf, PublishError> {
        // All destinations must exist before the first file is written
        if !self.create_output_dir {
            if let Some(missing) = self.directories().find(|directory| !directory.is_dir()) {
                return Err(PublishError::MissingDirectory(missing.to_path_buf()));
            }
        }
        for directory in self.directories() {
            let csv_dir = directory.join(CSV_DIR);
            std::fs::create_dir_all(&csv_dir).map_err(|e| PublishError::Io { source: e, path: csv_dir })?;
        }

        for directory in self.directories() {
            let csv_dir = directory.join(CSV_DIR);
            write_atomically(&csv_dir, &csv_dir.join(Self::csv_file_name(date)), csv)?;
            write_atomically(directory, &directory.join(Self::file_name(date)), pdf)?;

            if let Some(alias) = &self.latest_alias {
                write_atomically(directory, &directory.join(alias), pdf)?;
            }
            debug!("Published report for {} to '{}'", date, directory.display());
        }

        Ok(self.output_dir.join(Self::file_name(date)))
    }

}

fn write_atomically(directory: &Path, path: &Path, bytes: &[u8]) -> Result<(), PublishError> {
    let io_error = |source: io::Error| PublishError::Io {
        source,
        path: path.to_path_buf(),
    };

    let mut file = tempfile::NamedTempFile::new_in(directory).map_err(io_error)?;
    file.write_all(bytes).map_err(io_error)?;
    file.as_file().sync_all().map_err(io_error)?;
    file.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("output directory '{}' does not exist", .0.display())]
    MissingDirectory(PathBuf),
    #[error("unable to write '{}': {}", path.display(), source)]
    Io { source: io::Error, path: PathBuf },
    #[error(transparent)]
    JoinError(#[from] JoinError),
}
