use crate::{chip::Chip, image::ImageSegment, process, BuildConfig, Error};
use sha2::{Digest, Sha256};
use std::{
    fmt, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
    time::SystemTime,
};

/// A packer invocation merging image segments into one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCommand {
    pub packer: Vec<String>,
    pub chip: Chip,
    pub output: PathBuf,
    pub segments: Vec<ImageSegment>,
}

impl MergeCommand {
    pub fn to_command(&self) -> Result<Command, Error> {
        let (program, leading) = self
            .packer
            .split_first()
            .ok_or(Error::MissingSetting("packer"))?;
        let mut command = Command::new(program);
        command
            .args(leading)
            .arg("--chip")
            .arg(self.chip.name())
            .arg("merge_bin")
            .arg("--output")
            .arg(&self.output);
        for segment in &self.segments {
            command.arg(segment.addr_hex()).arg(&segment.path);
        }
        Ok(command)
    }
}

impl fmt::Display for MergeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for word in &self.packer {
            if word.contains(char::is_whitespace) {
                write!(f, "\"{}\" ", word)?;
            } else {
                write!(f, "{} ", word)?;
            }
        }
        write!(
            f,
            "--chip {} merge_bin --output \"{}\"",
            self.chip,
            self.output.display()
        )?;
        for segment in &self.segments {
            write!(f, " {} \"{}\"", segment.addr_hex(), segment.path.display())?;
        }
        Ok(())
    }
}

pub struct Merger {
    config: BuildConfig,
}

impl Merger {
    /// Fails on an empty environment name; relative directories are made absolute.
    pub fn new(config: &BuildConfig) -> Result<Self, Error> {
        Ok(Merger {
            config: config.normalized()?,
        })
    }

    /// Create the output directory if needed. Existing directories and their
    /// contents are left alone.
    pub fn ensure_output_dir(&self) -> Result<PathBuf, Error> {
        let dir = self.config.output_dir();
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn command(&self) -> MergeCommand {
        let resolved = self.config.resolve_chip();
        let layout = resolved.chip.layout();
        log::debug!("{} layout: {}", resolved.chip, layout);
        MergeCommand {
            packer: self.config.config.packer.clone(),
            chip: resolved.chip,
            output: self.config.output_path(),
            segments: self.config.artifacts().segments(&layout),
        }
    }

    /// Run the packer. The returned status is the packer's own.
    pub fn merge(&self) -> Result<ExitStatus, Error> {
        self.ensure_output_dir()?;
        let merge = self.command();
        log::info!("[merge_bin] → {}", merge);

        let previous = Snapshot::of(&merge.output);
        let status = process::run(&mut merge.to_command()?)?;
        if status.success() {
            report(&merge.output);
        } else {
            log::error!("merge_bin failed: {}", status);
            if Snapshot::of(&merge.output) != previous {
                discard(&merge.output);
            }
        }
        Ok(status)
    }
}

/// Modification time and length of a file, `None` when absent.
#[derive(Debug, PartialEq, Eq)]
struct Snapshot(Option<(SystemTime, u64)>);

impl Snapshot {
    fn of(path: &Path) -> Self {
        Snapshot(
            fs::metadata(path)
                .ok()
                .and_then(|meta| Some((meta.modified().ok()?, meta.len()))),
        )
    }
}

fn report(output: &Path) {
    match fs::read(output) {
        Ok(image) => log::info!(
            "Merged {} ({} bytes) sha256 {:x}",
            output.display(),
            image.len(),
            Sha256::digest(&image)
        ),
        Err(e) => log::warn!("Packer succeeded but {} is unreadable: {}", output.display(), e),
    }
}

/// Drop what a failed packer run wrote at `output`.
fn discard(output: &Path) {
    match fs::remove_file(output) {
        Ok(()) => log::warn!("Removed incomplete {}", output.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => log::warn!("Could not remove {}: {}", output.display(), e),
    }
}
