//! Build targets exposed to the host build system.

use crate::{absolute, process, BuildConfig, Error, Merger};
use std::{
    fmt,
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
    str::FromStr,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Target {
    MergeBin,
    UploadNobuild,
}

impl Target {
    pub const ALL: [Target; 2] = [Target::MergeBin, Target::UploadNobuild];

    pub fn name(self) -> &'static str {
        match self {
            Target::MergeBin => "merge_bin",
            Target::UploadNobuild => "upload_nobuild",
        }
    }

    pub fn spec(self, config: &BuildConfig) -> TargetSpec {
        match self {
            Target::MergeBin => TargetSpec {
                target: self,
                title: "Merge Firmware BIN",
                description: format!(
                    "Create merged BIN at ./{}/{}",
                    config.config.output_dir.display(),
                    config.output_file_name()
                ),
                dependencies: config
                    .artifacts()
                    .paths()
                    .iter()
                    .map(|path| path.to_path_buf())
                    .collect(),
                always_build: true,
            },
            Target::UploadNobuild => TargetSpec {
                target: self,
                title: "Upload Nobuild",
                description: "Runs pio upload without building new firmware".to_string(),
                dependencies: Vec::new(),
                always_build: true,
            },
        }
    }

    pub fn run(self, config: &BuildConfig) -> Result<ExitStatus, Error> {
        match self {
            Target::MergeBin => Merger::new(config)?.merge(),
            Target::UploadNobuild => {
                let mut command = upload_command(config)?;
                log::info!("[upload_nobuild] → {:?}", command);
                process::run(&mut command)
            }
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Target::ALL
            .iter()
            .copied()
            .find(|target| target.name() == s)
            .ok_or_else(|| Error::UnknownTarget(s.to_string()))
    }
}

/// How a target presents itself to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub target: Target,
    pub title: &'static str,
    pub description: String,
    pub dependencies: Vec<PathBuf>,
    /// Run on every build, whether or not the dependencies changed.
    pub always_build: bool,
}

pub fn registry(config: &BuildConfig) -> Vec<TargetSpec> {
    Target::ALL.iter().map(|target| target.spec(config)).collect()
}

/// The artifact whose creation fires the post-build merge.
pub fn post_action_trigger(config: &BuildConfig) -> PathBuf {
    config.artifacts().application
}

/// Whether producing `artifact` should run the post-build merge. Relative
/// paths on either side are taken from the working directory.
pub fn fires_post_action(config: &BuildConfig, artifact: &Path) -> Result<bool, Error> {
    let expected = absolute(&post_action_trigger(config))?;
    Ok(absolute(artifact)? == expected)
}

/// Re-upload what is already in the build directory.
pub fn upload_command(config: &BuildConfig) -> Result<Command, Error> {
    let config = config.normalized()?;
    let (program, leading) = config
        .config
        .upload
        .split_first()
        .ok_or(Error::MissingSetting("upload"))?;
    let mut command = Command::new(program);
    command
        .args(leading)
        .arg("-e")
        .arg(&config.env_name)
        .current_dir(&config.project_dir);
    Ok(command)
}
