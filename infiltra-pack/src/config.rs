use crate::{
    chip::{Chip, ChipOrigin, ResolvedChip},
    image::BuildArtifacts,
    Error,
};
use serde::Deserialize;
use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

/// Project-level settings, read from `infiltra-pack.toml`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Prefix of the merged image name.
    pub product_name: String,
    /// Directory under the project root receiving merged images.
    pub output_dir: PathBuf,
    /// Program and leading arguments of the image packer.
    pub packer: Vec<String>,
    /// Program and leading arguments of the upload command; `-e <env>` is appended.
    pub upload: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            product_name: "Infiltra".to_string(),
            output_dir: PathBuf::from("files"),
            packer: ["pio", "pkg", "exec", "-p", "tool-esptoolpy", "--", "esptool.py"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            upload: ["platformio", "run", "-t", "upload", "-t", "nobuild"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Config {
    pub const FILE_NAME: &'static str = "infiltra-pack.toml";

    /// Load the config file, falling back to defaults when it doesn't exist.
    pub fn load(path: &Path) -> Result<Self, Error> {
        match fs::read_to_string(path) {
            Ok(content) => {
                log::debug!("Loading config from {}", path.display());
                Config::from_toml(&content)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::trace!("No config at {}, using defaults", path.display());
                Ok(Config::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, Error> {
        Ok(toml::from_str(content)?)
    }
}

/// Everything a single build invocation hands to the packer.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// `build.mcu` from the board definition.
    pub mcu: Option<String>,
    /// Explicit chip, bypassing resolution of `mcu`.
    pub chip: Option<Chip>,
    pub build_dir: PathBuf,
    pub project_dir: PathBuf,
    pub prog_name: String,
    pub env_name: String,
    pub config: Config,
}

impl BuildConfig {
    pub fn new<B, P, E>(build_dir: B, project_dir: P, env_name: E) -> Self
    where
        B: Into<PathBuf>,
        P: Into<PathBuf>,
        E: Into<String>,
    {
        BuildConfig {
            mcu: None,
            chip: None,
            build_dir: build_dir.into(),
            project_dir: project_dir.into(),
            prog_name: "firmware".to_string(),
            env_name: env_name.into(),
            config: Config::default(),
        }
    }

    /// Copy with absolute directories, rejecting an empty environment name.
    pub fn normalized(&self) -> Result<BuildConfig, Error> {
        if self.env_name.is_empty() {
            return Err(Error::MissingSetting("env"));
        }
        Ok(BuildConfig {
            build_dir: absolute(&self.build_dir)?,
            project_dir: absolute(&self.project_dir)?,
            ..self.clone()
        })
    }

    pub fn resolve_chip(&self) -> ResolvedChip {
        match self.chip {
            Some(chip) => ResolvedChip {
                chip,
                origin: ChipOrigin::Recognized,
            },
            None => Chip::resolve(self.mcu.as_deref()),
        }
    }

    pub fn artifacts(&self) -> BuildArtifacts {
        BuildArtifacts::in_build_dir(&self.build_dir, &self.prog_name)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.project_dir.join(&self.config.output_dir)
    }

    /// `<product>-<env>.bin`; the environment name keeps environments sharing
    /// a project root from writing the same file.
    pub fn output_file_name(&self) -> String {
        format!("{}-{}.bin", self.config.product_name, self.env_name)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir().join(self.output_file_name())
    }
}

/// `path` resolved against the working directory when it is relative.
pub fn absolute(path: &Path) -> Result<PathBuf, Error> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn output_name_embeds_environment() {
        let config = BuildConfig::new("/p/.pio/build/esp32dev", "/p", "esp32dev");
        assert_eq!(config.output_file_name(), "Infiltra-esp32dev.bin");
        assert_eq!(
            config.output_path(),
            Path::new("/p/files/Infiltra-esp32dev.bin")
        );

        let other = BuildConfig::new("/p/.pio/build/esp32dev", "/p", "esp32-s3-devkitc");
        assert_ne!(config.output_path(), other.output_path());
    }

    #[test]
    fn chip_override_wins() {
        let mut config = BuildConfig::new("/b", "/p", "dev");
        config.mcu = Some("esp8266".to_string());
        assert!(config.resolve_chip().is_defaulted());

        config.chip = Some(Chip::Esp32c3);
        let resolved = config.resolve_chip();
        assert_eq!(resolved.chip, Chip::Esp32c3);
        assert!(!resolved.is_defaulted());
    }

    #[test]
    fn normalized_paths_are_absolute() {
        let config = BuildConfig::new("rel/build", "rel", "dev")
            .normalized()
            .unwrap();
        let cwd = env::current_dir().unwrap();
        assert!(config.build_dir.is_absolute());
        assert_eq!(config.build_dir, cwd.join("rel/build"));
        assert_eq!(config.project_dir, cwd.join("rel"));
        assert_eq!(config.output_path(), cwd.join("rel/files/Infiltra-dev.bin"));

        let config = BuildConfig::new("/b", "/p", "dev").normalized().unwrap();
        assert_eq!(config.build_dir, Path::new("/b"));
    }

    #[test]
    fn empty_environment_is_rejected() {
        assert!(matches!(
            BuildConfig::new("/b", "/p", "").normalized(),
            Err(Error::MissingSetting("env"))
        ));
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            product_name = "Widget"
            packer = ["esptool.py"]
            "#,
        )
        .unwrap();
        assert_eq!(config.product_name, "Widget");
        assert_eq!(config.packer, ["esptool.py"]);
        assert_eq!(config.output_dir, Path::new("files"));
        assert_eq!(config.upload, Config::default().upload);
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(matches!(
            Config::from_toml("product_name = 3"),
            Err(Error::TomlError(_))
        ));
        assert!(matches!(
            Config::from_toml("colour = \"red\""),
            Err(Error::TomlError(_))
        ));
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(&dir.path().join(Config::FILE_NAME)).unwrap();
        assert_eq!(config, Config::default());

        fs::write(dir.path().join(Config::FILE_NAME), "output_dir = \"out\"").unwrap();
        let config = Config::load(&dir.path().join(Config::FILE_NAME)).unwrap();
        assert_eq!(config.output_dir, Path::new("out"));
    }
}
