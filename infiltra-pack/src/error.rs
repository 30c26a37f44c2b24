use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("chip not recognized: {0}")]
    UnrecognizedChip(String),
    #[error("unknown build target: {0}")]
    UnknownTarget(String),
    #[error("missing setting: {0}")]
    MissingSetting(&'static str),
    #[error("Parse toml error")]
    TomlError(#[from] toml::de::Error),
}
