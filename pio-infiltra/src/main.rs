use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use color_eyre::Result;
use env_logger::Env;
use infiltra_pack::{
    chip::Chip,
    process::{self, exit_with_process_status},
    BuildConfig, Config, Merger,
};
use structopt::StructOpt;

#[derive(StructOpt)]
struct Opt {
    /// PlatformIO environment to build
    env: String,
    /// Project root
    #[structopt(long, parse(from_os_str), default_value = ".")]
    project_dir: PathBuf,
    /// Microcontroller identifier from the board configuration
    #[structopt(long, env = "BOARD_MCU")]
    mcu: Option<String>,
    /// Chip to merge for, skipping resolution of --mcu
    #[structopt(long)]
    chip: Option<Chip>,
    /// Name of the application image, without extension
    #[structopt(long, default_value = "firmware")]
    prog_name: String,
    /// Path to infiltra-pack.toml, default to be <project-dir>/infiltra-pack.toml
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,
    /// Build only, don't merge the images afterwards
    #[structopt(long)]
    no_merge: bool,
}

#[paw::main]
fn main(args: Opt) -> Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(Env::default().default_filter_or("infiltra_pack=info"))
        .format_timestamp(None)
        .init();

    let project_dir = args.project_dir.canonicalize()?;

    let status = build(&project_dir, &args.env)?;
    if !status.success() {
        exit_with_process_status(status)
    }
    if args.no_merge {
        return Ok(());
    }

    let config_path = args
        .config
        .unwrap_or_else(|| project_dir.join(Config::FILE_NAME));
    let build_dir = project_dir.join(".pio").join("build").join(&args.env);
    let mut config = BuildConfig::new(build_dir, &project_dir, args.env);
    config.mcu = args.mcu;
    config.chip = args.chip;
    config.prog_name = args.prog_name;
    config.config = Config::load(&config_path)?;

    let status = Merger::new(&config)?.merge()?;
    if !status.success() {
        exit_with_process_status(status)
    }

    Ok(())
}

fn build(project_dir: &Path, env: &str) -> Result<ExitStatus> {
    log::info!("Building {}", env);
    let status = process::run(
        Command::new("platformio")
            .arg("run")
            .arg("-e")
            .arg(env)
            .current_dir(project_dir),
    )?;
    Ok(status)
}
