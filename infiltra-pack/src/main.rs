use env_logger::Env;
use infiltra_pack::{
    absolute,
    chip::Chip,
    process::exit_with_process_status,
    targets::{self, Target},
    BuildConfig, Config, Error, Merger,
};
use main_error::MainError;
use std::{path::PathBuf, process::ExitStatus};
use structopt::StructOpt;

#[derive(StructOpt)]
struct BuildOpt {
    /// Microcontroller identifier from the board configuration
    #[structopt(long, env = "BOARD_MCU")]
    mcu: Option<String>,
    /// Chip to merge for, skipping resolution of --mcu
    #[structopt(long)]
    chip: Option<Chip>,
    /// Build output directory
    #[structopt(long, env = "BUILD_DIR", parse(from_os_str))]
    build_dir: Option<PathBuf>,
    /// Project root
    #[structopt(long, env = "PROJECT_DIR", parse(from_os_str), default_value = ".")]
    project_dir: PathBuf,
    /// Name of the application image, without extension
    #[structopt(long, env = "PROGNAME", default_value = "firmware")]
    prog_name: String,
    /// Build environment name
    #[structopt(short, long = "env", env = "PIOENV")]
    env_name: Option<String>,
    /// Path to infiltra-pack.toml, default to be <project-dir>/infiltra-pack.toml
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,
}

#[derive(StructOpt)]
struct PostBuildOpt {
    #[structopt(flatten)]
    build: BuildOpt,
    /// Artifact that was just produced, default to be <build-dir>/<prog-name>.bin
    #[structopt(parse(from_os_str))]
    trigger: Option<PathBuf>,
}

#[derive(StructOpt)]
enum Opt {
    /// Merge bootloader, partition table and application into one image
    MergeBin(BuildOpt),
    /// Merge after the application image has been built
    PostBuild(PostBuildOpt),
    /// Upload the firmware already in the build directory
    UploadNobuild(BuildOpt),
    /// Show the resolved chip, flash offsets and packer command
    Layout(BuildOpt),
    /// List the build targets
    Targets(BuildOpt),
}

impl BuildOpt {
    fn into_config(self) -> Result<BuildConfig, Error> {
        let project_dir = absolute(&self.project_dir)?;
        let config_path = self
            .config
            .unwrap_or_else(|| project_dir.join(Config::FILE_NAME));
        let build_dir = self.build_dir.ok_or(Error::MissingSetting("build dir"))?;
        let env_name = self.env_name.ok_or(Error::MissingSetting("env"))?;

        let mut config = BuildConfig::new(build_dir, project_dir, env_name);
        config.mcu = self.mcu;
        config.chip = self.chip;
        config.prog_name = self.prog_name;
        config.config = Config::load(&config_path)?;
        config.normalized()
    }
}

fn exit_on_failure(status: ExitStatus) {
    if !status.success() {
        exit_with_process_status(status)
    }
}

fn post_build(opt: PostBuildOpt) -> Result<(), Error> {
    let config = opt.build.into_config()?;
    let expected = targets::post_action_trigger(&config);
    let trigger = opt.trigger.unwrap_or_else(|| expected.clone());
    if !targets::fires_post_action(&config, &trigger)? {
        log::debug!(
            "{} is not {}, nothing to merge",
            trigger.display(),
            expected.display()
        );
        return Ok(());
    }
    exit_on_failure(Target::MergeBin.run(&config)?);
    Ok(())
}

fn layout(opt: BuildOpt) -> Result<(), Error> {
    let config = opt.into_config()?;
    let resolved = config.resolve_chip();
    let layout = resolved.chip.layout();

    if resolved.is_defaulted() {
        println!("chip:       {} (defaulted from {:?})", resolved.chip, config.mcu);
    } else {
        println!("chip:       {}", resolved.chip);
    }
    println!("bootloader: {:#x}", layout.bootloader);
    println!("partitions: {:#x}", layout.partition_table);
    println!("app:        {:#x}", layout.application);
    println!("output:     {}", config.output_path().display());
    println!("command:    {}", Merger::new(&config)?.command());
    Ok(())
}

fn list_targets(opt: BuildOpt) -> Result<(), Error> {
    let config = opt.into_config()?;
    for spec in targets::registry(&config) {
        println!("{:<16} {}", spec.target, spec.title);
        println!("{:<16} {}", "", spec.description);
        for dependency in &spec.dependencies {
            println!("{:<16} <- {}", "", dependency.display());
        }
    }
    println!(
        "post-action on {}",
        targets::post_action_trigger(&config).display()
    );
    Ok(())
}

#[paw::main]
fn main(args: Opt) -> Result<(), MainError> {
    env_logger::Builder::from_env(Env::default().default_filter_or("infiltra_pack=info"))
        .format_timestamp(None)
        .init();

    match args {
        Opt::MergeBin(opt) => exit_on_failure(Target::MergeBin.run(&opt.into_config()?)?),
        Opt::PostBuild(opt) => post_build(opt)?,
        Opt::UploadNobuild(opt) => exit_on_failure(Target::UploadNobuild.run(&opt.into_config()?)?),
        Opt::Layout(opt) => layout(opt)?,
        Opt::Targets(opt) => list_targets(opt)?,
    };

    Ok(())
}
