use crate::Error;
use std::process::{exit, Command, ExitStatus, Stdio};

/// Run `command` to completion with the terminal attached.
pub fn run(command: &mut Command) -> Result<ExitStatus, Error> {
    let status = command
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()?
        .wait()?;
    log::debug!("{:?} exited with {}", command, status);
    Ok(status)
}

#[cfg(unix)]
pub fn exit_with_process_status(status: ExitStatus) -> ! {
    use std::os::unix::process::ExitStatusExt;
    let code = status.code().or_else(|| status.signal()).unwrap_or(1);

    exit(code)
}

#[cfg(not(unix))]
pub fn exit_with_process_status(status: ExitStatus) -> ! {
    let code = status.code().unwrap_or(1);

    exit(code)
}
