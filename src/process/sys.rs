//! # OS-specific process control.
//!
//! The only platform conditionals of the crate live here:
//! - [`configure`] detaches a child from the supervisor's signal group, so an
//!   operator Ctrl-C reaches the supervisor only;
//! - [`interrupt`] asks a child to shut down gracefully.
//!
//! | Platform | `configure`                          | `interrupt`                                   |
//! |----------|--------------------------------------|-----------------------------------------------|
//! | Unix     | new process group (`setpgid(0, 0)`)  | `SIGINT` to the pid                           |
//! | Windows  | `CREATE_NEW_PROCESS_GROUP`           | `CTRL_BREAK_EVENT` to the child's group id    |

use std::io;

use tokio::process::Command;

#[cfg(unix)]
pub fn configure(cmd: &mut Command) {
    cmd.process_group(0);
}

#[cfg(unix)]
pub fn interrupt(pid: u32) -> io::Result<()> {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
    kill(Pid::from_raw(raw), Signal::SIGINT).map_err(io::Error::from)
}

#[cfg(windows)]
pub fn configure(cmd: &mut Command) {
    use windows_sys::Win32::System::Threading::CREATE_NEW_PROCESS_GROUP;

    cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
}

#[cfg(windows)]
pub fn interrupt(pid: u32) -> io::Result<()> {
    use windows_sys::Win32::System::Console::{CTRL_BREAK_EVENT, GenerateConsoleCtrlEvent};

    // The child leads its own process group, so its pid is the group id.
    let ok = unsafe { GenerateConsoleCtrlEvent(CTRL_BREAK_EVENT, pid) };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(any(unix, windows)))]
pub fn configure(_cmd: &mut Command) {}

#[cfg(not(any(unix, windows)))]
pub fn interrupt(_pid: u32) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "interrupting child processes is not supported on this platform",
    ))
}
