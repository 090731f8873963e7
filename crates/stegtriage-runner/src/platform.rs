//! Platform-specific child termination

use std::time::Duration;
use tokio::process::Child;

/// Terminate a child and everything in its process group.
///
/// Sends SIGTERM to the group, waits up to `grace` for the child to exit,
/// then sends SIGKILL to the group.
#[cfg(unix)]
pub(crate) async fn terminate(child: &mut Child, grace: Duration) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        // Already reaped
        return;
    };
    let pgid = Pid::from_raw(pid as i32);

    let _ = killpg(pgid, Signal::SIGTERM);

    if tokio::time::timeout(grace, child.wait()).await.is_ok() {
        return;
    }

    let _ = killpg(pgid, Signal::SIGKILL);
}

#[cfg(not(unix))]
pub(crate) async fn terminate(child: &mut Child, _grace: Duration) {
    let _ = child.start_kill();
}
