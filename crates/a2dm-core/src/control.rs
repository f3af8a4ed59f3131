//! Location of the live-command channel.
//!
//! While `a2dm run` is active it listens on a unix socket so that other
//! invocations (`a2dm pause 3`) reach the manager that owns the engine
//! processes instead of editing the store behind its back. Only the path
//! convention lives here; the listener and client are CLI concerns.

use anyhow::Result;
use std::path::PathBuf;

/// Default path of the control socket (same XDG state dir as the task store).
pub fn default_control_socket_path() -> Result<PathBuf> {
    let dir = xdg::BaseDirectories::with_prefix("a2dm")?.get_state_home();
    Ok(dir.join("control.sock"))
}
