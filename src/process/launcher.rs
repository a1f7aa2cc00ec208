//! # Process launcher: provision, spawn, watch.
//!
//! [`Launcher::launch`] performs one launch attempt end to end:
//!
//! ```text
//! provision(addrs) ──► Vec<OwnedFd>
//!        │ err: ProvisionError (nothing spawned)
//!        ▼
//! spawn(binary, args, dir)          pre_exec: descriptors dup'd to fds 3..3+n,
//!        │ err: LaunchError::Spawn              LISTEN_FDS=n exported
//!        ▼
//! waiter task: wait() ──► trip exit token ──► post one ExitNotice
//! ```
//!
//! ## Rules
//! - Exactly one waiter task per launched child; it performs one wait and
//!   one channel post, then terminates. It is never cancelled early.
//! - A failed wait call is logged and does **not** suppress the exit notice.
//! - Descriptors are attached positionally in address order, so the worker
//!   discovers them at fd 3.. without knowing the addresses.

use std::io;
use std::os::fd::AsRawFd;
use std::path::PathBuf;

use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::LaunchError;
use crate::process::{ChildHandle, ChildId, ExitNotice};
use crate::sockets::Provisioner;

/// First fd slot the worker finds an inherited socket at.
const FD_BASE: i32 = 3;

/// Launches worker instances from one fixed configuration.
///
/// Every launch provisions the same address set — each generation inherits
/// duplicates of the same cached listening sockets — and posts eventual
/// exits to the same shared channel. The launcher holds the channel's
/// sender, so the receiver stays open for the supervisor's whole lifetime.
#[derive(Debug)]
pub struct Launcher {
    binary: PathBuf,
    args: Option<String>,
    working_dir: Option<PathBuf>,
    listen_addrs: Vec<String>,
    provisioner: Provisioner,
    exit_tx: mpsc::UnboundedSender<ExitNotice>,
}

impl Launcher {
    /// Creates a launcher for the configured worker.
    pub fn new(cfg: &Config, exit_tx: mpsc::UnboundedSender<ExitNotice>) -> Self {
        Self {
            binary: cfg.binary.clone(),
            args: cfg.args.clone(),
            working_dir: cfg.working_dir.clone(),
            listen_addrs: cfg.listen_addrs.clone(),
            provisioner: Provisioner::new(),
            exit_tx,
        }
    }

    /// Performs one launch attempt.
    ///
    /// Provisioning failure returns before anything is spawned. On success
    /// the returned handle is the only reference the caller needs; the OS
    /// child is owned by the waiter task until exit.
    ///
    /// Must be called from within a tokio runtime (the waiter is spawned).
    pub fn launch(&self) -> Result<ChildHandle, LaunchError> {
        let fds = self.provisioner.provision(&self.listen_addrs)?;

        let mut cmd = Command::new(&self.binary);
        if let Some(args) = &self.args {
            // the whole argument string travels as one argv entry, verbatim
            cmd.arg(args);
        }
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd.env("LISTEN_FDS", fds.len().to_string());
        // the supervisor retires children via SIGTERM, never on drop
        cmd.kill_on_drop(false);

        if !fds.is_empty() {
            let raw: Vec<i32> = fds.iter().map(|fd| fd.as_raw_fd()).collect();
            let mut lifted: Vec<i32> = Vec::with_capacity(raw.len());
            unsafe {
                cmd.pre_exec(move || {
                    lifted.clear();
                    inherit_fds(&raw, &mut lifted)
                });
            }
        }

        let mut child = cmd.spawn().map_err(|source| LaunchError::Spawn { source })?;
        // the duplicates must outlive spawn; the child now owns its own
        // copies at FD_BASE.. and the cached originals stay with the
        // provisioner
        drop(fds);

        let id = ChildId::next();
        let pid = child.id().unwrap_or(0);
        let exited = CancellationToken::new();
        let handle = ChildHandle::new(id, pid, exited.clone());
        info!(id = %id, pid, binary = %self.binary.display(), "worker spawned");

        let exit_tx = self.exit_tx.clone();
        tokio::spawn(async move {
            let status = match child.wait().await {
                Ok(status) => Some(status),
                Err(e) => {
                    warn!(id = %id, pid, error = %e, "wait for worker failed");
                    None
                }
            };
            exited.cancel();
            let _ = exit_tx.send(ExitNotice { id, pid, status });
        });

        Ok(handle)
    }
}

/// Moves the provisioned descriptors into the child's fd table at
/// `FD_BASE..FD_BASE + n`, in order, clearing close-on-exec.
///
/// Runs between fork and exec: only async-signal-safe calls, and `lifted`
/// is pre-allocated so nothing here touches the allocator. The two-pass
/// shape (lift above the target window, then `dup2` into place) makes the
/// shuffle safe even when a source descriptor already sits inside the
/// window.
fn inherit_fds(raw: &[i32], lifted: &mut Vec<i32>) -> io::Result<()> {
    let above = FD_BASE + raw.len() as i32;
    for &fd in raw {
        let dup = unsafe { libc::fcntl(fd, libc::F_DUPFD, above) };
        if dup < 0 {
            return Err(io::Error::last_os_error());
        }
        lifted.push(dup);
    }
    for (i, &dup) in lifted.iter().enumerate() {
        let dst = FD_BASE + i as i32;
        if unsafe { libc::dup2(dup, dst) } < 0 {
            return Err(io::Error::last_os_error());
        }
        unsafe { libc::close(dup) };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use std::time::Duration;

    fn write_script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("worker.sh");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn launcher_for(binary: &Path, cfg_mut: impl FnOnce(&mut Config)) -> (Launcher, mpsc::UnboundedReceiver<ExitNotice>) {
        let mut cfg = Config::new(binary);
        cfg_mut(&mut cfg);
        let (tx, rx) = mpsc::unbounded_channel();
        (Launcher::new(&cfg, tx), rx)
    }

    #[tokio::test]
    async fn test_exit_notice_identifies_child() {
        let (launcher, mut rx) = launcher_for(Path::new("/bin/true"), |_| {});
        let handle = launcher.launch().unwrap();

        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.id, handle.id());
        assert_eq!(notice.pid, handle.pid());
        assert!(notice.status.unwrap().success());
        assert!(handle.has_exited());
    }

    #[tokio::test]
    async fn test_each_launch_gets_fresh_identity() {
        let (launcher, mut rx) = launcher_for(Path::new("/bin/true"), |_| {});
        let first = launcher.launch().unwrap();
        let second = launcher.launch().unwrap();
        assert_ne!(first.id(), second.id());

        // both waiters post exactly one notice each
        let a = rx.recv().await.unwrap();
        let b = rx.recv().await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let (launcher, _rx) = launcher_for(Path::new("/nonexistent/worker"), |_| {});
        let err = launcher.launch().unwrap_err();
        assert!(matches!(err, LaunchError::Spawn { .. }), "{err}");
    }

    #[tokio::test]
    async fn test_provision_failure_spawns_nothing() {
        let holder = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let occupied = holder.local_addr().unwrap().to_string();
        let (launcher, mut rx) = launcher_for(Path::new("/bin/true"), |cfg| {
            cfg.listen_addrs = vec![occupied];
        });

        let err = launcher.launch().unwrap_err();
        assert!(matches!(err, LaunchError::Provision(_)), "{err}");
        // no waiter task, so no notice ever arrives
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_argument_string_is_single_argv_entry() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let script = write_script(dir.path(), &format!("echo \"$#:$1\" > {}", out.display()));

        let (launcher, mut rx) = launcher_for(&script, |cfg| {
            cfg.args = Some("alpha beta".to_string());
        });
        launcher.launch().unwrap();
        rx.recv().await.unwrap();

        assert_eq!(fs::read_to_string(&out).unwrap().trim(), "1:alpha beta");
    }

    #[tokio::test]
    async fn test_working_dir_applies_to_child() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "pwd > cwd");

        let (launcher, mut rx) = launcher_for(&script, |cfg| {
            cfg.working_dir = Some(dir.path().to_path_buf());
        });
        launcher.launch().unwrap();
        rx.recv().await.unwrap();

        let cwd = fs::read_to_string(dir.path().join("cwd")).unwrap();
        let reported = fs::canonicalize(cwd.trim()).unwrap();
        assert_eq!(reported, fs::canonicalize(dir.path()).unwrap());
    }

    #[tokio::test]
    async fn test_sockets_arrive_at_fd_base() {
        let dir = tempfile::tempdir().unwrap();
        // record the advertised count and the child's open fds
        let script = write_script(
            dir.path(),
            "echo \"$LISTEN_FDS\" > count\nls /proc/$$/fd > fds",
        );

        let (launcher, mut rx) = launcher_for(&script, |cfg| {
            cfg.working_dir = Some(dir.path().to_path_buf());
            cfg.listen_addrs = vec!["127.0.0.1:0".to_string(), "127.0.0.1:0".to_string()];
        });
        launcher.launch().unwrap();
        rx.recv().await.unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("count")).unwrap().trim(),
            "2"
        );
        let fds = fs::read_to_string(dir.path().join("fds")).unwrap();
        let open: Vec<&str> = fds.split_whitespace().collect();
        assert!(open.contains(&"3"), "fd 3 missing: {open:?}");
        assert!(open.contains(&"4"), "fd 4 missing: {open:?}");
    }
}
