//! Filesystem and identity restriction.
//!
//! These run once at startup, after the listening socket exists and before
//! the first connection is accepted. Every step is fatal on failure.

use std::ffi::{CStr, CString};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use tracing::info;

/// The unprivileged account the server runs as once started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdentity {
    pub name: String,
    pub uid: libc::uid_t,
    pub gid: libc::gid_t,
}

impl ServerIdentity {
    /// Looks `name` up in the password database.
    pub fn resolve(name: &str) -> anyhow::Result<Self> {
        let c_name = CString::new(name).with_context(|| format!("invalid user name {name:?}"))?;

        // SAFETY: getpwnam returns a pointer into static storage or null. The
        // fields are copied out before any other passwd call can run.
        let identity = unsafe {
            let pwd = libc::getpwnam(c_name.as_ptr());
            if pwd.is_null() {
                None
            } else {
                Some(Self {
                    name: CStr::from_ptr((*pwd).pw_name).to_string_lossy().into_owned(),
                    uid: (*pwd).pw_uid,
                    gid: (*pwd).pw_gid,
                })
            }
        };

        let identity = identity.with_context(|| format!("getpwnam: user {name:?} not found"))?;
        info!(
            user = %identity.name,
            uid = identity.uid,
            gid = identity.gid,
            "Resolved run-as identity"
        );
        Ok(identity)
    }
}

/// Confines the process to `root` and returns the path that now names it.
pub fn confine(root: &Path) -> anyhow::Result<PathBuf> {
    std::env::set_current_dir(root)
        .with_context(|| format!("chdir to {}", root.display()))?;
    std::os::unix::fs::chroot(".").with_context(|| format!("chroot to {}", root.display()))?;
    std::env::set_current_dir("/").context("chdir to / after chroot")?;

    info!("Chrooted to {}", root.display());
    Ok(PathBuf::from("/"))
}

/// Permanently switches the process to `identity`.
///
/// Supplementary groups are cleared and the group is switched before the
/// user, since a non-root user can no longer change groups. Fails if root
/// can be regained afterwards.
pub fn drop_to(identity: &ServerIdentity) -> anyhow::Result<()> {
    // SAFETY: plain syscalls with no pointer arguments besides the null list.
    unsafe {
        if libc::setgroups(0, std::ptr::null()) != 0 {
            return Err(io::Error::last_os_error()).context("setgroups");
        }
        if libc::setgid(identity.gid) != 0 {
            return Err(io::Error::last_os_error())
                .with_context(|| format!("setgid {}", identity.gid));
        }
        if libc::setuid(identity.uid) != 0 {
            return Err(io::Error::last_os_error())
                .with_context(|| format!("setuid {}", identity.uid));
        }
    }

    if identity.uid != 0 && unsafe { libc::setuid(0) } == 0 {
        bail!("privileges not dropped: setuid(0) still succeeds");
    }

    info!(uid = identity.uid, gid = identity.gid, "Dropped privileges to {}", identity.name);
    Ok(())
}
