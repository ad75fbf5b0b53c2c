//! Advisory lock over the local working directory.
//!
//! Run artifacts and downloaded logs are rewritten on every invocation, so two
//! orchestrators sharing one working directory would clobber each other. The
//! lock turns that into an immediate `Busy` error.

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use crate::error::RigError;

pub const LOCK_FILE: &str = ".benchrig.lock";


/// File-lock guard that releases the lock on drop.
#[derive(Debug)]
pub struct WorkdirLock {
    file: File,
    path: PathBuf,
}

impl WorkdirLock {
    /// Take the lock without waiting. Fails with `Busy` if it is held.
    pub fn acquire(workdir: &Path) -> Result<WorkdirLock, RigError> {
        std::fs::create_dir_all(workdir)?;
        let path = workdir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        let ret = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if ret != 0 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EWOULDBLOCK) {
                return Err(RigError::Busy(workdir.to_path_buf()));
            }
            return Err(RigError::Io(err));
        }
        Ok(WorkdirLock { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkdirLock {
    fn drop(&mut self) {
        unsafe {
            libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_busy() {
        let dir = tempfile::tempdir().unwrap();
        let first = WorkdirLock::acquire(dir.path()).unwrap();
        assert!(first.path().ends_with(LOCK_FILE));
        let second = WorkdirLock::acquire(dir.path());
        assert!(matches!(second, Err(RigError::Busy(_))));
    }

    #[test]
    fn released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        drop(WorkdirLock::acquire(dir.path()).unwrap());
        assert!(WorkdirLock::acquire(dir.path()).is_ok());
    }

    #[test]
    fn creates_missing_workdir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        assert!(WorkdirLock::acquire(&nested).is_ok());
        assert!(nested.join(LOCK_FILE).exists());
    }
}
