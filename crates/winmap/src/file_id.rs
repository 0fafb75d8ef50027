use std::fmt;
#[cfg(unix)]
use std::os::unix::io::RawFd;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Identity a [`RegionList`](crate::region_list::RegionList) is keyed on: either an owned
/// filesystem path, or (Unix only) a raw file descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileId {
    Path(PathBuf),
    #[cfg(unix)]
    Fd(RawFd),
}

impl FileId {
    pub fn path(&self) -> Result<&Path> {
        match self {
            FileId::Path(p) => Ok(p.as_path()),
            #[cfg(unix)]
            FileId::Fd(_) => Err(Error::WrongIdentifierKind {
                expected: "path",
                actual: "fd",
            }),
        }
    }

    #[cfg(unix)]
    pub fn fd(&self) -> Result<RawFd> {
        match self {
            FileId::Fd(fd) => Ok(*fd),
            FileId::Path(_) => Err(Error::WrongIdentifierKind {
                expected: "fd",
                actual: "path",
            }),
        }
    }
}

impl From<PathBuf> for FileId {
    fn from(p: PathBuf) -> Self {
        FileId::Path(p)
    }
}

impl From<&Path> for FileId {
    fn from(p: &Path) -> Self {
        FileId::Path(p.to_path_buf())
    }
}

#[cfg(unix)]
impl From<RawFd> for FileId {
    fn from(fd: RawFd) -> Self {
        FileId::Fd(fd)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileId::Path(p) => write!(f, "{}", p.display()),
            #[cfg(unix)]
            FileId::Fd(fd) => write!(f, "fd:{fd}"),
        }
    }
}
