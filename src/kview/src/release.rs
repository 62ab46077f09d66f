//! Kernel release parsing (`uname -r` strings)

use crate::error::{KernelError, Result};
use std::fmt;
use std::str::FromStr;

/// `major.minor.patch` of a kernel release, ordered numerically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KernelRelease {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl KernelRelease {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// True when this release is `major.minor` or newer
    pub fn at_least(&self, major: u32, minor: u32) -> bool {
        (self.major, self.minor) >= (major, minor)
    }

    /// Release of the running kernel
    pub fn running() -> Result<Self> {
        let path = "/proc/sys/kernel/osrelease";
        let text = std::fs::read_to_string(path).map_err(|e| KernelError::io(path, e))?;
        text.trim().parse()
    }
}

impl FromStr for KernelRelease {
    type Err = KernelError;

    /// Accepts anything `uname -r` prints, e.g. "6.8.0-45-generic" or
    /// "5.15.153.1-microsoft-standard-WSL2"; only the leading numbers count.
    fn from_str(s: &str) -> Result<Self> {
        let mut numbers = s.trim().split('.').map(|part| {
            let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<u32>().ok()
        });

        let major = numbers.next().flatten();
        let minor = numbers.next().flatten();
        let patch = numbers.next().flatten().unwrap_or(0);

        match (major, minor) {
            (Some(major), Some(minor)) => Ok(KernelRelease::new(major, minor, patch)),
            _ => Err(KernelError::InvalidRelease(s.to_string())),
        }
    }
}

impl fmt::Display for KernelRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
