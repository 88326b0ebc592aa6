use std::fmt;

use serde::{Deserialize, Serialize};

/// FileMode represents the permission bits of a path (no file type bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileMode(u32);

impl FileMode {
    pub const GROUP_ALL: FileMode = FileMode(0o070);
    pub const OTHER_ALL: FileMode = FileMode(0o007);

    /// Owner read/write and nothing else.
    pub const OWNER_RW: FileMode = FileMode(0o600);

    const PERMISSION_BITS: u32 = 0o7777;

    /// Masks off file type bits so `st_mode` values can be passed directly.
    pub const fn new(bits: u32) -> Self {
        Self(bits & Self::PERMISSION_BITS)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True when group and other have no access at all.
    #[must_use]
    pub const fn is_owner_only(self) -> bool {
        self.0 & (Self::GROUP_ALL.0 | Self::OTHER_ALL.0) == 0
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}
