/*
 * Copyright 2024 Fluence Labs Limited
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error as ThisError;

use cpu_utils::LogicalCoreId;

use crate::RegisterId;

#[derive(ThisError, Debug)]
pub enum MSRError {
    #[error("opening MSR file '{path:?}' for read there is an error: {io_error:?}")]
    OpenForRead {
        core_id: LogicalCoreId,
        path: PathBuf,
        io_error: std::io::Error,
    },

    #[error("opening MSR file '{path:?}' for write there is an error: {io_error:?}")]
    OpenForWrite {
        core_id: LogicalCoreId,
        path: PathBuf,
        io_error: std::io::Error,
    },

    #[error(
        "access to MSR file '{path:?}' is denied, reading and writing MSR requires root or CAP_SYS_RAWIO"
    )]
    PermissionDenied {
        core_id: LogicalCoreId,
        path: PathBuf,
        write: bool,
    },

    #[error(
        "reading from register_id {register_id:#X} and MSR file of core {core_id} there is an error: {errno:?}"
    )]
    ReadWNoErr {
        register_id: RegisterId,
        core_id: LogicalCoreId,
        errno: Errno,
    },

    #[error(
        "writing value {value:#X} for register_id {register_id:#X} into MSR file of core {core_id} there is an error: {errno:?}"
    )]
    WriteWNoErr {
        value: u64,
        register_id: RegisterId,
        core_id: LogicalCoreId,
        errno: Errno,
    },

    #[error(
        "reading from register_id {register_id:#X} of core {core_id} returned {read} bytes instead of 8"
    )]
    ShortRead {
        register_id: RegisterId,
        core_id: LogicalCoreId,
        read: usize,
    },

    #[error(
        "writing value {value:#X} for register_id {register_id:#X} of core {core_id} wrote {written} bytes instead of 8"
    )]
    ShortWrite {
        value: u64,
        register_id: RegisterId,
        core_id: LogicalCoreId,
        written: usize,
    },

    #[error("MSR access is not supported on this platform")]
    Unsupported,
}

#[cfg(target_os = "linux")]
impl MSRError {
    pub(crate) fn open_for_read(
        core_id: LogicalCoreId,
        path: PathBuf,
        io_error: std::io::Error,
    ) -> Self {
        if io_error.kind() == std::io::ErrorKind::PermissionDenied {
            return Self::PermissionDenied {
                core_id,
                path,
                write: false,
            };
        }

        Self::OpenForRead {
            core_id,
            path,
            io_error,
        }
    }

    pub(crate) fn open_for_write(
        core_id: LogicalCoreId,
        path: PathBuf,
        io_error: std::io::Error,
    ) -> Self {
        if io_error.kind() == std::io::ErrorKind::PermissionDenied {
            return Self::PermissionDenied {
                core_id,
                path,
                write: true,
            };
        }

        Self::OpenForWrite {
            core_id,
            path,
            io_error,
        }
    }

    pub(crate) fn read_w_no_err(
        register_id: RegisterId,
        core_id: LogicalCoreId,
        errno: Errno,
    ) -> Self {
        Self::ReadWNoErr {
            register_id,
            core_id,
            errno,
        }
    }

    pub(crate) fn write_w_no_err(
        value: u64,
        register_id: RegisterId,
        core_id: LogicalCoreId,
        errno: Errno,
    ) -> Self {
        Self::WriteWNoErr {
            value,
            register_id,
            core_id,
            errno,
        }
    }

    pub(crate) fn short_read(register_id: RegisterId, core_id: LogicalCoreId, read: usize) -> Self {
        Self::ShortRead {
            register_id,
            core_id,
            read,
        }
    }

    pub(crate) fn short_write(
        value: u64,
        register_id: RegisterId,
        core_id: LogicalCoreId,
        written: usize,
    ) -> Self {
        Self::ShortWrite {
            value,
            register_id,
            core_id,
            written,
        }
    }
}

impl MSRError {
    /// True if the register device couldn't be opened at all.
    pub fn is_open_error(&self) -> bool {
        matches!(
            self,
            Self::OpenForRead { .. } | Self::OpenForWrite { .. } | Self::PermissionDenied { .. }
        )
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}
