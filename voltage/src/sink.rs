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

use std::fmt::Display;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::os::fd::AsFd;

use crate::errors::VoltageError;
use crate::VoltageResult;

/// Own duplicate of a caller provided sink, closing it leaves the caller handle open.
#[derive(Debug)]
pub(crate) struct DuplicatedSink {
    writer: BufWriter<File>,
}

impl DuplicatedSink {
    pub(crate) fn duplicate(sink: impl AsFd) -> VoltageResult<Self> {
        let fd = sink
            .as_fd()
            .try_clone_to_owned()
            .map_err(VoltageError::sink_duplication)?;

        Ok(Self {
            writer: BufWriter::new(File::from(fd)),
        })
    }

    pub(crate) fn write_line(&mut self, line: impl Display) -> VoltageResult<()> {
        writeln!(self.writer, "{line}").map_err(VoltageError::sink_write)
    }

    /// Flushes buffered lines and closes the duplicate.
    pub(crate) fn close(mut self) -> VoltageResult<()> {
        self.writer.flush().map_err(VoltageError::sink_write)
    }
}
