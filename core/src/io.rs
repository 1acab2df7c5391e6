//! Collaborator seams around the decoding core

use crate::error::Result;
use crate::samples::SampleBuffer;
use crate::table::ResultTable;

/// Produces one capture per call
pub trait AudioSource {
    fn capture(&mut self) -> Result<SampleBuffer>;
}

/// Consumes the finished result table
pub trait ResultSink {
    fn consume(&mut self, table: &ResultTable) -> Result<()>;
}

/// Source replaying a buffer already in memory
pub struct BufferSource {
    buffer: SampleBuffer,
}

impl BufferSource {
    pub fn new(buffer: SampleBuffer) -> Self {
        Self { buffer }
    }
}

impl AudioSource for BufferSource {
    fn capture(&mut self) -> Result<SampleBuffer> {
        Ok(self.buffer.clone())
    }
}

/// Sink keeping the last table it received
#[derive(Default)]
pub struct MemorySink {
    table: Option<ResultTable>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self) -> Option<&ResultTable> {
        self.table.as_ref()
    }

    pub fn into_table(self) -> Option<ResultTable> {
        self.table
    }
}

impl ResultSink for MemorySink {
    fn consume(&mut self, table: &ResultTable) -> Result<()> {
        self.table = Some(table.clone());
        Ok(())
    }
}
