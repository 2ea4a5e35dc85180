use thiserror::Error;

/// Identifier of one addressable digital line.
pub type LineId = u8;

/// One iteration of the scan loop, the system's unit of logical time.
/// Tick counters wrap; elapsed time is always computed with `wrapping_sub`.
pub type Tick = u32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HalError {
    #[error("hardware fault on line {0}")]
    HardwareFault(LineId),
    #[error("timeout")]
    Timeout,
}

pub trait LineBackend: Send {
    /// Sample a digital input line.
    fn read_line(&mut self, line: LineId) -> Result<bool, HalError>;
    /// Drive an output line. Fire-and-forget, no acknowledgement.
    fn write_line(&mut self, line: LineId, value: bool);

    /// Latch all inputs before a sweep (batch backends).
    fn refresh_inputs(&mut self) -> Result<(), HalError> {
        Ok(())
    }
    /// Push all pending output writes (batch backends).
    fn flush_outputs(&mut self) -> Result<(), HalError> {
        Ok(())
    }
}

impl LineBackend for Box<dyn LineBackend> {
    fn read_line(&mut self, line: LineId) -> Result<bool, HalError> {
        (**self).read_line(line)
    }
    fn write_line(&mut self, line: LineId, value: bool) {
        (**self).write_line(line, value)
    }
    fn refresh_inputs(&mut self) -> Result<(), HalError> {
        (**self).refresh_inputs()
    }
    fn flush_outputs(&mut self) -> Result<(), HalError> {
        (**self).flush_outputs()
    }
}
