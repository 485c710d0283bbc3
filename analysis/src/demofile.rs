//! Framed event container.
//!
//! ```text
//! header: id [u8; 8] | version u32
//! cmd:    cmd u8 | tick u32 | size u32 | payload [u8; size]
//! ```
//!
//! All integers are little endian. Event payloads are bitcode encoded
//! [`DemoEvent`]s and the stream is terminated by a stop cmd.

use crate::{DecodeError, DemoEvent, Decoder};
use common::Tick;

pub const DEMO_HEADER_ID: [u8; 8] = *b"TLDEMO\0\0";
pub const CURRENT_VERSION: u32 = 1;

pub const DEMO_HEADER_SIZE: usize = DEMO_HEADER_ID.len() + 4;
pub const CMD_HEADER_SIZE: usize = 1 + 4 + 4;

const CMD_EVENT: u8 = 1;
const CMD_STOP: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CmdHeader {
    pub cmd: u8,
    pub tick: Tick,
    pub size: u32,
}

#[derive(Debug)]
pub struct DemoFile<'b> {
    buf: &'b [u8],
    pos: usize,
    version: u32,
    stopped: bool,
}

impl<'b> DemoFile<'b> {
    pub fn parse(buf: &'b [u8]) -> Result<Self, DecodeError> {
        let got: [u8; 8] = read_array(buf, 0)?;
        if got != DEMO_HEADER_ID {
            return Err(DecodeError::UnexpectedHeaderId {
                want: DEMO_HEADER_ID,
                got,
            });
        }

        let version = u32::from_le_bytes(read_array(buf, DEMO_HEADER_ID.len())?);
        if version != CURRENT_VERSION {
            return Err(DecodeError::UnsupportedVersion {
                found: version,
                supported: CURRENT_VERSION,
            });
        }

        Ok(Self {
            buf,
            pos: DEMO_HEADER_SIZE,
            version,
            stopped: false,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Whether the stop cmd has been read. Bytes after it are never looked at.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn read_cmd_header(&mut self) -> Result<CmdHeader, DecodeError> {
        let raw: [u8; CMD_HEADER_SIZE] = read_array(self.buf, self.pos)?;
        self.pos += CMD_HEADER_SIZE;

        let [cmd, t0, t1, t2, t3, s0, s1, s2, s3] = raw;
        Ok(CmdHeader {
            cmd,
            tick: u32::from_le_bytes([t0, t1, t2, t3]),
            size: u32::from_le_bytes([s0, s1, s2, s3]),
        })
    }
}

impl Decoder for DemoFile<'_> {
    fn next_event(&mut self) -> Result<Option<(Tick, DemoEvent)>, DecodeError> {
        if self.stopped {
            return Ok(None);
        }

        let cmd_offset = self.pos;
        let header = self.read_cmd_header()?;
        match header.cmd {
            CMD_STOP => {
                self.stopped = true;
                Ok(None)
            }
            CMD_EVENT => {
                let payload = read_slice(self.buf, self.pos, header.size as usize)?;
                let event = bitcode::deserialize::<DemoEvent>(payload).map_err(|source| {
                    DecodeError::InvalidPayload {
                        offset: cmd_offset,
                        source,
                    }
                })?;
                self.pos += payload.len();

                Ok(Some((header.tick, event)))
            }
            cmd => Err(DecodeError::UnknownCmd {
                offset: cmd_offset,
                cmd,
            }),
        }
    }

    fn progress(&self) -> f32 {
        if self.buf.is_empty() {
            return 1.0;
        }
        (self.pos as f32 / self.buf.len() as f32).clamp(0.0, 1.0)
    }
}

fn read_slice(buf: &[u8], offset: usize, len: usize) -> Result<&[u8], DecodeError> {
    offset
        .checked_add(len)
        .and_then(|end| buf.get(offset..end))
        .ok_or(DecodeError::Truncated {
            offset,
            needed: len - buf.len().saturating_sub(offset).min(len),
        })
}

fn read_array<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N], DecodeError> {
    let slice = read_slice(buf, offset, N)?;
    let mut out = [0; N];
    out.copy_from_slice(slice);
    Ok(out)
}

/// Builds a demo container in memory.
#[derive(Debug)]
pub struct DemoWriter {
    buf: Vec<u8>,
    last_tick: Tick,
}

impl DemoWriter {
    pub fn new() -> Self {
        Self::with_version(CURRENT_VERSION)
    }

    pub fn with_version(version: u32) -> Self {
        let mut buf = Vec::with_capacity(4096);
        buf.extend_from_slice(&DEMO_HEADER_ID);
        buf.extend_from_slice(&version.to_le_bytes());

        Self { buf, last_tick: 0 }
    }

    pub fn event(&mut self, tick: Tick, event: &DemoEvent) -> Result<&mut Self, bitcode::Error> {
        let payload = bitcode::serialize(event)?;
        self.write_cmd(CMD_EVENT, tick, &payload);
        self.last_tick = tick;
        Ok(self)
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.write_cmd(CMD_STOP, self.last_tick, &[]);
        self.buf
    }

    fn write_cmd(&mut self, cmd: u8, tick: Tick, payload: &[u8]) {
        self.buf.push(cmd);
        self.buf.extend_from_slice(&tick.to_le_bytes());
        self.buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        self.buf.extend_from_slice(payload);
    }
}

impl Default for DemoWriter {
    fn default() -> Self {
        Self::new()
    }
}
