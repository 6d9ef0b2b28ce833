//! Wire protocol of the serial EEPROM programmer firmware.
//!
//! A session looks like this:
//! - device sends `BOOT_READY` once it is operational
//! - host sends a single ASCII command byte; `r`/`w` are followed by the
//!   page count minus one as 16-bit little endian
//! - bulk phase: pages of `PAGE_SIZE` bytes; host-to-device pages are each
//!   preceded by a `PAGE_READY` byte from the device
//! - host sends `ECHO`, device answers with `ECHO`
//!
//! Pages always start at address 0 and are transferred in ascending order.

use std::fmt;
use std::str::FromStr;

use crate::error::ArgumentError;
use crate::transfer::{
	Direction,
	Gate,
	Transfer,
};

/// number of pages on the EEPROM
pub const PAGE_COUNT: usize = 512;
/// bytes per page
pub const PAGE_SIZE: usize = 64;
pub const TOTAL_SIZE: usize = PAGE_COUNT * PAGE_SIZE;

/// sent once by the device after reset
pub const BOOT_READY: u8 = 0xab;
/// device page buffer is free, host may send the next page
pub const PAGE_READY: u8 = 0xaa;
/// closes every command, echoed back unchanged
pub const ECHO: u8 = 0xee;

mod opcodes {
	pub const ERASE: u8 = b'e';
	pub const SDP_DISABLE: u8 = b's';
	pub const SDP_ENABLE: u8 = b'S';
	pub const DUMP: u8 = b'd';
	pub const FLASH: u8 = b'f';
	pub const READ_PARTIAL: u8 = b'r';
	pub const WRITE_PARTIAL: u8 = b'w';
}

pub use self::opcodes::*;

/// Software Data Protection mode of the EEPROM
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SdpState {
	Enable,
	Disable,
}

impl FromStr for SdpState {
	type Err = ArgumentError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"enable" => Ok(SdpState::Enable),
			"disable" => Ok(SdpState::Disable),
			_ => Err(ArgumentError::UnknownSdpState(s.into())),
		}
	}
}

impl fmt::Display for SdpState {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			SdpState::Enable => write!(f, "enable"),
			SdpState::Disable => write!(f, "disable"),
		}
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Command {
	/// fill the whole EEPROM with 0xff
	Erase,
	SdpEnable,
	SdpDisable,
	/// read the whole EEPROM
	Dump,
	/// write the whole EEPROM
	Flash,
	/// read the first `n` pages
	ReadPartial(usize),
	/// write the first `n` pages
	WritePartial(usize),
}

impl From<SdpState> for Command {
	fn from(state: SdpState) -> Self {
		match state {
			SdpState::Enable => Command::SdpEnable,
			SdpState::Disable => Command::SdpDisable,
		}
	}
}

impl Command {
	pub fn opcode(&self) -> u8 {
		match self {
			Command::Erase => ERASE,
			Command::SdpEnable => SDP_ENABLE,
			Command::SdpDisable => SDP_DISABLE,
			Command::Dump => DUMP,
			Command::Flash => FLASH,
			Command::ReadPartial(_) => READ_PARTIAL,
			Command::WritePartial(_) => WRITE_PARTIAL,
		}
	}

	/// page count for partial commands
	pub fn partial_pages(&self) -> Option<usize> {
		match *self {
			Command::ReadPartial(n) | Command::WritePartial(n) => Some(n),
			_ => None,
		}
	}

	pub fn validate(&self) -> Result<(), ArgumentError> {
		match self.partial_pages() {
			Some(n) if n < 1 || n > PAGE_COUNT => Err(ArgumentError::PageCountOutOfRange(n)),
			_ => Ok(()),
		}
	}

	/// Bytes sent to dispatch the command.
	///
	/// Partial commands carry `n - 1` as low byte, high byte.
	pub fn encode(&self) -> Result<Vec<u8>, ArgumentError> {
		self.validate()?;
		let mut buf = vec![self.opcode()];
		if let Some(n) = self.partial_pages() {
			let field = (n - 1) as u16;
			buf.push(field as u8);
			buf.push((field >> 8) as u8);
		}
		Ok(buf)
	}

	/// Bulk phase following the command byte(s), if any.
	pub fn transfer(&self) -> Option<Transfer> {
		match *self {
			Command::Erase | Command::SdpEnable | Command::SdpDisable => None,
			Command::Dump => Some(Transfer {
				direction: Direction::FromDevice,
				pages: PAGE_COUNT,
				gate: Gate::None,
			}),
			Command::Flash => Some(Transfer {
				direction: Direction::ToDevice,
				pages: PAGE_COUNT,
				gate: Gate::ReadyByte,
			}),
			Command::ReadPartial(n) => Some(Transfer {
				direction: Direction::FromDevice,
				pages: n,
				gate: Gate::None,
			}),
			Command::WritePartial(n) => Some(Transfer {
				direction: Direction::ToDevice,
				pages: n,
				gate: Gate::ReadyByte,
			}),
		}
	}
}

impl fmt::Display for Command {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Command::Erase => write!(f, "erase"),
			Command::SdpEnable => write!(f, "sdp enable"),
			Command::SdpDisable => write!(f, "sdp disable"),
			Command::Dump => write!(f, "dump"),
			Command::Flash => write!(f, "flash"),
			Command::ReadPartial(n) => write!(f, "read {} pages", n),
			Command::WritePartial(n) => write!(f, "write {} pages", n),
		}
	}
}
