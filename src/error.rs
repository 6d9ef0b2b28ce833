use std::fmt;

use failure::Fail;

use crate::protocol::Command;

/// Device sent something else than the protocol allows at this point; the
/// byte stream is out of sync.
#[derive(Debug, Fail)]
pub enum ProtocolError {
	#[fail(display = "did not receive boot byte")]
	MissingBootByte,
	#[fail(display = "unexpected boot byte 0x{:02x}, expected 0xab", _0)]
	UnexpectedBootByte(u8),
	#[fail(display = "did not receive ready byte for page {}", page)]
	MissingReadyByte {
		page: usize,
	},
	#[fail(display = "incorrect ready byte for page {}: expected 0xaa, received 0x{:02x}", page, received)]
	UnexpectedReadyByte {
		page: usize,
		received: u8,
	},
	#[fail(display = "unable to write echo byte")]
	EchoNotSent,
	#[fail(display = "did not receive echo byte")]
	MissingEcho,
	#[fail(display = "echo mismatch: received 0x{:02x} instead of 0xee", _0)]
	EchoMismatch(u8),
}

/// Which side of a transfer came up short
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Stream {
	Channel,
	File,
}

impl fmt::Display for Stream {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Stream::Channel => write!(f, "serial channel"),
			Stream::File => write!(f, "file"),
		}
	}
}

/// Position of a short transfer: a page index or the command bytes
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct At(pub Option<usize>);

impl fmt::Display for At {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self.0 {
			Some(page) => write!(f, "page {}", page),
			None => write!(f, "command"),
		}
	}
}

/// Fewer bytes than requested could be read or written.
#[derive(Debug, Fail)]
pub enum TransferError {
	#[fail(display = "{}: read {} bytes from {} instead of {}", at, actual, stream, expected)]
	ShortRead {
		stream: Stream,
		at: At,
		expected: usize,
		actual: usize,
	},
	#[fail(display = "{}: wrote {} bytes to {} instead of {}", at, actual, stream, expected)]
	ShortWrite {
		stream: Stream,
		at: At,
		expected: usize,
		actual: usize,
	},
}

/// Source for a whole-device write doesn't have the size of the EEPROM.
#[derive(Debug, Fail)]
#[fail(display = "file size ({}) does not match EEPROM size ({})", actual, expected)]
pub struct SizeMismatchError {
	pub actual: u64,
	pub expected: u64,
}

/// Invalid request; detected before talking to the device.
#[derive(Debug, Fail)]
pub enum ArgumentError {
	#[fail(display = "page count {} out of range (1..=512)", _0)]
	PageCountOutOfRange(usize),
	#[fail(display = "unknown SDP state argument {:?}", _0)]
	UnknownSdpState(String),
	#[fail(display = "command {} requires {}", command, expected)]
	EndpointMismatch {
		command: Command,
		expected: &'static str,
	},
}
