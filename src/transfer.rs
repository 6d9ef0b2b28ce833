use std::io::{
	self,
	Read,
	Seek,
	SeekFrom,
	Write,
};

use crate::channel::{
	read_exact,
	write_exact,
	Channel,
};
use crate::error::{
	At,
	ProtocolError,
	Stream,
};
use crate::protocol::{
	PAGE_READY,
	PAGE_SIZE,
};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
	/// device -> host (dump, read)
	FromDevice,
	/// host -> device (flash, write)
	ToDevice,
}

/// what the host waits for before each page
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Gate {
	None,
	/// device signals a free page buffer with `PAGE_READY`
	ReadyByte,
}

/// Local data for the bulk phase of a command
pub trait Source: Read + Seek {}

impl<T: Read + Seek + ?Sized> Source for T {}

pub enum Endpoint<'a> {
	Nothing,
	Sink(&'a mut dyn Write),
	Source(&'a mut dyn Source),
}

const NO_FILE: &str = "no local file";
const OUTPUT_FILE: &str = "an output file";
const INPUT_FILE: &str = "an input file";

impl<'a> Endpoint<'a> {
	pub fn describe(&self) -> &'static str {
		match self {
			Endpoint::Nothing => NO_FILE,
			Endpoint::Sink(_) => OUTPUT_FILE,
			Endpoint::Source(_) => INPUT_FILE,
		}
	}
}

/// total size of a source; leaves it positioned at the start
pub fn source_len<S: Seek + ?Sized>(source: &mut S) -> io::Result<u64> {
	let len = source.seek(SeekFrom::End(0))?;
	source.seek(SeekFrom::Start(0))?;
	Ok(len)
}

/// Page-granular bulk copy between the device and a local endpoint.
///
/// Strictly one page at a time in ascending order; any short read or write
/// aborts the transfer immediately.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Transfer {
	pub direction: Direction,
	pub pages: usize,
	pub gate: Gate,
}

impl Transfer {
	/// kind of endpoint this transfer needs
	pub fn endpoint(&self) -> &'static str {
		match self.direction {
			Direction::FromDevice => OUTPUT_FILE,
			Direction::ToDevice => INPUT_FILE,
		}
	}

	pub fn accepts(&self, endpoint: &Endpoint) -> bool {
		match (self.direction, endpoint) {
			(Direction::FromDevice, Endpoint::Sink(_)) => true,
			(Direction::ToDevice, Endpoint::Source(_)) => true,
			_ => false,
		}
	}

	pub fn run<C>(&self, channel: &mut C, endpoint: &mut Endpoint) -> crate::AResult<()>
	where
		C: Channel + ?Sized,
	{
		debug!("transferring {} pages ({:?}, gate: {:?})", self.pages, self.direction, self.gate);
		let mut page = [0u8; PAGE_SIZE];

		match (self.direction, endpoint) {
			(Direction::FromDevice, Endpoint::Sink(sink)) => {
				for index in 0..self.pages {
					let at = At(Some(index));
					self.pass_gate(channel, index)?;
					channel.receive(&mut page, at)?;
					write_exact(&mut **sink, &page, Stream::File, at)?;
					trace!("page {}/{} received", index + 1, self.pages);
				}
				sink.flush()?;
			},
			(Direction::ToDevice, Endpoint::Source(source)) => {
				for index in 0..self.pages {
					let at = At(Some(index));
					self.pass_gate(channel, index)?;
					read_exact(&mut **source, &mut page, Stream::File, at)?;
					channel.send(&page, at)?;
					trace!("page {}/{} sent", index + 1, self.pages);
				}
			},
			(_, endpoint) => bail!("{:?} transfer requires {}, got {}", self.direction, self.endpoint(), endpoint.describe()),
		}

		Ok(())
	}

	fn pass_gate<C>(&self, channel: &mut C, page: usize) -> crate::AResult<()>
	where
		C: Channel + ?Sized,
	{
		if self.gate == Gate::None {
			return Ok(());
		}
		match channel.receive_byte()? {
			None => Err(ProtocolError::MissingReadyByte { page }.into()),
			Some(PAGE_READY) => Ok(()),
			Some(received) => Err(ProtocolError::UnexpectedReadyByte { page, received }.into()),
		}
	}
}
