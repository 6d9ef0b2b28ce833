use std::io::{
	self,
	Read,
	Write,
};

use crate::error::{
	At,
	Stream,
	TransferError,
};

/// read until `buf` is full or the stream ends; returns number of bytes read
pub(crate) fn fill<R: Read + ?Sized>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
	let mut done = 0;
	while done < buf.len() {
		match source.read(&mut buf[done..]) {
			Ok(0) => break,
			Ok(n) => done += n,
			Err(ref e) if e.kind() == io::ErrorKind::Interrupted => (),
			Err(e) => return Err(e),
		}
	}
	Ok(done)
}

/// write until all of `buf` is accepted or the stream stops accepting data;
/// returns number of bytes written
pub(crate) fn drain<W: Write + ?Sized>(sink: &mut W, buf: &[u8]) -> io::Result<usize> {
	let mut done = 0;
	while done < buf.len() {
		match sink.write(&buf[done..]) {
			Ok(0) => break,
			Ok(n) => done += n,
			Err(ref e) if e.kind() == io::ErrorKind::Interrupted => (),
			Err(e) => return Err(e),
		}
	}
	Ok(done)
}

pub(crate) fn read_exact<R: Read + ?Sized>(source: &mut R, buf: &mut [u8], stream: Stream, at: At) -> crate::AResult<()> {
	let actual = fill(source, buf)?;
	if actual != buf.len() {
		return Err(TransferError::ShortRead { stream, at, expected: buf.len(), actual }.into());
	}
	Ok(())
}

pub(crate) fn write_exact<W: Write + ?Sized>(sink: &mut W, buf: &[u8], stream: Stream, at: At) -> crate::AResult<()> {
	let actual = drain(sink, buf)?;
	if actual != buf.len() {
		return Err(TransferError::ShortWrite { stream, at, expected: buf.len(), actual }.into());
	}
	Ok(())
}

/// Blocking, exact-count operations on the link to the device.
pub trait Channel: Read + Write {
	/// next byte from the device; `None` if the link closed
	fn receive_byte(&mut self) -> crate::AResult<Option<u8>> {
		let mut buf = [0u8; 1];
		match fill(self, &mut buf)? {
			0 => Ok(None),
			_ => Ok(Some(buf[0])),
		}
	}

	fn receive(&mut self, buf: &mut [u8], at: At) -> crate::AResult<()> {
		read_exact(self, buf, Stream::Channel, at)
	}

	fn send(&mut self, buf: &[u8], at: At) -> crate::AResult<()> {
		write_exact(self, buf, Stream::Channel, at)?;
		self.flush()?;
		Ok(())
	}
}

impl<C: Read + Write + ?Sized> Channel for C {
}
