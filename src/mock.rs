//! Simulated programmer firmware for tests.

use std::collections::VecDeque;
use std::io::{
	self,
	Read,
	Write,
};

use crate::protocol::*;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum State {
	Idle,
	/// waiting for the 16-bit page count of `r`/`w`
	Count {
		opcode: u8,
		low: Option<u8>,
	},
	/// receiving pages from the host
	Pages {
		remaining: usize,
		page: usize,
		filled: usize,
	},
}

pub struct Device {
	memory: Vec<u8>,
	sdp: bool,
	state: State,
	output: VecDeque<u8>,
	echo_reply: Option<u8>,
	/// stop sending after this many bytes
	output_limit: Option<usize>,
	output_sent: usize,
	/// stop accepting after this many bytes
	input_limit: Option<usize>,
	received: Vec<u8>,
	page_counts: Vec<usize>,
	ready_pending: bool,
	ready_sent: usize,
	early_page_bytes: bool,
	link_dead: bool,
	activity_after_dead: usize,
}

impl Device {
	pub fn new() -> Self {
		Self::with_memory(&vec![0xff; TOTAL_SIZE])
	}

	pub fn with_memory(memory: &[u8]) -> Self {
		assert_eq!(memory.len(), TOTAL_SIZE);
		Self::with_boot_byte(Some(BOOT_READY), memory)
	}

	pub fn with_boot_byte(boot: Option<u8>, memory: &[u8]) -> Self {
		Device {
			memory: memory.to_vec(),
			sdp: false,
			state: State::Idle,
			output: boot.into_iter().collect(),
			echo_reply: Some(ECHO),
			output_limit: None,
			output_sent: 0,
			input_limit: None,
			received: Vec::new(),
			page_counts: Vec::new(),
			ready_pending: false,
			ready_sent: 0,
			early_page_bytes: false,
			link_dead: false,
			activity_after_dead: 0,
		}
	}

	/// drop the boot byte as if the host had read it
	pub fn booted(mut self) -> Self {
		assert_eq!(self.output.pop_front(), Some(BOOT_READY));
		self
	}

	/// reply to `ECHO` with `reply` instead, or not at all
	pub fn echo_reply(mut self, reply: Option<u8>) -> Self {
		self.echo_reply = reply;
		self
	}

	/// link goes silent after the device sent `limit` bytes (boot byte included)
	pub fn output_limit(mut self, limit: usize) -> Self {
		self.output_limit = Some(limit);
		self
	}

	/// link stops accepting data after `limit` bytes from the host
	pub fn input_limit(mut self, limit: usize) -> Self {
		self.input_limit = Some(limit);
		self
	}

	pub fn memory(&self) -> &[u8] {
		&self.memory
	}

	pub fn sdp(&self) -> bool {
		self.sdp
	}

	/// everything the host wrote
	pub fn received(&self) -> &[u8] {
		&self.received
	}

	/// decoded page counts of `r`/`w` commands
	pub fn page_counts(&self) -> &[usize] {
		&self.page_counts
	}

	pub fn pending_output(&self) -> usize {
		self.output.len()
	}

	pub fn ready_bytes_sent(&self) -> usize {
		self.ready_sent
	}

	/// host sent page data before reading the ready byte for that page
	pub fn early_page_bytes(&self) -> bool {
		self.early_page_bytes
	}

	/// reads and writes the host attempted after the link failed
	pub fn activity_after_failure(&self) -> usize {
		self.activity_after_dead
	}

	fn signal_ready(&mut self) {
		self.output.push_back(PAGE_READY);
		self.ready_pending = true;
		self.ready_sent += 1;
	}

	fn start_pages(&mut self, pages: usize) {
		self.state = State::Pages { remaining: pages, page: 0, filled: 0 };
		self.signal_ready();
	}

	fn process(&mut self, byte: u8) {
		match self.state {
			State::Idle => match byte {
				ERASE => {
					for b in self.memory.iter_mut() {
						*b = 0xff;
					}
				},
				SDP_ENABLE => self.sdp = true,
				SDP_DISABLE => self.sdp = false,
				DUMP => self.output.extend(self.memory.iter()),
				FLASH => self.start_pages(PAGE_COUNT),
				READ_PARTIAL | WRITE_PARTIAL => {
					self.state = State::Count { opcode: byte, low: None };
				},
				ECHO => {
					if let Some(reply) = self.echo_reply {
						self.output.push_back(reply);
					}
				},
				_ => (),
			},
			State::Count { opcode, low: None } => {
				self.state = State::Count { opcode, low: Some(byte) };
			},
			State::Count { opcode, low: Some(low) } => {
				let pages = ((low as usize) | (byte as usize) << 8) + 1;
				let pages = pages.min(PAGE_COUNT);
				self.page_counts.push(pages);
				if opcode == READ_PARTIAL {
					self.state = State::Idle;
					let end = pages * PAGE_SIZE;
					self.output.extend(self.memory[..end].iter());
				} else {
					self.start_pages(pages);
				}
			},
			State::Pages { remaining, page, filled } => {
				if self.ready_pending {
					self.early_page_bytes = true;
				}
				self.memory[page * PAGE_SIZE + filled] = byte;
				if filled + 1 < PAGE_SIZE {
					self.state = State::Pages { remaining, page, filled: filled + 1 };
				} else if remaining > 1 {
					self.state = State::Pages { remaining: remaining - 1, page: page + 1, filled: 0 };
					self.signal_ready();
				} else {
					self.state = State::Idle;
				}
			},
		}
	}
}

impl Read for Device {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		if self.link_dead {
			self.activity_after_dead += 1;
		}
		let mut n = 0;
		while n < buf.len() {
			if self.output_limit.map_or(false, |limit| self.output_sent >= limit) {
				break;
			}
			match self.output.pop_front() {
				Some(b) => {
					buf[n] = b;
					n += 1;
					self.output_sent += 1;
				},
				None => break,
			}
		}
		if self.output.is_empty() {
			self.ready_pending = false;
		}
		if n == 0 && !buf.is_empty() {
			self.link_dead = true;
		}
		Ok(n)
	}
}

impl Write for Device {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		if self.link_dead {
			self.activity_after_dead += 1;
		}
		let mut n = 0;
		for &byte in buf {
			if self.input_limit.map_or(false, |limit| self.received.len() >= limit) {
				break;
			}
			self.received.push(byte);
			self.process(byte);
			n += 1;
		}
		if n == 0 && !buf.is_empty() {
			self.link_dead = true;
		}
		Ok(n)
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}
