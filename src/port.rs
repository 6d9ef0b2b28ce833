use std::io::{
	self,
	Read,
	Write,
};
use std::time::Duration;

use serialport::{
	DataBits,
	FlowControl,
	Parity,
	SerialPort,
	StopBits,
};

pub const DEFAULT_PORT: &str = "/dev/ttyACM0";
pub const DEFAULT_BAUD_RATE: u32 = 115200;

// serialport needs a finite timeout; `Blocking` hides it
const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PortConfig {
	pub path: String,
	pub baud_rate: u32,
}

impl Default for PortConfig {
	fn default() -> Self {
		PortConfig {
			path: DEFAULT_PORT.into(),
			baud_rate: DEFAULT_BAUD_RATE,
		}
	}
}

/// Turns a link with read timeouts into one where reads block until data
/// arrives or the link fails.
pub struct Blocking<P> {
	inner: P,
}

impl<P> Blocking<P> {
	pub fn new(inner: P) -> Self {
		Blocking { inner }
	}
}

impl<P: Read> Read for Blocking<P> {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		loop {
			match self.inner.read(buf) {
				Err(ref e) if e.kind() == io::ErrorKind::TimedOut => {
					trace!("still waiting for device");
				},
				r => return r,
			}
		}
	}
}

impl<P: Write> Write for Blocking<P> {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.inner.write(buf)
	}

	fn flush(&mut self) -> io::Result<()> {
		self.inner.flush()
	}
}

pub type SerialChannel = Blocking<Box<dyn SerialPort>>;

/// Open the serial device 8N1 without flow control.
pub fn open(config: &PortConfig) -> crate::AResult<SerialChannel> {
	let port = with_context!(("failed to open serial port {}", config.path), {
		Ok(serialport::new(config.path.as_str(), config.baud_rate)
			.data_bits(DataBits::Eight)
			.parity(Parity::None)
			.stop_bits(StopBits::One)
			.flow_control(FlowControl::None)
			.timeout(POLL_INTERVAL)
			.open()?)
	})?;
	debug!("opened {} at {} baud", config.path, config.baud_rate);
	Ok(Blocking::new(port))
}
