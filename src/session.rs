use crate::channel::{
	drain,
	Channel,
};
use crate::error::{
	ArgumentError,
	At,
	ProtocolError,
	SizeMismatchError,
};
use crate::protocol::{
	Command,
	BOOT_READY,
	ECHO,
	TOTAL_SIZE,
};
use crate::transfer::{
	source_len,
	Endpoint,
};

/// Block for the single byte the device sends after it booted.
pub fn boot_handshake<C: Channel + ?Sized>(channel: &mut C) -> crate::AResult<()> {
	match channel.receive_byte()? {
		None => Err(ProtocolError::MissingBootByte.into()),
		Some(BOOT_READY) => {
			info!("device ready");
			Ok(())
		},
		Some(b) => Err(ProtocolError::UnexpectedBootByte(b).into()),
	}
}

/// Send the command byte and, for partial commands, the page count field.
pub fn dispatch<C: Channel + ?Sized>(channel: &mut C, command: Command) -> crate::AResult<()> {
	let bytes = command.encode()?;
	debug!("sending command {}: {:02x?}", command, bytes);
	channel.send(&bytes, At(None))
}

/// Exchange the echo byte; confirms the device finished the command and is
/// still in sync.
pub fn verify_echo<C: Channel + ?Sized>(channel: &mut C) -> crate::AResult<()> {
	if drain(channel, &[ECHO])? != 1 {
		return Err(ProtocolError::EchoNotSent.into());
	}
	channel.flush()?;
	match channel.receive_byte()? {
		None => Err(ProtocolError::MissingEcho.into()),
		Some(ECHO) => Ok(()),
		Some(b) => Err(ProtocolError::EchoMismatch(b).into()),
	}
}

/// One command against a freshly booted device.
///
/// Owns the link and the local endpoint; both are released when the session
/// ends, whether the command succeeded or not.
pub struct Session<'a, C: Channel> {
	channel: C,
	endpoint: Endpoint<'a>,
}

impl<'a, C: Channel> Session<'a, C> {
	pub fn new(channel: C, endpoint: Endpoint<'a>) -> Self {
		Session {
			channel,
			endpoint,
		}
	}

	/// checks that don't need the device; nothing is sent or received if
	/// these fail
	fn preflight(&mut self, command: Command) -> crate::AResult<()> {
		command.validate()?;

		let mismatch = match (command.transfer(), &self.endpoint) {
			(Some(transfer), endpoint) if !transfer.accepts(endpoint) => Some(transfer.endpoint()),
			(None, Endpoint::Sink(_)) | (None, Endpoint::Source(_)) => Some(Endpoint::Nothing.describe()),
			_ => None,
		};
		if let Some(expected) = mismatch {
			return Err(ArgumentError::EndpointMismatch { command, expected }.into());
		}

		if let (Command::Flash, Endpoint::Source(source)) = (command, &mut self.endpoint) {
			let size = source_len(&mut **source)?;
			debug!("flash image has {} bytes", size);
			if size != TOTAL_SIZE as u64 {
				return Err(SizeMismatchError { actual: size, expected: TOTAL_SIZE as u64 }.into());
			}
		}

		Ok(())
	}

	/// Run `command`: boot handshake, dispatch, bulk transfer, echo.
	pub fn execute(mut self, command: Command) -> crate::AResult<()> {
		self.preflight(command)?;

		boot_handshake(&mut self.channel)?;
		dispatch(&mut self.channel, command)?;
		if let Some(transfer) = command.transfer() {
			transfer.run(&mut self.channel, &mut self.endpoint)?;
		}
		verify_echo(&mut self.channel)?;

		info!("{}: confirmed by device", command);
		Ok(())
	}
}
