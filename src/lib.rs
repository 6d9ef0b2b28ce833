#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

macro_rules! with_context {
	(( $fmt:tt $($t:tt)* ), $e:expr) => {{
		use failure::Error;

		match (|| { $e })() {
			Ok(v) => Ok(v),
			Err(e) => {
				let e: Error = e;
				let msg = format!(concat!($fmt, ": {}") $($t)*, e);
				Err(Error::from(e.context(msg)))
			}
		}
	}};

	($msg:expr, $e:expr) => {
		with_context!(("{}", $msg), $e)
	};
}

pub type AResult<T> = Result<T, failure::Error>;

pub mod channel;
pub mod error;
pub mod port;
pub mod protocol;
pub mod session;
pub mod transfer;

#[cfg(test)]
mod mock;

pub use self::error::{
	ArgumentError,
	ProtocolError,
	SizeMismatchError,
	TransferError,
};

pub use self::protocol::{
	Command,
	SdpState,
};

pub use self::session::Session;

pub use self::transfer::Endpoint;
