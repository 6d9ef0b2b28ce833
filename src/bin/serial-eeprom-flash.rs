#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate serial_eeprom_flash;
use serial_eeprom_flash::*;

use std::fs::File;
use std::process::exit;

use clap::{
	App,
	AppSettings,
	Arg,
	SubCommand,
};

use serial_eeprom_flash::port::{
	self,
	PortConfig,
};

fn get_param<T>(matches: &clap::ArgMatches, name: &str) -> AResult<T>
where
	T: std::str::FromStr,
	failure::Error: From<<T as std::str::FromStr>::Err>,
{
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => bail!("missing parameter {}", name),
	};
	param.parse::<T>().map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid parameter {}: {}", name, e);
		e.context(msg).into()
	})
}

fn run(config: &PortConfig, command: Command, endpoint: Endpoint) -> AResult<()> {
	let channel = port::open(config)?;
	Session::new(channel, endpoint).execute(command)
}

fn open_input(path: &str) -> AResult<File> {
	with_file_context(path, File::open(path))
}

fn create_output(path: &str) -> AResult<File> {
	with_file_context(path, File::create(path))
}

fn with_file_context(path: &str, file: std::io::Result<File>) -> AResult<File> {
	file.map_err(|e| {
		let msg = format!("{}: {}", path, e);
		failure::Error::from(e).context(msg).into()
	})
}

fn partial_command(sub_m: &clap::ArgMatches, make: fn(usize) -> Command) -> AResult<Command> {
	let command = make(get_param(sub_m, "PAGES")?);
	// before touching the file or the port
	command.validate()?;
	Ok(command)
}

fn cli_app<'a>(default_baud_rate: &'a str) -> App<'a, 'a> {
	let file_arg = |help| Arg::with_name("FILE").required(true).help(help);
	let pages_arg = || Arg::with_name("PAGES").required(true).help("number of 64-byte pages, starting at address 0 (1-512)");

	App::new(crate_name!())
		.version(crate_version!())
		.about("Flash, erase, or modify the software data protection state of an EEPROM")
		.setting(AppSettings::SubcommandRequiredElseHelp)
		.global_setting(AppSettings::VersionlessSubcommands)
		.arg(Arg::with_name("port")
			.short("p")
			.long("port")
			.takes_value(true)
			.default_value(port::DEFAULT_PORT)
			.help("serial port name"))
		.arg(Arg::with_name("baud-rate")
			.short("b")
			.long("baud-rate")
			.takes_value(true)
			.default_value(default_baud_rate)
			.help("baud rate"))
		.subcommand(SubCommand::with_name("erase")
			.about("fill EEPROM with 0xFF bytes"))
		.subcommand(SubCommand::with_name("sdp")
			.about("enable/disable software data protection")
			.arg(Arg::with_name("STATE").required(true).possible_values(&["disable", "enable"])))
		.subcommand(SubCommand::with_name("dump")
			.about("dump contents of EEPROM to a file")
			.arg(file_arg("file to store the data in")))
		.subcommand(SubCommand::with_name("flash")
			.about("flash entire EEPROM with a file")
			.arg(file_arg("file to read the data from")))
		.subcommand(SubCommand::with_name("read")
			.about("read the first pages of the EEPROM to a file")
			.arg(file_arg("file to store the data in"))
			.arg(pages_arg()))
		.subcommand(SubCommand::with_name("write")
			.about("write the first pages of the EEPROM from a file")
			.arg(file_arg("file to read the data from"))
			.arg(pages_arg()))
}

fn port_config(matches: &clap::ArgMatches) -> AResult<PortConfig> {
	let baud_rate: u32 = get_param(matches, "baud-rate")?;
	ensure!(baud_rate > 0, "invalid parameter baud-rate: must be positive");
	Ok(PortConfig {
		path: get_param(matches, "port")?,
		baud_rate,
	})
}

fn main_app() -> AResult<()> {
	let default_baud_rate = port::DEFAULT_BAUD_RATE.to_string();
	let matches = cli_app(&default_baud_rate).get_matches();
	let config = port_config(&matches)?;

	match matches.subcommand() {
		("erase", _) => {
			run(&config, Command::Erase, Endpoint::Nothing)
		},
		("sdp", Some(sub_m)) => {
			let state: SdpState = get_param(sub_m, "STATE")?;
			run(&config, state.into(), Endpoint::Nothing)
		},
		("dump", Some(sub_m)) => {
			let mut file = create_output(&get_param::<String>(sub_m, "FILE")?)?;
			run(&config, Command::Dump, Endpoint::Sink(&mut file))
		},
		("flash", Some(sub_m)) => {
			let mut file = open_input(&get_param::<String>(sub_m, "FILE")?)?;
			run(&config, Command::Flash, Endpoint::Source(&mut file))
		},
		("read", Some(sub_m)) => {
			let command = partial_command(sub_m, Command::ReadPartial)?;
			let mut file = create_output(&get_param::<String>(sub_m, "FILE")?)?;
			run(&config, command, Endpoint::Sink(&mut file))
		},
		("write", Some(sub_m)) => {
			let command = partial_command(sub_m, Command::WritePartial)?;
			let mut file = open_input(&get_param::<String>(sub_m, "FILE")?)?;
			run(&config, command, Endpoint::Source(&mut file))
		},
		("", _) => bail!("no subcommand"),
		(cmd, _) => bail!("not implemented subcommand {:?}", cmd),
	}?;

	info!("done");
	Ok(())
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}
