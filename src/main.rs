use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;

use subg_link::api::{ExecutorConfig, GenericCommand, RemoteDevice};
use subg_link::core::{hexify, parse_hex, Serial};
use subg_link::hardware::{create_transport, BridgeChannel, LinkError, LinkResult, Transport};
use subg_link::tuning::FrequencyTuner;
use subg_link::utils::LinkConfig;

#[derive(Parser)]
#[command(name = "subg-link")]
#[command(about = "Talk to a remote RF device through a subg_rfspy radio bridge")]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Scan the locale's band and apply the best frequency
    Tune,
    /// Print every packet heard on the receive channel
    Dump {
        /// Stop after this many packets (0 = forever)
        #[arg(long, default_value = "0")]
        count: usize,
    },
    /// Print the bridge firmware version
    Version,
    /// Execute one command on the remote device and print the response
    Send {
        /// Operation code in hex, e.g. 8d
        #[arg(long)]
        code: String,
        /// Parameter bytes in hex
        #[arg(long, default_value = "")]
        params: String,
        #[arg(long, default_value = "64")]
        bytes_per_record: usize,
        #[arg(long, default_value = "1")]
        max_records: usize,
    },
}

fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => LinkConfig::from_file(path),
        None => Ok(LinkConfig::default()),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.logging.level.as_str())).init();

    if let Err(e) = run(&args.command, &config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(action: &Action, config: &LinkConfig) -> LinkResult<()> {
    // argument errors surface before the port is touched
    let request = match action {
        Action::Send {
            code,
            params,
            bytes_per_record,
            max_records,
        } => Some((
            config.device_serial()?,
            build_command(code, params, *bytes_per_record, *max_records)?,
        )),
        _ => None,
    };

    let transport = create_transport(&config.transport_config())?;
    let mut link = BridgeChannel::open(transport, config.radio_config()?, config.bridge_config())?;

    if let Some((serial, command)) = request {
        let command = execute_and_close(link, serial, command, config.executor.clone())?;
        println!("{}", hexify(&command.data));
        return Ok(());
    }

    let result = match action {
        Action::Tune => tune(&mut link, config),
        Action::Dump { count } => dump(&mut link, *count),
        Action::Version | Action::Send { .. } => {
            println!("{}", link.firmware_version().unwrap_or("unknown"));
            Ok(())
        }
    };

    link.close();
    result
}

/// Run one command on the remote device; the link is closed whatever the outcome
fn execute_and_close<T: Transport>(
    link: BridgeChannel<T>,
    serial: Serial,
    command: GenericCommand,
    executor: ExecutorConfig,
) -> LinkResult<GenericCommand> {
    let mut device = RemoteDevice::new(link, serial, executor);
    let result = device.execute_with_retry(command);
    device.link_mut().close();
    result
}

fn build_command(code: &str, params: &str, bytes_per_record: usize, max_records: usize) -> LinkResult<GenericCommand> {
    let opcode = u8::from_str_radix(code.trim_start_matches("0x"), 16)
        .map_err(|_| LinkError::invalid_configuration("code", code))?;
    Ok(GenericCommand::new(opcode)
        .with_params(parse_hex(params)?)
        .with_records(bytes_per_record, max_records))
}

fn tune<T: Transport>(link: &mut BridgeChannel<T>, config: &LinkConfig) -> LinkResult<()> {
    let serial = config.device_serial()?;
    let report = FrequencyTuner::new(link, serial, config.tuner.clone()).run()?;
    println!("{}", report.to_json_pretty()?);
    Ok(())
}

fn dump<T: Transport>(link: &mut BridgeChannel<T>, count: usize) -> LinkResult<()> {
    let start = Instant::now();
    let mut heard = 0;

    while count == 0 || heard < count {
        let timeout = link.config().default_timeout;
        match link.get_packet(timeout) {
            Ok(record) => {
                heard += 1;
                println!(
                    "{:.3} ({}): {}",
                    start.elapsed().as_secs_f64(),
                    record.rssi,
                    hexify(&record.payload)
                );
            }
            Err(LinkError::Timeout { .. }) => continue,
            Err(e) if e.is_retryable() => log::warn!("{}", e),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use subg_link::hardware::{BridgeConfig, MockTransport};
    use subg_link::{Packet, RadioConfig};
    use std::time::Duration;

    fn open_link(mock: &MockTransport) -> BridgeChannel<MockTransport> {
        let config = BridgeConfig {
            settle_delay: Duration::ZERO,
            ..BridgeConfig::default()
        };
        BridgeChannel::open(mock.clone(), RadioConfig::default(), config).unwrap()
    }

    fn fast_executor() -> ExecutorConfig {
        ExecutorConfig {
            read_timeout_ms: 10,
            response_timeout_ms: 30,
            retry_count: 1,
            retry_backoff_ms: 0,
        }
    }

    #[test]
    fn test_build_command() {
        let command = build_command("0x8d", "0102", 4, 2).unwrap();
        assert_eq!(command.code, 0x8d);
        assert_eq!(command.params, vec![0x01, 0x02]);
        assert_eq!(command.expected_len(), 8);
        assert!(matches!(build_command("zz", "", 64, 1), Err(LinkError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_link_closed_after_failed_command() {
        let mock = MockTransport::simulated_bridge("0.6", |_, _| vec![]);
        let link = open_link(&mock);
        assert!(mock.is_open());

        let result = execute_and_close(link, Serial([0x20, 0x88, 0x50]), GenericCommand::new(0x8d), fast_executor());
        assert!(matches!(result, Err(LinkError::Timeout { .. })));
        assert!(!mock.is_open());
    }

    #[test]
    fn test_link_closed_after_command() {
        let mock = MockTransport::simulated_bridge("0.6", |packet, _| {
            vec![(100, Packet::new(packet.serial, packet.op, vec![0x07]))]
        });
        let link = open_link(&mock);

        let command = GenericCommand::new(0x8d).with_records(1, 1);
        let command = execute_and_close(link, Serial([0x20, 0x88, 0x50]), command, fast_executor()).unwrap();
        assert_eq!(command.data, vec![0x07]);
        assert!(!mock.is_open());
    }
}
