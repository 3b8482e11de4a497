mod cli;
mod invoke;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use opbridge_core::{DispatchKey, Device};
use opbridge_dispatch::Dispatcher;
use opbridge_legacy::legacy_operator_name;
use opbridge_ops::register_cpu_operators;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log).context("invalid --log filter")?)
        .with_writer(std::io::stderr)
        .init();

    let mut dispatcher = Dispatcher::new();
    register_cpu_operators(&mut dispatcher)?;

    match cli.command {
        Command::List => {
            for schema in dispatcher.schemas() {
                let keys: Vec<_> = dispatcher
                    .dispatch_keys(schema.operator_name())
                    .iter()
                    .map(|k| k.name())
                    .collect();
                println!("{schema}  [{}]", keys.join(", "));
            }
            Ok(())
        }
        Command::Invoke {
            op,
            tensors,
            values,
            preallocate,
            device,
        } => {
            let handle = dispatcher
                .find(&legacy_operator_name(&op))
                .with_context(|| format!("unknown operator: {op}"))?;
            let key = device
                .as_deref()
                .map(parse_device)
                .transpose()?
                .map(DispatchKey::from);

            let outputs = invoke::run(&dispatcher, &handle, key, &tensors, &values, preallocate)?;
            for (ret, tensor) in handle.schema().returns().iter().zip(&outputs) {
                println!("{} = {}", ret.name, invoke::format_tensor(tensor)?);
            }
            Ok(())
        }
    }
}

fn parse_device(raw: &str) -> Result<Device> {
    if raw.eq_ignore_ascii_case("cpu") {
        return Ok(Device::Cpu);
    }

    if let Some(rest) = raw.strip_prefix("cuda:") {
        let device_id: u32 = rest.parse().context("invalid cuda device id")?;
        return Ok(Device::Cuda { device_id });
    }

    if let Some(rest) = raw.strip_prefix("hip:") {
        let device_id: u32 = rest.parse().context("invalid hip device id")?;
        return Ok(Device::Hip { device_id });
    }

    anyhow::bail!("unsupported device: {raw} (expected cpu, cuda:N or hip:N)");
}
