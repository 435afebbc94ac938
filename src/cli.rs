use clap::{
    crate_authors, crate_description, crate_version, value_parser, Arg, ArgAction, ArgMatches,
    Command,
};
use pretty_env_logger::env_logger::Builder;
use std::env;
use std::io::Write;
use std::process::exit;

use graviton_rs::common::Result;
use graviton_rs::driver::{ComputeDriver, Instance, MaasDriver, RebootType};
use graviton_rs::maas::{NodeFilter, NodeStatus};
use graviton_rs::{Config, ENV_PREFIX};

fn set_logger_level(b: &mut Builder, verbose: bool) {
    if env::var("RUST_LOG").is_err() {
        b.filter_level(match verbose {
            true => log::LevelFilter::Debug,
            false => log::LevelFilter::Info,
        });
    }
    b.init();
}

fn setup_logger(verbose: bool) {
    // Journald reads the <N> priority prefix.
    match env::var("RUST_LOG_STYLE") {
        Ok(s) if s == "SYSTEMD" => {
            let builder = &mut pretty_env_logger::env_logger::builder();
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "<{}>{}: {}",
                    match record.level() {
                        log::Level::Error => 3,
                        log::Level::Warn => 4,
                        log::Level::Info => 6,
                        log::Level::Debug => 7,
                        log::Level::Trace => 7,
                    },
                    record.target(),
                    record.args()
                )
            });
            set_logger_level(builder, verbose);
        }
        _ => {
            let builder = &mut pretty_env_logger::formatted_builder();
            set_logger_level(builder, verbose);
        }
    };
}

fn node_id_arg() -> Arg {
    Arg::new("id")
        .required(true)
        .help("MAAS system id of the node")
}

fn command() -> Command {
    Command::new("Graviton")
        .about(format!(
            "{}\n{} {}",
            crate_description!(),
            format!("Configuration is read from {ENV_PREFIX}_MAAS__* environment variables."),
            "See the docs for more information.",
        ))
        .arg(
            Arg::new("verbose")
                .action(ArgAction::SetTrue)
                .short('v')
                .long("verbose")
                .global(true)
                .help("Log requests and responses"),
        )
        .subcommand_required(true)
        .subcommand(Command::new("check").about("Check the configuration"))
        .subcommand(
            Command::new("list")
                .about("List allocated instances")
                .arg(
                    Arg::new("all")
                        .action(ArgAction::SetTrue)
                        .long("all")
                        .conflicts_with("state")
                        .help("List every node regardless of status"),
                )
                .arg(
                    Arg::new("state")
                        .long("state")
                        .value_parser(value_parser!(NodeStatus))
                        .help("List nodes in this status, by name or code"),
                ),
        )
        .subcommand(
            Command::new("show")
                .about("Show a node record")
                .arg(node_id_arg()),
        )
        .subcommand(
            Command::new("info")
                .about("Show memory and CPU of an instance")
                .arg(node_id_arg()),
        )
        .subcommand(
            Command::new("macs")
                .about("List the MAC addresses of an instance")
                .arg(node_id_arg()),
        )
        .subcommand(
            Command::new("spawn")
                .about("Acquire any available node and start it")
                .arg(
                    Arg::new("instance")
                        .long("instance")
                        .help("Instance id to log against, generated if omitted"),
                ),
        )
        .subcommand(
            Command::new("destroy")
                .about("Stop a node and release it back to the pool")
                .arg(node_id_arg()),
        )
        .subcommand(
            Command::new("reboot")
                .about("Stop then start a node")
                .arg(node_id_arg())
                .arg(
                    Arg::new("hard")
                        .action(ArgAction::SetTrue)
                        .long("hard")
                        .help("Request a hard reboot"),
                ),
        )
        .subcommand(
            Command::new("power-on")
                .about("Start a node")
                .arg(node_id_arg()),
        )
        .subcommand(
            Command::new("power-off")
                .about("Stop a node")
                .arg(node_id_arg()),
        )
        .subcommand(Command::new("zones").about("List availability zones"))
        .subcommand(Command::new("networks").about("List networks"))
        .subcommand(Command::new("nodegroups").about("List cluster controllers"))
        .subcommand(
            Command::new("boot-images")
                .about("List boot images of a cluster controller")
                .arg(Arg::new("uuid").required(true).help("Node group UUID")),
        )
        .version(crate_version!())
        .author(crate_authors!("\n"))
}

fn print_json(value: impl serde::Serialize) {
    match serde_json::to_string_pretty(&value) {
        Ok(out) => println!("{out}"),
        Err(err) => tracing::error!(error = %err, "Failed to serialize output"),
    }
}

fn node_id(args: &ArgMatches) -> Instance {
    Instance::new(
        args.get_one::<String>("id")
            .expect("id is a required argument")
            .clone(),
    )
}

fn run(driver: &MaasDriver, name: &str, args: &ArgMatches) -> Result<()> {
    let network_info = serde_json::Value::Null;

    match name {
        "list" => match args.get_one::<NodeStatus>("state") {
            Some(state) => print_json(driver.inventory().nodes(&NodeFilter::with_state(*state))?),
            None if args.get_flag("all") => print_json(driver.get_available_nodes(true)?),
            None => print_json(driver.list_instances()?),
        },
        "show" => print_json(driver.inventory().node_get(&node_id(args).uuid)?),
        "info" => print_json(driver.get_info(&node_id(args))?),
        "macs" => print_json(driver.macs_for_instance(&node_id(args))?),
        "spawn" => {
            let instance = Instance::new(
                args.get_one::<String>("instance")
                    .cloned()
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            );
            let system_id = driver.spawn(&instance, &serde_json::Value::Null, None, None)?;
            print_json(serde_json::json!({ "instance": instance.uuid, "system_id": system_id }));
        }
        "destroy" => driver.destroy(&node_id(args), &network_info, None, true)?,
        "reboot" => {
            let reboot_type = match args.get_flag("hard") {
                true => RebootType::Hard,
                false => RebootType::Soft,
            };
            driver.reboot(&node_id(args), &network_info, reboot_type, None)?
        }
        "power-on" => driver.power_on(&node_id(args), &network_info, None)?,
        "power-off" => driver.power_off(&node_id(args))?,
        "zones" => print_json(driver.inventory().zones()?),
        "networks" => print_json(driver.inventory().networks()?),
        "nodegroups" => print_json(driver.inventory().nodegroups()?),
        "boot-images" => print_json(
            driver.inventory().boot_images(
                args.get_one::<String>("uuid")
                    .expect("uuid is a required argument"),
            )?,
        ),
        _ => unreachable!("subcommand {name} is not wired up"),
    }

    Ok(())
}

pub(crate) fn main() {
    let args = command().get_matches();

    setup_logger(args.get_flag("verbose"));

    let driver = match Config::from_env().and_then(Config::into_driver) {
        Ok(d) => d,
        Err(err) => {
            println!("{err}");
            exit(2);
        }
    };

    let (name, sub_args) = args.subcommand().expect("a subcommand is required");

    if name == "check" {
        tracing::info!(
            hypervisor = driver.hypervisor_type(),
            api_version = driver.hypervisor_version(),
            "Configuration is valid."
        );
        exit(0);
    }

    if let Err(err) = run(&driver, name, sub_args) {
        tracing::error!(command = name, "{err}");
        exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_well_formed() {
        command().debug_assert();
    }

    #[test]
    fn list_accepts_state_names() {
        let args = command()
            .try_get_matches_from(["graviton-rs", "list", "--state", "allocated"])
            .unwrap();
        let (_, list) = args.subcommand().unwrap();
        assert_eq!(
            list.get_one::<NodeStatus>("state"),
            Some(&NodeStatus::Allocated)
        );
    }

    #[test]
    fn all_conflicts_with_state() {
        assert!(command()
            .try_get_matches_from(["graviton-rs", "list", "--all", "--state", "6"])
            .is_err());
    }
}
