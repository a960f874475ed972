use std::error::Error;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use svcwrap::{
    Daemon,
    cli::{Cli, Commands, parse_args},
};

fn main() -> Result<(), Box<dyn Error>> {
    let args = parse_args();
    init_logging(&args);

    let mut daemon = Daemon::new(args.service.builder()?)?;
    debug!(
        "Managing '{}' via {} ({})",
        daemon.config().name,
        daemon.kind(),
        daemon.artifact_path().display()
    );

    match args.command {
        Commands::Install => daemon.install()?,
        Commands::Enable => daemon.enable()?,
        Commands::Disable => daemon.disable()?,
        Commands::Remove => daemon.remove()?,
        Commands::Start => daemon.start()?,
        Commands::Stop => daemon.stop()?,
        Commands::Status { json } => {
            let status = daemon.status()?;
            if json {
                println!("{}", serde_json::to_string(&status)?);
            } else {
                println!("{status}");
            }
        }
        Commands::Log => {
            info!("Following logs for {}", daemon.config().name);
            daemon.log()?;
        }
    }

    if args.command.is_mutating() {
        println!("Succeeded");
    }

    Ok(())
}

fn init_logging(args: &Cli) {
    let filter = if let Some(level) = args.log_level {
        EnvFilter::default().add_directive(level.filter().into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
