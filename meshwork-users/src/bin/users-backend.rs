//! Users backend: serves the roster and registers under its logical name.

use clap::Parser;
use meshwork_rs::{init_tracing, Application, ServiceArgs};
use meshwork_users::{backend_module, BACKEND_SERVICE};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "users-backend", about = "Users backend service")]
struct Cli {
    #[command(flatten)]
    service: ServiceArgs,

    #[arg(long, env = "PORT", default_value_t = 8081)]
    port: u16,

    /// Logical name to register under.
    #[arg(long, env = "SERVICE_NAME", default_value = BACKEND_SERVICE)]
    service_name: String,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();
    let cli = Cli::parse();
    let instance_id = cli.service.instance_id(&cli.service_name, cli.port);

    let mut app = Application::new();
    app.register(&mut cli.service.discovery_module())?;
    app.register(&mut backend_module(instance_id.clone()))?;
    app.register_as(cli.service.registration(&cli.service_name, cli.port));

    info!(service = %cli.service_name, %instance_id, "starting users backend");
    app.run(&cli.service.host, cli.port).map_err(|e| {
        error!(error = %e, "users backend stopped");
        e
    })
}
