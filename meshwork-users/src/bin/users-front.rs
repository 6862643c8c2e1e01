//! Users front: serves `/users` by calling whatever is registered under the dependency name.

use clap::Parser;
use meshwork_rs::{init_tracing, Application, ServiceArgs};
use meshwork_users::{front_module, users_client, BACKEND_SERVICE, FRONT_SERVICE};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "users-front", about = "Users front service")]
struct Cli {
    #[command(flatten)]
    service: ServiceArgs,

    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Logical name to register under.
    #[arg(long, env = "SERVICE_NAME", default_value = FRONT_SERVICE)]
    service_name: String,

    /// Logical name of the users backend to resolve.
    #[arg(long, env = "DEPENDENCY", default_value = BACKEND_SERVICE)]
    dependency: String,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();
    let cli = Cli::parse();
    let instance_id = cli.service.instance_id(&cli.service_name, cli.port);

    let mut app = Application::new();
    app.register(&mut cli.service.discovery_module())?;
    let discovery = app.discovery().ok_or("service discovery not configured")?;
    let users = users_client(&cli.dependency, cli.service.rpc_client(discovery));
    app.register(&mut front_module(instance_id.clone(), users))?;
    app.register_as(cli.service.registration(&cli.service_name, cli.port));

    info!(service = %cli.service_name, %instance_id, dependency = %cli.dependency, "starting users front");
    app.run(&cli.service.host, cli.port).map_err(|e| {
        error!(error = %e, "users front stopped");
        e
    })
}
