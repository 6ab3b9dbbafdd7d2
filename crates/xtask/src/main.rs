// Setup-phase tasks for the end-to-end suites
//
//   cargo xtask setup-auth [--role owner --role editor ...]
//   cargo xtask verify-auth
//   cargo xtask clear-auth
//   cargo xtask roles

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use playwright_rs_harness::{
    CredentialResolver, Harness, HarnessConfig, LoginFlow, Role, SessionStore, init_cli_tracing,
};

#[derive(Parser)]
#[command(name = "xtask", about = "Authentication setup for the end-to-end suites")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log each role in through the browser and persist its session state
    SetupAuth {
        /// Roles to set up (default: every role whose credentials are set)
        #[arg(long = "role", value_parser = parse_role)]
        roles: Vec<Role>,
        /// Login route of the application
        #[arg(long, default_value = "/login")]
        login_route: String,
        /// Also record the seeded project id used by team-access suites
        #[arg(long)]
        project_id: Option<String>,
    },
    /// Check that each persisted session still shows a signed-in view
    VerifyAuth {
        #[arg(long = "role", value_parser = parse_role)]
        roles: Vec<Role>,
        /// Route that signed-out visitors cannot see
        #[arg(long, default_value = "/dashboard")]
        landing: String,
    },
    /// Delete persisted sessions (after credential rotation)
    ClearAuth {
        #[arg(long = "role", value_parser = parse_role)]
        roles: Vec<Role>,
    },
    /// List roles and the variables they read
    Roles,
}

fn parse_role(s: &str) -> std::result::Result<Role, String> {
    s.parse().map_err(|e: playwright_rs_harness::Error| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_cli_tracing();
    let cli = Cli::parse();
    let config = HarnessConfig::from_env().context("invalid E2E_* configuration")?;

    match cli.command {
        Command::SetupAuth {
            roles,
            login_route,
            project_id,
        } => setup_auth(config, roles, &login_route, project_id).await,
        Command::VerifyAuth { roles, landing } => verify_auth(config, roles, &landing).await,
        Command::ClearAuth { roles } => clear_auth(&config, roles).await,
        Command::Roles => {
            let resolver = CredentialResolver::from_env();
            let available = resolver.available();
            for role in Role::ALL {
                let status = if available.contains(&role) { "set" } else { "missing" };
                println!(
                    "{:<7} {} / {} ({})",
                    role,
                    role.email_var(),
                    role.password_var(),
                    status
                );
            }
            Ok(())
        }
    }
}

async fn setup_auth(
    config: HarnessConfig,
    roles: Vec<Role>,
    login_route: &str,
    project_id: Option<String>,
) -> Result<()> {
    let resolver = CredentialResolver::from_env();
    let roles = if roles.is_empty() {
        resolver.available()
    } else {
        // Explicit roles must all resolve before the browser starts.
        resolver.resolve_all(&roles)?;
        roles
    };
    if roles.is_empty() {
        bail!("no role has credentials set; see `cargo xtask roles`");
    }

    tracing::info!(?roles, login_route, "setting up sessions");
    let flow = LoginFlow::for_config(&config).route(login_route);
    let harness = Harness::launch(config).await?;
    let mut failed = Vec::new();
    for role in &roles {
        match harness.setup_role(&resolver, &flow, *role).await {
            Ok(path) => println!("{:<7} -> {}", role, path.display()),
            Err(e) => {
                eprintln!("{:<7} FAILED: {}", role, e);
                failed.push(*role);
            }
        }
    }
    if let Some(id) = project_id {
        let path = harness.store().save_project_id(&id).await?;
        println!("project -> {}", path.display());
    }
    harness.close().await?;

    if !failed.is_empty() {
        bail!("authentication failed for {:?}", failed);
    }
    Ok(())
}

async fn verify_auth(config: HarnessConfig, roles: Vec<Role>, landing: &str) -> Result<()> {
    let store = SessionStore::new(&config.state_dir);
    let roles = if roles.is_empty() {
        Role::ALL.into_iter().filter(|r| store.exists(*r)).collect()
    } else {
        roles
    };
    if roles.is_empty() {
        bail!("no persisted sessions in {}", store.dir().display());
    }

    let flow = LoginFlow::for_config(&config);
    let harness = Harness::launch(config).await?;
    let mut failed = Vec::new();
    for role in &roles {
        match harness.verify_role(&flow, *role, landing).await {
            Ok(()) => println!("{:<7} ok", role),
            Err(e) => {
                eprintln!("{:<7} FAILED: {}", role, e);
                failed.push(*role);
            }
        }
    }
    harness.close().await?;

    if !failed.is_empty() {
        bail!("stale sessions for {:?}; run `cargo xtask setup-auth`", failed);
    }
    Ok(())
}

async fn clear_auth(config: &HarnessConfig, roles: Vec<Role>) -> Result<()> {
    let store = SessionStore::new(&config.state_dir);
    let roles = if roles.is_empty() {
        Role::ALL.to_vec()
    } else {
        roles
    };
    for role in roles {
        if store.remove(role).await? {
            println!("{:<7} removed {}", role, store.path_for(role).display());
        }
    }
    Ok(())
}
