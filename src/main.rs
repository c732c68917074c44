use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use firerules::admin::{self, GrantOutcome, ResetOutcome};
use firerules::cli::{Cli, Commands};
use firerules::client::{FirestoreClient, IdentityClient, RulesClient};
use firerules::credentials::ServiceAccountKey;
use firerules::deploy::{DeployOutcome, Deployer};
use firerules::models::firestore_release_id;
use firerules::session::Session;

/// Initialize tracing with output to stderr so stdout only carries results.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "firerules=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let key = ServiceAccountKey::load(&cli.credentials).with_context(|| {
        format!(
            "failed to load service account from {}",
            cli.credentials.display()
        )
    })?;
    tracing::info!(
        project = %key.project_id,
        account = %key.client_email,
        "Loaded service account"
    );
    let session = Session::new(key, cli.endpoints());

    let ok = match &cli.command {
        None | Some(Commands::Deploy) => deploy(&session, &cli).await,
        Some(Commands::Status) => status(&session, &cli.database).await,
        Some(Commands::ResetAdmin { email, password }) => {
            reset_admin(&session, email, password).await
        }
        Some(Commands::GrantAdmin { email }) => grant_admin(&session, &cli.database, email).await,
    };

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn deploy(session: &Session, cli: &Cli) -> bool {
    let rules = RulesClient::new(session);
    let deployer = Deployer::new(&rules, &cli.database);

    match deployer.deploy(&cli.rules).await {
        DeployOutcome::Activated { ruleset, release } => {
            println!("Ruleset created: {}", ruleset.name);
            println!("Released to {}", release.name);
            true
        }
        DeployOutcome::SourceMissing { path } => {
            eprintln!("{} not found, nothing deployed", path.display());
            true
        }
        DeployOutcome::SourceUnreadable { path, error } => {
            eprintln!("Could not read {}: {}", path.display(), error);
            false
        }
        DeployOutcome::CreateFailed { error } => {
            eprintln!("Failed to create ruleset: {}", error);
            false
        }
        DeployOutcome::ReleaseFailed { ruleset, error } => {
            eprintln!(
                "Ruleset {} was created but could not be released: {}",
                ruleset.name, error
            );
            false
        }
    }
}

async fn status(session: &Session, database: &str) -> bool {
    let rules = RulesClient::new(session);
    let release_id = firestore_release_id(database);

    match rules.get_release(&release_id).await {
        Ok(Some(release)) => {
            println!("{} -> {}", release.name, release.ruleset_name);
            if let Some(updated) = release.update_time {
                println!("Last updated {}", updated.to_rfc3339());
            }
            true
        }
        Ok(None) => {
            println!("{} has never been released", rules.release_name(&release_id));
            true
        }
        Err(e) => {
            eprintln!("Failed to read release: {}", e);
            false
        }
    }
}

async fn reset_admin(session: &Session, email: &str, password: &str) -> bool {
    let identity = IdentityClient::new(session);

    match admin::reset_admin(&identity, email, password).await {
        Ok(ResetOutcome::PasswordUpdated { uid }) => {
            println!("Updated password of {} (uid {})", email, uid);
            true
        }
        Ok(ResetOutcome::Created { uid }) => {
            println!("Created user {} (uid {})", email, uid);
            true
        }
        Err(e) => {
            eprintln!("Failed to reset admin account: {}", e);
            false
        }
    }
}

async fn grant_admin(session: &Session, database: &str, email: &str) -> bool {
    let identity = IdentityClient::new(session);
    let firestore = FirestoreClient::new(session, database);

    match admin::grant_admin(&identity, &firestore, email).await {
        Ok(GrantOutcome::Updated { uid }) => {
            println!("Set role 'admin' on users/{}", uid);
            true
        }
        Ok(GrantOutcome::Created { uid }) => {
            println!("Created admin profile users/{}", uid);
            true
        }
        Ok(GrantOutcome::UserNotFound) => {
            eprintln!("{} not found in Auth; run reset-admin first", email);
            false
        }
        Err(e) => {
            eprintln!("Failed to grant admin role: {}", e);
            false
        }
    }
}
