use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use uc_steward::workspace::{Privilege, SecurableType, WorkspaceClient};
use uc_steward::{LlmOverride, agent, config, llm, server};

/// Build an LlmClient from config + optional CLI override.
fn build_llm_client(
    llm_config: &config::LlmConfig,
    llm_override: Option<&LlmOverride>,
) -> Result<llm::LlmClient> {
    let provider = llm_override
        .map(|o| o.provider.clone())
        .unwrap_or_else(|| llm_config.provider.clone());
    let model = llm_override
        .map(|o| o.model.clone())
        .unwrap_or_else(|| llm_config.model.clone());
    let client = llm::LlmClient::from_config(
        provider,
        model,
        llm_config.max_tokens,
        llm_config.api_key_env.clone(),
        llm_config.base_url.clone(),
    )?;
    Ok(client)
}

fn make_llm_override(provider: Option<String>, model: Option<String>) -> Option<LlmOverride> {
    if provider.is_none() && model.is_none() {
        return None;
    }
    let provider = provider
        .map(|p| match p.as_str() {
            "anthropic" => llm::Provider::Anthropic,
            "openrouter" => llm::Provider::OpenRouter,
            _ => llm::Provider::OpenAi,
        })
        .unwrap_or_default();
    let model = model.unwrap_or_else(|| match &provider {
        llm::Provider::Anthropic => "claude-sonnet-4-5".into(),
        _ => "gpt-4.1-nano".into(),
    });
    Some(LlmOverride { provider, model })
}

fn load_config(path: &Path) -> config::Config {
    config::Config::load(path).unwrap_or_default()
}

fn workspace_client(cfg: &config::Config) -> Result<WorkspaceClient> {
    cfg.validate()?;
    Ok(WorkspaceClient::new(&cfg.workspace)?)
}

#[derive(Parser)]
#[command(
    name = "uc-steward",
    about = "Natural-language access manager for Databricks Unity Catalog"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Answer a single natural-language request (one LLM routing call)
    Ask {
        /// The request, e.g. "Grant SELECT on catalog sales to alice@corp.com"
        request: String,

        /// Path to config file
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,

        /// LLM provider override: anthropic, openrouter, openai
        #[arg(long)]
        provider: Option<String>,

        /// LLM model override
        #[arg(long)]
        model: Option<String>,
    },

    /// Interactive terminal chat with the access agent
    Chat {
        /// Path to config file
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,

        /// LLM provider override: anthropic, openrouter, openai
        #[arg(long)]
        provider: Option<String>,

        /// LLM model override
        #[arg(long)]
        model: Option<String>,
    },

    /// Run the chat web UI
    Serve {
        /// Path to config file
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,

        /// LLM provider override: anthropic, openrouter, openai
        #[arg(long)]
        provider: Option<String>,

        /// LLM model override
        #[arg(long)]
        model: Option<String>,
    },

    /// List catalogs (no LLM call)
    Catalogs {
        /// Path to config file
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },

    /// List schemas in a catalog (no LLM call)
    Schemas {
        /// Catalog name
        catalog: String,

        /// Path to config file
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },

    /// List tables in a schema (no LLM call)
    Tables {
        /// Catalog name
        catalog: String,

        /// Schema name
        schema: String,

        /// Path to config file
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },

    /// List workspace users and groups (no LLM call)
    Principals {
        /// Path to config file
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },

    /// Show grants on a securable (no LLM call)
    Grants {
        /// Kind of object: catalog, schema, table
        securable_type: SecurableType,

        /// Full object name, e.g. "sales" or "sales.orders"
        full_name: String,

        /// Path to config file
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },

    /// Create a catalog (no LLM call)
    CreateCatalog {
        /// Catalog name
        name: String,

        /// Description of the catalog's purpose
        #[arg(long)]
        comment: Option<String>,

        /// Path to config file
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },

    /// Create a schema in a catalog (no LLM call)
    CreateSchema {
        /// Catalog to create the schema in
        catalog: String,

        /// Schema name
        name: String,

        /// Description of the schema's purpose
        #[arg(long)]
        comment: Option<String>,

        /// Path to config file
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },

    /// Grant a privilege on a securable to a principal (no LLM call)
    Grant {
        /// User email or group name
        principal: String,

        /// Privilege, e.g. SELECT, MODIFY, USE_CATALOG
        privilege: Privilege,

        /// Kind of object: catalog, schema, table
        securable_type: SecurableType,

        /// Full object name
        full_name: String,

        /// Path to config file
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },

    /// Revoke a privilege on a securable from a principal (no LLM call)
    Revoke {
        /// User email or group name
        principal: String,

        /// Privilege, e.g. SELECT, MODIFY, USE_CATALOG
        privilege: Privilege,

        /// Kind of object: catalog, schema, table
        securable_type: SecurableType,

        /// Full object name
        full_name: String,

        /// Path to config file
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "uc_steward=info".parse().unwrap()),
        )
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Ask {
            request,
            config,
            provider,
            model,
        } => {
            let cfg = load_config(&config);
            let client = workspace_client(&cfg)?;
            let llm_override = make_llm_override(provider, model);
            let llm = build_llm_client(&cfg.llm, llm_override.as_ref())?;

            let intent = agent::intent::classify(&llm, &request).await?;
            let result = agent::intent::execute(&client, intent).await?;
            println!("{result}");
            Ok(())
        }
        Command::Chat {
            config,
            provider,
            model,
        } => {
            let cfg = load_config(&config);
            let client = workspace_client(&cfg)?;
            let llm_override = make_llm_override(provider, model);
            let llm = build_llm_client(&cfg.llm, llm_override.as_ref())?;
            run_repl(&llm, &client, &cfg.agent).await
        }
        Command::Serve {
            config,
            provider,
            model,
        } => {
            let cfg = load_config(&config);
            cfg.validate()?;
            let llm_override = make_llm_override(provider, model);
            let llm = build_llm_client(&cfg.llm, llm_override.as_ref())?;
            server::serve(cfg, llm).await
        }
        Command::Catalogs { config } => {
            let client = workspace_client(&load_config(&config))?;
            let catalogs = client.list_catalogs().await?;
            println!("{}", serde_json::to_string_pretty(&catalogs)?);
            Ok(())
        }
        Command::Schemas { catalog, config } => {
            let client = workspace_client(&load_config(&config))?;
            let schemas = client.list_schemas(&catalog).await?;
            println!("{}", serde_json::to_string_pretty(&schemas)?);
            Ok(())
        }
        Command::Tables {
            catalog,
            schema,
            config,
        } => {
            let client = workspace_client(&load_config(&config))?;
            let tables = client.list_tables(&catalog, &schema).await?;
            println!("{}", serde_json::to_string_pretty(&tables)?);
            Ok(())
        }
        Command::Principals { config } => {
            let client = workspace_client(&load_config(&config))?;
            let users = client.list_users().await?;
            let groups = client.list_groups().await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "users": users,
                    "groups": groups,
                }))?
            );
            Ok(())
        }
        Command::Grants {
            securable_type,
            full_name,
            config,
        } => {
            let client = workspace_client(&load_config(&config))?;
            let perms = client.get_grants(securable_type, &full_name).await?;
            println!("{}", serde_json::to_string_pretty(&perms)?);
            Ok(())
        }
        Command::CreateCatalog {
            name,
            comment,
            config,
        } => {
            let client = workspace_client(&load_config(&config))?;
            let catalog = client.create_catalog(&name, comment.as_deref()).await?;
            println!("Created catalog '{}'", catalog.name);
            Ok(())
        }
        Command::CreateSchema {
            catalog,
            name,
            comment,
            config,
        } => {
            let client = workspace_client(&load_config(&config))?;
            let schema = client
                .create_schema(&catalog, &name, comment.as_deref())
                .await?;
            println!("Created schema '{catalog}.{}'", schema.name);
            Ok(())
        }
        Command::Grant {
            principal,
            privilege,
            securable_type,
            full_name,
            config,
        } => {
            let client = workspace_client(&load_config(&config))?;
            client
                .update_grants(
                    securable_type,
                    &full_name,
                    vec![uc_steward::workspace::PermissionsChange::grant(
                        &principal, privilege,
                    )],
                )
                .await?;
            println!("Granted {privilege} on {securable_type} {full_name} to {principal}");
            Ok(())
        }
        Command::Revoke {
            principal,
            privilege,
            securable_type,
            full_name,
            config,
        } => {
            let client = workspace_client(&load_config(&config))?;
            client
                .update_grants(
                    securable_type,
                    &full_name,
                    vec![uc_steward::workspace::PermissionsChange::revoke(
                        &principal, privilege,
                    )],
                )
                .await?;
            println!("Revoked {privilege} on {securable_type} {full_name} from {principal}");
            Ok(())
        }
    }
}

async fn run_repl(
    llm: &llm::LlmClient,
    client: &WorkspaceClient,
    agent_config: &config::AgentConfig,
) -> Result<()> {
    println!("Unity Catalog access agent. Type a request, or 'quit' to exit.");
    let mut history = Vec::new();
    let stdin = std::io::stdin();

    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let request = line.trim();
        if request.is_empty() {
            continue;
        }
        if matches!(request, "quit" | "exit") {
            break;
        }

        match agent::run_turn(llm, client, agent_config, &mut history, request).await {
            Ok((reply, stats)) => {
                println!("{reply}");
                println!(
                    "  [{} tool call(s), ${:.4}]",
                    stats.tool_calls, stats.total_cost_usd
                );
            }
            Err(e) => eprintln!("error: {e}"),
        }
    }

    Ok(())
}
