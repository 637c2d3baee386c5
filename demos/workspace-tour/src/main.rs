//! Walks through declaring local shell actions and a remote catalog action,
//! registering them, and invoking them against an in-memory workspace.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use actionkit::config::RegistryConfig;
use actionkit::tools::{
    ActionEnum, CommandOutput, Metadata, Registry, RemoteActionSchema, RemoteExecutor, Shell,
    Shells, ToolDefinition, ToolError, ToolResult, Workspace, action,
};
use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{Value, json};
use tracing::info;

#[derive(Debug, Parser)]
#[command(about = "Register and invoke actions against an in-memory workspace")]
struct Args {
    /// JSON registry configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log: String,

    /// Only list the registered actions.
    #[arg(long)]
    list: bool,
}

/// Shell that records commands and answers with canned output.
#[derive(Debug)]
struct ScriptedShell {
    id: String,
    cwd: Mutex<String>,
}

impl ScriptedShell {
    fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_owned(),
            cwd: Mutex::new("/workspace".to_owned()),
        })
    }
}

impl Shell for ScriptedShell {
    fn id(&self) -> &str {
        &self.id
    }

    fn exec(&self, command: &str) -> ToolResult<CommandOutput> {
        let mut cwd = self
            .cwd
            .lock()
            .map_err(|_| ToolError::execution("shell", "shell state poisoned"))?;

        let output = match command.split_once(' ') {
            Some(("cd", dir)) => {
                *cwd = dir.trim().to_owned();
                String::new()
            }
            _ if command == "pwd" => cwd.clone(),
            _ => format!("{}> {command}", self.id),
        };
        Ok(CommandOutput {
            output,
            return_code: 0,
        })
    }
}

#[derive(Debug, Default)]
struct LocalWorkspace {
    shells: Shells,
}

impl Workspace for LocalWorkspace {
    fn id(&self) -> &str {
        "local"
    }

    fn shells(&self) -> &Shells {
        &self.shells
    }
}

/// Stands in for the HTTP client that would call the catalog's API.
struct EchoExecutor;

impl RemoteExecutor for EchoExecutor {
    fn execute_action(
        &self,
        action: &ActionEnum,
        params: Value,
        _metadata: &Metadata,
    ) -> ToolResult<Value> {
        info!(%action, %params, "forwarding to remote executor");
        Ok(json!({ "data": { "action": action.as_str(), "params": params }, "successful": true }))
    }
}

/// Change the working directory of the current shell.
/// :param path: directory to enter
/// :return cwd: directory after the change
#[action(tool = "cmdmanager", tags("navigation"), crate = "::actionkit::tools")]
fn chdir(shell: &dyn Shell, path: String) -> ToolResult<String> {
    shell.exec(&format!("cd {path}"))?;
    Ok(shell.exec("pwd")?.output)
}

/// Run an arbitrary command.
/// :param command: command line to run
#[action(tool = "cmdmanager", requires("bash"), crate = "::actionkit::tools")]
fn run(
    #[context] shell: Arc<dyn Shell>,
    command: String,
    #[arg(description = "Exit status treated as success", default = 0)] expect_status: i32,
) -> Result<String, String> {
    let out = shell.exec(&command).map_err(|err| err.to_string())?;
    if out.return_code == expect_status {
        Ok(out.output)
    } else {
        Err(format!("exit status {}", out.return_code))
    }
}

/// Show the working tree status.
#[action(tool = "git", tags("vcs"), requires("git"), crate = "::actionkit::tools")]
fn status(shell: &dyn Shell) -> ToolResult<String> {
    Ok(shell.exec("git status --short")?.output)
}

fn catalog() -> Result<RemoteActionSchema> {
    let entry = json!({
        "name": "GITHUB_STAR_REPO",
        "appName": "github",
        "description": "Star a repository on GitHub.",
        "parameters": {
            "title": "StarRepoRequest",
            "type": "object",
            "properties": {
                "owner": { "type": "string", "title": "Owner", "description": "repository owner" },
                "repo": { "type": "string", "title": "Repo", "description": "repository name" }
            },
            "required": ["owner", "repo"]
        }
    });
    Ok(RemoteActionSchema::from_value(entry)?)
}

fn load_config(path: Option<&PathBuf>) -> Result<RegistryConfig> {
    let config = match path {
        Some(path) => RegistryConfig::from_file(path)?,
        None => RegistryConfig::default(),
    };
    config.apply_env().context("applying environment overrides")
}

fn main() -> Result<()> {
    let args = Args::parse();
    actionkit::telemetry::try_init(Some(args.log.as_str()))?;

    let config = load_config(args.config.as_ref())?;
    let mut registry = Registry::with_config(config);
    let declared = registry.load_declared()?;
    registry.register_remote(catalog()?, Arc::new(EchoExecutor))?;
    registry.register_tool(
        ToolDefinition::new("git")
            .description("Git helpers.")
            .actions(|| status_action().build().into_iter().collect())
            .build()?,
    )?;
    info!(declared, total = registry.len(), "registry ready");

    for tool in registry.tools() {
        println!("{} ({}): {}", tool.display_name(), tool.tool_enum(), tool.description());
        for spec in tool.actions() {
            println!(
                "  {:<24} {} -> {}  {}",
                spec.action_enum(),
                spec.request_model().name(),
                spec.response_model().name(),
                spec.description()
            );
        }
    }
    if args.list {
        return Ok(());
    }

    let mut workspace = LocalWorkspace::default();
    workspace.shells.push(ScriptedShell::new("sh-0"));
    workspace.shells.push(ScriptedShell::new("sh-1"));
    let metadata = Metadata::new().with_workspace(Arc::new(workspace));

    let calls = [
        ("CMDMANAGER_CHDIR", json!({ "path": "/workspace/src" })),
        ("CMDMANAGER_RUN", json!({ "command": "ls" })),
        ("GIT_STATUS", json!({})),
        ("GITHUB_STAR_REPO", json!({ "owner": "rust-lang", "repo": "rust" })),
        ("GITHUB_STAR_REPO", json!({ "owner": "rust-lang" })),
    ];
    for (id, request) in calls {
        match registry.execute(id, &request, &metadata) {
            Ok(response) => println!("{id}: {response}"),
            Err(err) => println!("{id} rejected: {err}"),
        }
    }

    let schema = registry
        .get_action("CMDMANAGER_RUN")
        .context("run action missing")?
        .request_model()
        .to_json_schema();
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
