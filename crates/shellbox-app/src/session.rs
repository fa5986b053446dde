//! One interactive session: engine, registry, and execution context.

use std::path::Path;

use anyhow::{Context, Result};
use shellbox_terminal::{CommandOutput, CommandRegistry, ExecutionContext, register_builtins};
use shellbox_types::config::SandboxConfig;
use shellbox_vfs::{FileSystem, FsOptions, populate_demo_tree};

/// What the front end should do after a line was handled.
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    /// Print these lines on stdout.
    Lines(Vec<String>),
    /// Print this message on stderr.
    Error(String),
    /// Wipe the screen.
    Clear,
    /// Leave the loop.
    Exit,
}

pub struct Session {
    config: SandboxConfig,
    registry: CommandRegistry,
    ctx: ExecutionContext,
    fs: FileSystem,
}

impl Session {
    /// Build a session with the demo tree seeded and the cwd at home.
    pub fn new(config: SandboxConfig) -> Result<Self> {
        let mut registry = CommandRegistry::new();
        register_builtins(&mut registry).context("registering built-in commands")?;
        let mut fs = FileSystem::in_memory(FsOptions::from(&config));
        populate_demo_tree(&mut fs).context("seeding demo filesystem")?;
        let mut ctx = ExecutionContext::from_config(&config);
        ctx.cwd = fs.cwd().to_string();
        log::info!(
            "session ready: {} commands, {} files",
            registry.list().len(),
            fs.statistics().total_files
        );
        Ok(Self {
            config,
            registry,
            ctx,
            fs,
        })
    }

    pub fn prompt(&self) -> String {
        self.config.render_prompt(self.fs.cwd())
    }

    pub fn fs(&self) -> &FileSystem {
        &self.fs
    }

    /// Run one input line.
    pub fn handle(&mut self, line: &str) -> Reply {
        if matches!(line.trim(), "exit" | "logout") {
            return Reply::Exit;
        }
        match self.registry.execute(line, &mut self.ctx, &mut self.fs) {
            Ok(CommandOutput::Text(text)) => Reply::Lines(text.lines().map(str::to_string).collect()),
            Ok(CommandOutput::None) => Reply::Lines(Vec::new()),
            Ok(CommandOutput::Clear) => Reply::Clear,
            Err(e) => Reply::Error(e.to_string()),
        }
    }
}

/// Load the config named on the command line or in `SHELLBOX_CONFIG`,
/// falling back to defaults when neither is set.
pub fn load_config(arg: Option<String>) -> Result<SandboxConfig> {
    let Some(path) = arg.or_else(|| std::env::var("SHELLBOX_CONFIG").ok()) else {
        log::debug!("no config file given, using defaults");
        return Ok(SandboxConfig::default());
    };
    SandboxConfig::load(Path::new(&path)).with_context(|| format!("loading config {path}"))
}
