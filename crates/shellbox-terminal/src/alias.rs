//! Command aliases built by delegation.
//!
//! An alias owns a handle to its base command and forwards every call,
//! putting its fixed arguments in front of whatever the user typed.

use std::rc::Rc;

use shellbox_types::error::Result;
use shellbox_vfs::FileSystem;

use crate::interpreter::{Category, Command, CommandOutput, ExecutionContext};
use crate::options::OptionSpec;

pub struct Alias {
    base: Rc<dyn Command>,
    name: String,
    prefix: Vec<String>,
    description: String,
    usage: String,
}

impl Alias {
    /// `name` runs `base` with `prefix` inserted before the user's arguments.
    pub fn wrap(base: Rc<dyn Command>, name: &str, prefix: &[&str]) -> Self {
        let expansion = std::iter::once(base.name())
            .chain(prefix.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            description: format!("Alias for '{expansion}' | '{expansion}' 的别名"),
            usage: format!("{name} [args...]  (= {expansion} [args...])"),
            name: name.to_string(),
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            base,
        }
    }

    pub fn base(&self) -> &dyn Command {
        self.base.as_ref()
    }
}

impl Command for Alias {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn usage(&self) -> &str {
        &self.usage
    }

    fn category(&self) -> Category {
        self.base.category()
    }

    fn options(&self) -> &[OptionSpec] {
        self.base.options()
    }

    fn examples(&self) -> &[&str] {
        self.base.examples()
    }

    fn supports_pipe(&self) -> bool {
        self.base.supports_pipe()
    }

    fn supports_redirect(&self) -> bool {
        self.base.supports_redirect()
    }

    fn requires_args(&self) -> bool {
        self.base.requires_args() && self.prefix.is_empty()
    }

    fn execute(
        &self,
        args: &[&str],
        ctx: &mut ExecutionContext,
        fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        let full: Vec<&str> = self
            .prefix
            .iter()
            .map(String::as_str)
            .chain(args.iter().copied())
            .collect();
        self.base.execute(&full, ctx, fs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellbox_vfs::FsOptions;

    struct ArgsCmd;
    impl Command for ArgsCmd {
        fn name(&self) -> &str {
            "args"
        }
        fn description(&self) -> &str {
            "Echo arguments"
        }
        fn usage(&self) -> &str {
            "args [...]"
        }
        fn category(&self) -> Category {
            Category::Files
        }
        fn examples(&self) -> &[&str] {
            &["args a b"]
        }
        fn execute(
            &self,
            args: &[&str],
            _ctx: &mut ExecutionContext,
            _fs: &mut FileSystem,
        ) -> Result<CommandOutput> {
            Ok(CommandOutput::Text(args.join(",")))
        }
    }

    #[test]
    fn prefix_goes_first() {
        let alias = Alias::wrap(Rc::new(ArgsCmd), "al", &["-l"]);
        let mut ctx = ExecutionContext::default();
        let mut fs = FileSystem::in_memory(FsOptions::default());
        let out = alias.execute(&["x", "y"], &mut ctx, &mut fs).unwrap();
        assert_eq!(out, CommandOutput::Text("-l,x,y".into()));
    }

    #[test]
    fn inherits_base_metadata() {
        let alias = Alias::wrap(Rc::new(ArgsCmd), "al", &["-l"]);
        assert_eq!(alias.name(), "al");
        assert_eq!(alias.category(), Category::Files);
        assert_eq!(alias.base().name(), "args");
        assert!(alias.description().contains("args -l"));
        assert_eq!(alias.examples(), &["args a b"]);
    }
}
