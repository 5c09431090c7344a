//! Command registry: name → handler, with aliases resolved at lookup.

use std::collections::HashMap;

use super::{
    challenge, curl, docker, echo, environ, fileops, filters, findgrep, flow, git, headtail, ls,
    navigation, net, node, python, system, tree, wc, CommandHandler,
};

/// Maps command names (and aliases) to handlers.
pub struct Registry {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
    aliases: HashMap<&'static str, &'static str>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Registry {
    /// An empty registry, for hosts that assemble their own catalogue.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// The full simulated tool catalogue.
    pub fn with_defaults() -> Self {
        let mut reg = Self::empty();

        // Coreutils / filesystem.
        reg.register("pwd", Box::new(navigation::Pwd));
        reg.register("cd", Box::new(navigation::Cd));
        reg.register("ls", Box::new(ls::Ls));
        reg.register("cat", Box::new(fileops::Cat));
        reg.register("mkdir", Box::new(fileops::Mkdir));
        reg.register("touch", Box::new(fileops::Touch));
        reg.register("rm", Box::new(fileops::Rm));
        reg.register("cp", Box::new(fileops::Cp));
        reg.register("mv", Box::new(fileops::Mv));
        reg.register("find", Box::new(findgrep::Find));
        reg.register("grep", Box::new(findgrep::Grep));
        reg.register("head", Box::new(headtail::Head));
        reg.register("tail", Box::new(headtail::Tail));
        reg.register("wc", Box::new(wc::Wc));
        reg.register("tree", Box::new(tree::Tree));

        // Builtins and text filters.
        reg.register("echo", Box::new(echo::Echo));
        reg.register("env", Box::new(environ::Env));
        reg.register("export", Box::new(environ::Export));
        reg.register("clear", Box::new(system::Clear));
        reg.register("history", Box::new(system::History));
        reg.register("whoami", Box::new(system::Whoami));
        reg.register("hostname", Box::new(system::Hostname));
        reg.register("date", Box::new(system::Date));
        reg.register("uname", Box::new(system::Uname));
        reg.register("which", Box::new(system::Which));
        reg.register("man", Box::new(system::Man));
        reg.register("help", Box::new(system::Help));
        reg.register("true", Box::new(flow::True));
        reg.register("false", Box::new(flow::False));
        reg.register("exit", Box::new(flow::Exit));
        reg.register("sort", Box::new(filters::Sort));
        reg.register("uniq", Box::new(filters::Uniq));
        reg.register("xargs", Box::new(filters::Xargs));

        // Simulated tools.
        reg.register("docker", Box::new(docker::Docker));
        reg.register("git", Box::new(git::Git));
        reg.register("node", Box::new(node::Node));
        reg.register("npm", Box::new(node::Npm));
        reg.register("npx", Box::new(node::Npx));
        reg.register("python", Box::new(python::Python));
        reg.register("pip", Box::new(python::Pip));
        reg.register("curl", Box::new(curl::Curl));
        reg.register("wget", Box::new(net::Wget));
        reg.register("ping", Box::new(net::Ping));
        reg.register("netstat", Box::new(net::Netstat));

        // Challenge helpers.
        reg.register("status", Box::new(challenge::Status));
        reg.register("hint", Box::new(challenge::Hint));
        reg.register("submit", Box::new(challenge::Submit));
        reg.register("next-level", Box::new(challenge::NextLevel));

        // Aliases, resolved on lookup.
        reg.alias("docker-compose", "docker");
        reg.alias("python3", "python");
        reg.alias("pip3", "pip");
        reg.alias("ss", "netstat");

        reg
    }

    pub fn register(&mut self, name: &'static str, handler: Box<dyn CommandHandler>) {
        self.handlers.insert(name, handler);
    }

    pub fn alias(&mut self, alias: &'static str, target: &'static str) {
        self.aliases.insert(alias, target);
    }

    /// Look a command up, resolving one level of aliasing.
    pub fn lookup(&self, name: &str) -> Option<&dyn CommandHandler> {
        let resolved = self.aliases.get(name).copied().unwrap_or(name);
        self.handlers.get(resolved).map(Box::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Every invocable name (handlers and aliases), sorted — the command
    /// completion vocabulary.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .handlers
            .keys()
            .chain(self.aliases.keys())
            .map(|s| s.to_string())
            .collect();
        names.sort();
        names
    }
}
