//! docker / docker-compose - simulated container runtime.
//!
//! Renders from the per-session [`DockerSimState`](crate::sim::DockerSimState):
//! `ps`, `images`, `logs`, `exec`, `inspect` read it; `start`, `stop` and
//! `compose up`/`down` mutate it. Invoked as `docker-compose`, the argument
//! list is treated as compose subcommands directly.

use async_trait::async_trait;
use serde_json::json;

use super::{CmdOutput, CommandHandler};
use crate::context::CommandContext;
use crate::error::Result;
use crate::parser::ParsedCommand;
use crate::sim::{Container, ContainerStatus};

pub struct Docker;

#[async_trait]
impl CommandHandler for Docker {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        if cmd.flag("version") && cmd.args.is_empty() {
            return Ok(CmdOutput::ok(
                "Docker version 24.0.7, build afdd53b\n",
            ));
        }

        // `docker-compose up` == `docker compose up`.
        let compose_invocation = cmd.command == "docker-compose";
        let args: Vec<&str> = cmd.args.iter().map(String::as_str).collect();
        let (subcommand, rest) = if compose_invocation {
            ("compose", args.as_slice())
        } else {
            match args.split_first() {
                Some((first, rest)) => (*first, rest),
                None => {
                    return Ok(CmdOutput::err(
                        "Usage:  docker [OPTIONS] COMMAND\n\n\
                         Common commands:\n\
                         \tps         List containers\n\
                         \timages     List images\n\
                         \tlogs       Fetch container logs\n\
                         \texec       Execute a command in a running container\n\
                         \tinspect    Display detailed information\n\
                         \tstart      Start containers\n\
                         \tstop       Stop containers\n\
                         \tcompose    Docker Compose\n",
                        1,
                    ))
                }
            }
        };

        match subcommand {
            "ps" => docker_ps(cmd, ctx),
            "images" => docker_images(),
            "logs" => docker_logs(ctx, rest),
            "exec" => docker_exec(ctx, rest),
            "inspect" => docker_inspect(ctx, rest),
            "start" => docker_start_stop(ctx, rest, ContainerStatus::Running),
            "stop" => docker_start_stop(ctx, rest, ContainerStatus::Exited),
            "compose" => docker_compose(ctx, rest),
            other => Ok(CmdOutput::err(
                format!("docker: '{}' is not a docker command.\nSee 'docker --help'\n", other),
                1,
            )),
        }
    }
}

fn status_text(container: &Container) -> &'static str {
    match container.status {
        ContainerStatus::Running => "Up 12 minutes",
        ContainerStatus::Exited => "Exited (0) 2 hours ago",
    }
}

fn docker_ps(cmd: &ParsedCommand, ctx: &mut CommandContext) -> Result<CmdOutput> {
    let all = cmd.flag("a");
    let mut out = format!(
        "{:<14} {:<16} {:<24} {:<24} {:<26} {}\n",
        "CONTAINER ID", "IMAGE", "COMMAND", "STATUS", "PORTS", "NAMES"
    );
    for container in ctx.sim.docker.containers() {
        if !all && !container.is_running() {
            continue;
        }
        let ports = if container.is_running() {
            container.ports.as_str()
        } else {
            ""
        };
        out.push_str(&format!(
            "{:<14} {:<16} {:<24} {:<24} {:<26} {}\n",
            container.id,
            container.image,
            container.command,
            status_text(container),
            ports,
            container.name
        ));
    }
    Ok(CmdOutput::ok(out))
}

fn docker_images() -> Result<CmdOutput> {
    Ok(CmdOutput::ok(format!(
        "{:<18} {:<10} {:<14} {:<16} {}\n\
         {:<18} {:<10} {:<14} {:<16} {}\n\
         {:<18} {:<10} {:<14} {:<16} {}\n\
         {:<18} {:<10} {:<14} {:<16} {}\n",
        "REPOSITORY", "TAG", "IMAGE ID", "CREATED", "SIZE",
        "node", "18-alpine", "b2f5a1c09e3d", "3 weeks ago", "181MB",
        "postgres", "15", "7a9e0c41d8b5", "5 weeks ago", "417MB",
        "redis", "7", "e40d2f19c6a8", "5 weeks ago", "138MB",
    )))
}

fn require_container<'a>(
    ctx: &'a mut CommandContext,
    args: &[&str],
) -> std::result::Result<&'a Container, CmdOutput> {
    let Some(name) = args.first() else {
        return Err(CmdOutput::err(
            "\"docker\" requires at least 1 argument.\n",
            1,
        ));
    };
    match ctx.sim.docker.get(name) {
        Some(container) => Ok(container),
        None => Err(CmdOutput::err(
            format!("Error: No such container: {}\n", name),
            1,
        )),
    }
}

fn docker_logs(ctx: &mut CommandContext, args: &[&str]) -> Result<CmdOutput> {
    let container = match require_container(ctx, args) {
        Ok(c) => c,
        Err(out) => return Ok(out),
    };
    let logs = match container.name.as_str() {
        "fleetcore-api" => {
            "> fleetcore-api@2.4.1 start\n\
             > node src/server.js\n\
             \n\
             [telemetry] consumer connected to fleetcore-cache:6379\n\
             [db] pool established (max=10)\n\
             FleetCore API listening on port 3000\n"
        }
        "fleetcore-db" => {
            "PostgreSQL Database directory appears to contain a database; skipping initialization\n\
             \n\
             2025-07-14 09:00:12.041 UTC [1] LOG:  starting PostgreSQL 15.6\n\
             2025-07-14 09:00:12.058 UTC [1] LOG:  listening on IPv4 address \"0.0.0.0\", port 5432\n\
             2025-07-14 09:00:12.102 UTC [28] LOG:  database system is ready to accept connections\n"
        }
        "fleetcore-cache" => {
            "1:C 14 Jul 2025 09:00:11.893 * Redis version=7.2.4, bits=64\n\
             1:M 14 Jul 2025 09:00:11.895 * Ready to accept connections tcp\n"
        }
        _ => "",
    };
    Ok(CmdOutput::ok(logs))
}

fn docker_exec(ctx: &mut CommandContext, args: &[&str]) -> Result<CmdOutput> {
    // Skip exec flags (-it and friends).
    let args: Vec<&str> = args
        .iter()
        .copied()
        .filter(|a| !a.starts_with('-'))
        .collect();
    let container = match require_container(ctx, &args) {
        Ok(c) => c,
        Err(out) => return Ok(out),
    };
    if !container.is_running() {
        return Ok(CmdOutput::err(
            format!(
                "Error response from daemon: container {} is not running\n",
                container.name
            ),
            1,
        ));
    }
    let inner = args[1..].join(" ");
    let output = if inner.contains("pg_isready") {
        "/var/run/postgresql:5432 - accepting connections\n".to_string()
    } else if inner.contains("psql") {
        " count \n-------\n    42\n(1 row)\n".to_string()
    } else if inner.contains("redis-cli") && inner.contains("ping") {
        "PONG\n".to_string()
    } else if inner.is_empty() {
        return Ok(CmdOutput::err(
            "\"docker exec\" requires at least 2 arguments.\n",
            1,
        ));
    } else {
        format!("[executed in {}] {}\n", container.name, inner)
    };
    Ok(CmdOutput::ok(output))
}

fn docker_inspect(ctx: &mut CommandContext, args: &[&str]) -> Result<CmdOutput> {
    let container = match require_container(ctx, args) {
        Ok(c) => c,
        Err(out) => return Ok(out),
    };
    let value = json!([{
        "Id": container.id,
        "Name": format!("/{}", container.name),
        "Config": {
            "Image": container.image,
            "Cmd": container.command.trim_matches('"'),
        },
        "State": {
            "Status": if container.is_running() { "running" } else { "exited" },
            "Running": container.is_running(),
            "ExitCode": 0,
        },
        "NetworkSettings": {
            "Ports": container.ports,
        },
    }]);
    let rendered = serde_json::to_string_pretty(&value)
        .map_err(|e| crate::error::Error::Execution(e.to_string()))?;
    Ok(CmdOutput::ok(format!("{}\n", rendered)))
}

fn docker_start_stop(
    ctx: &mut CommandContext,
    args: &[&str],
    status: ContainerStatus,
) -> Result<CmdOutput> {
    let Some(name) = args.first() else {
        return Ok(CmdOutput::err(
            "\"docker\" requires at least 1 argument.\n",
            1,
        ));
    };
    match ctx.sim.docker.get_mut(name) {
        Some(container) => {
            container.status = status;
            Ok(CmdOutput::ok(format!("{}\n", name)))
        }
        None => Ok(CmdOutput::err(
            format!("Error: No such container: {}\n", name),
            1,
        )),
    }
}

fn docker_compose(ctx: &mut CommandContext, args: &[&str]) -> Result<CmdOutput> {
    match args.first().copied() {
        Some("up") => {
            let names = ctx.sim.docker.set_all(ContainerStatus::Running);
            let mut out = String::new();
            for name in &names {
                out.push_str(&format!(" ✔ Container {}  Started\n", name));
            }
            Ok(CmdOutput::ok(out))
        }
        Some("down") => {
            let names = ctx.sim.docker.set_all(ContainerStatus::Exited);
            let mut out = String::new();
            for name in &names {
                out.push_str(&format!(" ✔ Container {}  Stopped\n", name));
            }
            out.push_str(" ✔ Network fleetcore_default  Removed\n");
            Ok(CmdOutput::ok(out))
        }
        Some("ps") => docker_ps(&ParsedCommand::named("docker"), ctx),
        Some(other) => Ok(CmdOutput::err(
            format!("unknown docker compose command: {}\n", other),
            1,
        )),
        None => Ok(CmdOutput::err(
            "usage: docker compose [up|down|ps]\n",
            1,
        )),
    }
}
