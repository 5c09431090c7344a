//! wget, ping, netstat/ss - canned network utilities.

use async_trait::async_trait;

use super::{CmdOutput, CommandHandler};
use crate::context::CommandContext;
use crate::error::Result;
use crate::parser::ParsedCommand;

pub struct Wget;

#[async_trait]
impl CommandHandler for Wget {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let Some(url) = cmd.args.first().cloned() else {
            return Ok(CmdOutput::err(
                "wget: missing URL\nUsage: wget [OPTION]... [URL]...\n",
                2,
            ));
        };
        let without_scheme = url
            .strip_prefix("http://")
            .or_else(|| url.strip_prefix("https://"))
            .unwrap_or(&url);
        let filename = match without_scheme.trim_end_matches('/').split_once('/') {
            Some((_, rest)) => rest
                .rsplit('/')
                .next()
                .filter(|n| !n.is_empty())
                .unwrap_or("index.html"),
            None => "index.html",
        }
        .to_string();
        let body = "<html>OK</html>\n";
        let cwd = ctx.cwd.clone();
        let _ = ctx.fs.write_file(&filename, &cwd, body);

        Ok(CmdOutput::ok(format!(
            "--2025-07-14 09:12:44--  {url}\n\
             Resolving host... done.\n\
             HTTP request sent, awaiting response... 200 OK\n\
             Length: {len} [text/html]\n\
             Saving to: '{name}'\n\
             \n\
             {name}          100%[===================>]      {len}  --.-KB/s    in 0s\n\
             \n\
             '{name}' saved [{len}/{len}]\n",
            url = url,
            len = body.len(),
            name = filename,
        )))
    }
}

pub struct Ping;

#[async_trait]
impl CommandHandler for Ping {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        _ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let Some(host) = cmd.args.first() else {
            return Ok(CmdOutput::err("ping: usage error: Destination address required\n", 2));
        };
        let rtts = ["0.042", "0.038", "0.041"];
        let mut out = format!("PING {host} ({host}) 56(84) bytes of data.\n", host = host);
        for (i, rtt) in rtts.iter().enumerate() {
            out.push_str(&format!(
                "64 bytes from {}: icmp_seq={} ttl=64 time={} ms\n",
                host,
                i + 1,
                rtt
            ));
        }
        out.push_str(&format!(
            "\n--- {} ping statistics ---\n\
             3 packets transmitted, 3 received, 0% packet loss, time 2003ms\n\
             rtt min/avg/max/mdev = 0.038/0.040/0.042/0.002 ms\n",
            host
        ));
        Ok(CmdOutput::ok(out))
    }
}

pub struct Netstat;

#[async_trait]
impl CommandHandler for Netstat {
    async fn execute(
        &self,
        _cmd: &ParsedCommand,
        _ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        Ok(CmdOutput::ok(
            "Active Internet connections (only servers)\n\
             Proto Recv-Q Send-Q Local Address           Foreign Address         State      \n\
             tcp        0      0 0.0.0.0:3000            0.0.0.0:*               LISTEN     \n\
             tcp        0      0 127.0.0.1:5432          0.0.0.0:*               LISTEN     \n\
             tcp        0      0 127.0.0.1:6379          0.0.0.0:*               LISTEN     \n\
             tcp        0      0 0.0.0.0:22              0.0.0.0:*               LISTEN     \n",
        ))
    }
}
