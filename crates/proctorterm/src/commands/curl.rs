//! curl - canned HTTP client.
//!
//! Usage:
//!   curl [-X METHOD] [-d DATA] [-H HEADER] [-i|-I] [-s] [-o FILE] [-L] [-f] [-v] URL
//!
//! URLs on the simulated API hosts (`localhost:3000`, `127.0.0.1:3000`,
//! `api:3000`) are routed to canned JSON responses keyed by path and method.
//! Other localhost ports refuse the connection with exit 7; anything else
//! returns a generic HTML page.

use async_trait::async_trait;
use serde_json::json;

use super::{CmdOutput, CommandHandler};
use crate::context::CommandContext;
use crate::error::Result;
use crate::parser::ParsedCommand;

pub struct Curl;

#[derive(Default)]
struct CurlOptions {
    method: Option<String>,
    data: Option<String>,
    headers: Vec<String>,
    include_headers: bool,
    head_only: bool,
    silent: bool,
    fail_on_error: bool,
    verbose: bool,
    output_file: Option<String>,
    url: Option<String>,
}

impl CurlOptions {
    fn parse(tokens: &[String]) -> Self {
        let mut opts = Self::default();
        let mut iter = tokens.iter();
        while let Some(token) = iter.next() {
            match token.as_str() {
                "-X" | "--request" => opts.method = iter.next().cloned(),
                "-d" | "--data" | "--data-raw" => opts.data = iter.next().cloned(),
                "-H" | "--header" => {
                    if let Some(header) = iter.next() {
                        opts.headers.push(header.clone());
                    }
                }
                "-i" | "--include" => opts.include_headers = true,
                "-I" | "--head" => {
                    opts.head_only = true;
                    opts.include_headers = true;
                }
                "-s" | "--silent" => opts.silent = true,
                "-o" | "--output" => opts.output_file = iter.next().cloned(),
                "-f" | "--fail" => opts.fail_on_error = true,
                "-v" | "--verbose" => opts.verbose = true,
                "-L" | "--location" => {}
                other if other.starts_with('-') => {}
                other => opts.url = Some(other.to_string()),
            }
        }
        opts
    }

    fn method(&self) -> String {
        match &self.method {
            Some(m) => m.to_uppercase(),
            None if self.data.is_some() => "POST".to_string(),
            None if self.head_only => "HEAD".to_string(),
            None => "GET".to_string(),
        }
    }
}

/// Split a URL into (host:port, path).
fn host_and_path(url: &str) -> (String, String) {
    let without_scheme = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .unwrap_or(url);
    match without_scheme.find('/') {
        Some(i) => (
            without_scheme[..i].to_string(),
            without_scheme[i..].to_string(),
        ),
        None => (without_scheme.to_string(), "/".to_string()),
    }
}

const API_HOSTS: &[&str] = &["localhost:3000", "127.0.0.1:3000", "api:3000"];

/// Route a simulated API request. Returns (status, reason, body).
fn route(path: &str, method: &str, data: Option<&str>) -> (u16, &'static str, String) {
    let path = path.split('?').next().unwrap_or(path).trim_end_matches('/');
    let normalized = path.strip_prefix("/api/v1").unwrap_or(path);
    match (normalized, method) {
        ("/health", "GET") | ("/health", "HEAD") => (
            200,
            "OK",
            json!({"status": "ok", "uptime": 1742, "version": "2.4.1"}).to_string(),
        ),
        ("/vehicles", "GET") => (
            200,
            "OK",
            json!([
                {"id": "veh-1042", "plate": "KJH-3821", "status": "active", "driver": "drv-204"},
                {"id": "veh-1043", "plate": "PLQ-0934", "status": "maintenance", "driver": null},
                {"id": "veh-1044", "plate": "XRT-5521", "status": "active", "driver": "drv-117"}
            ])
            .to_string(),
        ),
        ("/vehicles", "POST") => {
            let echoed = data
                .and_then(|d| serde_json::from_str::<serde_json::Value>(d).ok())
                .unwrap_or_else(|| json!({}));
            (
                201,
                "Created",
                json!({"id": "veh-1045", "status": "active", "created": true, "payload": echoed})
                    .to_string(),
            )
        }
        ("/drivers", "GET") => (
            200,
            "OK",
            json!([
                {"id": "drv-117", "name": "R. Okafor", "shift": "day", "available": true},
                {"id": "drv-204", "name": "L. Vega", "shift": "night", "available": false}
            ])
            .to_string(),
        ),
        ("/trips", "GET") => (
            200,
            "OK",
            json!([
                {"id": "trip-88201", "vehicle": "veh-1042", "distance_km": 18.4, "status": "completed"},
                {"id": "trip-88202", "vehicle": "veh-1044", "distance_km": 6.1, "status": "in_progress"}
            ])
            .to_string(),
        ),
        _ => (
            404,
            "Not Found",
            json!({"error": "Not Found", "path": path}).to_string(),
        ),
    }
}

#[async_trait]
impl CommandHandler for Curl {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let opts = CurlOptions::parse(&cmd.arg_tokens);
        let Some(url) = &opts.url else {
            return Ok(CmdOutput::err("curl: no URL specified!\n", 2));
        };
        let (host, path) = host_and_path(url);
        let method = opts.method();

        // Simulated API hosts.
        if API_HOSTS.contains(&host.as_str()) {
            let (status, reason, body) = route(&path, &method, opts.data.as_deref());

            if opts.fail_on_error && status >= 400 {
                return Ok(CmdOutput::err(
                    format!("curl: (22) The requested URL returned error: {}\n", status),
                    22,
                ));
            }

            let mut out = String::new();
            if opts.verbose {
                out.push_str(&format!("* Connected to {} port 3000\n", host));
                out.push_str(&format!("> {} {} HTTP/1.1\n", method, path));
                for header in &opts.headers {
                    out.push_str(&format!("> {}\n", header));
                }
                out.push_str("< \n");
            }
            if opts.include_headers {
                out.push_str(&format!("HTTP/1.1 {} {}\n", status, reason));
                out.push_str("Content-Type: application/json; charset=utf-8\n");
                out.push_str(&format!("Content-Length: {}\n", body.len()));
                out.push_str("Connection: keep-alive\n\n");
            }
            if !opts.head_only {
                if let Some(file) = &opts.output_file {
                    let path = ctx.expand_path(file);
                    let cwd = ctx.cwd.clone();
                    if ctx.fs.write_file(&path, &cwd, &body).is_err() {
                        return Ok(CmdOutput::err(
                            format!("curl: (23) Failed writing body to {}\n", file),
                            23,
                        ));
                    }
                } else {
                    out.push_str(&body);
                    out.push('\n');
                }
            }
            return Ok(CmdOutput::ok(out));
        }

        // Unknown localhost ports refuse the connection.
        if host.starts_with("localhost") || host.starts_with("127.0.0.1") {
            let port = host.split(':').nth(1).unwrap_or("80");
            return Ok(CmdOutput::err(
                format!(
                    "curl: (7) Failed to connect to {} port {} after 0 ms: Connection refused\n",
                    host.split(':').next().unwrap_or(&host),
                    port
                ),
                7,
            ));
        }

        // Everything else gets a generic page.
        let body = "<html>OK</html>";
        if let Some(file) = &opts.output_file {
            let path = ctx.expand_path(file);
            let cwd = ctx.cwd.clone();
            let _ = ctx.fs.write_file(&path, &cwd, body);
            return Ok(CmdOutput::ok(""));
        }
        Ok(CmdOutput::ok(format!("{}\n", body)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commands::testutil::run_with;

    #[tokio::test]
    async fn health_endpoint() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Curl, "curl http://localhost:3000/health", &mut ctx, None).await;
        assert!(out.is_success());
        assert!(out.output.contains("\"status\":\"ok\""));
    }

    #[tokio::test]
    async fn vehicles_get_and_post() {
        let mut ctx = CommandContext::new();
        let list = run_with(
            &Curl,
            "curl http://localhost:3000/api/v1/vehicles",
            &mut ctx,
            None,
        )
        .await;
        assert!(list.output.contains("veh-1042"));

        let created = run_with(
            &Curl,
            "curl -X POST -d '{\"plate\": \"NEW-0001\"}' http://api:3000/api/v1/vehicles",
            &mut ctx,
            None,
        )
        .await;
        assert!(created.output.contains("\"created\":true"));
        assert!(created.output.contains("NEW-0001"));
    }

    #[tokio::test]
    async fn data_implies_post() {
        let mut ctx = CommandContext::new();
        let out = run_with(
            &Curl,
            "curl -d '{}' http://localhost:3000/api/v1/vehicles",
            &mut ctx,
            None,
        )
        .await;
        assert!(out.output.contains("veh-1045"));
    }

    #[tokio::test]
    async fn include_headers_and_head() {
        let mut ctx = CommandContext::new();
        let with_headers = run_with(
            &Curl,
            "curl -i http://localhost:3000/health",
            &mut ctx,
            None,
        )
        .await;
        assert!(with_headers.output.starts_with("HTTP/1.1 200 OK\n"));
        assert!(with_headers.output.contains("Content-Type: application/json"));
        assert!(with_headers.output.contains("\"status\":\"ok\""));

        let head = run_with(&Curl, "curl -I http://localhost:3000/health", &mut ctx, None).await;
        assert!(head.output.contains("HTTP/1.1 200 OK"));
        assert!(!head.output.contains("\"status\""));
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Curl, "curl http://localhost:3000/nope", &mut ctx, None).await;
        assert!(out.is_success());
        assert!(out.output.contains("Not Found"));

        let failed = run_with(
            &Curl,
            "curl -f http://localhost:3000/nope",
            &mut ctx,
            None,
        )
        .await;
        assert_eq!(failed.exit_code, 22);
        assert!(failed.output.contains("(22)"));
    }

    #[tokio::test]
    async fn refused_port_is_exit_7() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Curl, "curl http://localhost:8080/health", &mut ctx, None).await;
        assert_eq!(out.exit_code, 7);
        assert!(out.output.contains("Connection refused"));
    }

    #[tokio::test]
    async fn external_url_generic_page() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Curl, "curl https://example.com", &mut ctx, None).await;
        assert_eq!(out.output, "<html>OK</html>\n");
    }

    #[tokio::test]
    async fn output_flag_writes_to_vfs() {
        let mut ctx = CommandContext::new();
        let out = run_with(
            &Curl,
            "curl -s -o /tmp/health.json http://localhost:3000/health",
            &mut ctx,
            None,
        )
        .await;
        assert!(out.is_success());
        assert_eq!(out.output, "");
        let saved = ctx.fs.read_file("/tmp/health.json", "/").unwrap();
        assert!(saved.contains("\"status\":\"ok\""));
    }

    #[tokio::test]
    async fn no_url_is_usage_error() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Curl, "curl -s", &mut ctx, None).await;
        assert_eq!(out.exit_code, 2);
    }

    #[tokio::test]
    async fn drivers_and_trips() {
        let mut ctx = CommandContext::new();
        let drivers = run_with(&Curl, "curl http://localhost:3000/drivers", &mut ctx, None).await;
        assert!(drivers.output.contains("drv-117"));

        let trips = run_with(
            &Curl,
            "curl http://127.0.0.1:3000/api/v1/trips",
            &mut ctx,
            None,
        )
        .await;
        assert!(trips.output.contains("trip-88201"));
    }
}
