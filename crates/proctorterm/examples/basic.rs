//! Basic usage: drive the emulator with whole command lines.
//!
//! Run with: cargo run --example basic

use proctorterm::Terminal;

#[tokio::main]
async fn main() {
    let mut term = Terminal::new();

    for line in [
        "whoami",
        "mkdir -p /srv/app && cd /srv/app",
        "echo port=3000 > app.conf",
        "cat app.conf",
        "git status",
        "docker compose up -d",
        "curl -s http://localhost:3000/health",
        "echo hello world | wc -w",
    ] {
        println!("$ {}", line);
        let result = term.execute_line(line).await;
        print!("{}", result.output);
        if result.exit_code != 0 {
            println!("(exit {})", result.exit_code);
        }
    }
}
