//! Simulated tool workflows end to end: git, docker, node/npm, curl and
//! the challenge commands driving each other through shared session state.

use std::sync::Arc;

use proctorterm::{
    ChallengeCatalog, LevelSpec, ObjectiveRule, ObjectiveSpec, RegexEvaluator, Terminal,
};
use regex::Regex;

#[tokio::test]
async fn git_feature_branch_workflow() {
    let mut term = Terminal::new();

    let status = term.execute_line("git status").await;
    assert!(status.output.contains("Changes not staged for commit"));

    term.execute_line("git checkout -b fix/telemetry-nulls").await;
    term.execute_line("git add .").await;
    let commit = term
        .execute_line("git commit -m 'fix: guard null GPS fixes'")
        .await;
    assert!(commit.output.contains("[fix/telemetry-nulls "));

    let log = term.execute_line("git log --oneline -n 1").await;
    assert!(log.output.contains("fix: guard null GPS fixes"));

    let clean = term.execute_line("git status").await;
    assert!(clean.output.contains("working tree clean"));

    let push = term.execute_line("git push").await;
    assert!(push.output.contains("fix/telemetry-nulls -> fix/telemetry-nulls"));
}

#[tokio::test]
async fn docker_compose_lifecycle() {
    let mut term = Terminal::new();

    let before = term.execute_line("docker ps").await;
    assert!(!before.output.contains("fleetcore-db"));

    term.execute_line("docker compose up -d").await;
    let after = term.execute_line("docker ps").await;
    assert!(after.output.contains("fleetcore-db"));

    let ready = term
        .execute_line("docker exec fleetcore-db pg_isready")
        .await;
    assert!(ready.output.contains("accepting connections"));

    term.execute_line("docker-compose down").await;
    let stopped = term.execute_line("docker ps -a").await;
    assert!(stopped.output.contains("Exited (0)"));
}

#[tokio::test]
async fn node_project_inspection_flow() {
    let mut term = Terminal::new();
    term.execute_line("mkdir -p /srv/app/src").await;
    term.execute_line("cd /srv/app").await;
    term.execute_line("echo \"app.listen(3000)\" > src/server.js")
        .await;

    let run = term.execute_line("node src/server.js").await;
    assert!(run.output.contains("listening on port 3000"));

    let tests = term.execute_line("npm test").await;
    assert!(tests.output.contains("Test Suites: 3 passed"));

    let eval = term.execute_line("node -e 'console.log(3 * (2 + 5))'").await;
    assert_eq!(eval.output, "21\n");
}

#[tokio::test]
async fn curl_against_the_simulated_api() {
    let mut term = Terminal::new();
    term.execute_line("docker compose up -d").await;

    let health = term
        .execute_line("curl -s http://localhost:3000/health")
        .await;
    assert!(health.output.contains("\"status\":\"ok\""));

    let refused = term.execute_line("curl http://localhost:9999/").await;
    assert_eq!(refused.exit_code, 7);

    let saved = term
        .execute_line("curl -s -o /tmp/vehicles.json http://localhost:3000/api/v1/vehicles && wc -c /tmp/vehicles.json")
        .await;
    assert_eq!(saved.exit_code, 0);
    assert!(term.context().fs.exists("/tmp/vehicles.json", "/"));
}

fn fleet_catalog() -> Arc<ChallengeCatalog> {
    Arc::new(ChallengeCatalog {
        levels: vec![
            LevelSpec {
                level: 1,
                title: "Bring the stack up".to_string(),
                objectives: vec![
                    ObjectiveSpec {
                        id: "compose-up".to_string(),
                        title: "Start the compose project".to_string(),
                        hint: "docker compose up".to_string(),
                    },
                    ObjectiveSpec {
                        id: "health-check".to_string(),
                        title: "Verify the API health endpoint".to_string(),
                        hint: "curl localhost:3000/health".to_string(),
                    },
                ],
            },
            LevelSpec {
                level: 2,
                title: "Ship a fix".to_string(),
                objectives: vec![ObjectiveSpec {
                    id: "commit".to_string(),
                    title: "Commit your changes".to_string(),
                    hint: "git add then git commit".to_string(),
                }],
            },
        ],
    })
}

fn fleet_evaluator() -> RegexEvaluator {
    RegexEvaluator::new(vec![
        ObjectiveRule {
            id: "compose-up".to_string(),
            command_pattern: Some(Regex::new(r"docker(-compose| compose) up").unwrap()),
            requires_success: true,
            vfs_path: None,
            content_pattern: None,
        },
        ObjectiveRule {
            id: "health-check".to_string(),
            command_pattern: Some(Regex::new(r"curl .*localhost:3000/health").unwrap()),
            requires_success: true,
            vfs_path: None,
            content_pattern: None,
        },
        ObjectiveRule {
            id: "commit".to_string(),
            command_pattern: Some(Regex::new(r"git commit").unwrap()),
            requires_success: true,
            vfs_path: None,
            content_pattern: None,
        },
    ])
}

#[tokio::test]
async fn challenge_progression_through_real_commands() {
    let mut term = Terminal::builder()
        .catalog(fleet_catalog())
        .evaluator(Box::new(fleet_evaluator()))
        .rank("senior")
        .build();

    let status = term.execute_line("status").await;
    assert!(status.output.contains("senior"));
    assert!(status.output.contains("0/2 objectives"));

    let up = term.execute_line("docker compose up -d").await;
    assert!(up.output.contains("Objective complete: Start the compose project"));

    let health = term.execute_line("curl http://localhost:3000/health").await;
    assert!(health.output.contains("Objective complete: Verify the API health endpoint"));
    assert!(health.output.contains("Level 1 complete!"));

    let advance = term.execute_line("next-level").await;
    assert!(advance.is_success());
    assert_eq!(term.context().challenge.level, 2);

    term.execute_line("git add .").await;
    let commit = term.execute_line("git commit -m done").await;
    assert!(commit.output.contains("Objective complete: Commit your changes"));
}

#[tokio::test]
async fn which_and_man_cover_the_toolchain() {
    let mut term = Terminal::new();
    let which = term.execute_line("which docker").await;
    assert_eq!(which.output, "/usr/bin/docker\n");
    let man = term.execute_line("man docker").await;
    assert!(man.output.contains("DOCKER(1)"));
}

#[tokio::test]
async fn python_pipeline_mixes_with_coreutils() {
    let mut term = Terminal::new();
    let out = term
        .execute_line("python3 -c 'print(\"b\na\nb\")' | sort | uniq")
        .await;
    assert_eq!(out.output, "a\nb\n");
}
