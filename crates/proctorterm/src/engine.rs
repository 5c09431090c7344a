//! Terminal engine: the glue that owns everything.
//!
//! [`Terminal`] owns the VFS (through the context), registry, parser,
//! executor, line editor and recorder. Input arrives as a byte string from
//! the widget; the engine walks it, dispatching CSI escape sequences,
//! control chords, line submission and printables. Output flows back as
//! xterm-compatible bytes (`\n` normalised to `\r\n`) and, when installed,
//! through the host's output sink.
//!
//! The engine is single-threaded and cooperative: a command runs to
//! completion before the next input byte is looked at, and any input that
//! arrives while the `processing` flag is up is discarded.

use regex::Regex;

use crate::ansi::{self, cursor_left, BLUE, GREEN, RESET, YELLOW};
use crate::challenge::ObjectiveEvaluator;
use crate::commands::{CmdOutput, Registry};
use crate::context::CommandContext;
use crate::editor::{Completion, InputBuffer};
use crate::events::{EventKind, KeyMeta, SessionEvent};
use crate::executor;
use crate::parser::{self, OutputRedirect};
use crate::recorder::EventRecorder;

/// Per-write callback for the host's terminal widget.
pub type OutputSink = Box<dyn FnMut(&str) + Send>;

/// Source of tab-completion candidates. The engine installs
/// [`ShellCompleter`] by default; hosts may swap in their own.
pub trait CompletionProvider: Send {
    /// Candidates for `partial`. `at_command` is true when the partial is
    /// the first token of the buffer.
    fn complete(&self, partial: &str, at_command: bool, ctx: &CommandContext) -> Vec<String>;
}

/// Default completion: command names at command position, VFS paths
/// elsewhere.
pub struct ShellCompleter {
    commands: Vec<String>,
}

impl ShellCompleter {
    pub fn new(commands: Vec<String>) -> Self {
        Self { commands }
    }
}

impl CompletionProvider for ShellCompleter {
    fn complete(&self, partial: &str, at_command: bool, ctx: &CommandContext) -> Vec<String> {
        if at_command {
            self.commands
                .iter()
                .filter(|name| name.starts_with(partial))
                .cloned()
                .collect()
        } else {
            ctx.fs.complete_path(partial, &ctx.cwd)
        }
    }
}

struct HeredocState {
    tag: String,
    lines: Vec<String>,
    redirect: Option<OutputRedirect>,
}

/// The emulator core: owns all state, consumes input bytes, produces output
/// bytes and session events.
pub struct Terminal {
    registry: Registry,
    ctx: CommandContext,
    editor: InputBuffer,
    recorder: EventRecorder,
    completer: Box<dyn CompletionProvider>,
    evaluator: Option<Box<dyn ObjectiveEvaluator>>,
    output_sink: Option<OutputSink>,
    heredoc: Option<HeredocState>,
    processing: bool,
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal {
    /// A terminal with the default registry, filesystem and identity.
    pub fn new() -> Self {
        let registry = Registry::with_defaults();
        let completer = Box::new(ShellCompleter::new(registry.names()));
        Self {
            registry,
            ctx: CommandContext::new(),
            editor: InputBuffer::new(),
            recorder: EventRecorder::new(),
            completer,
            evaluator: None,
            output_sink: None,
            heredoc: None,
            processing: false,
        }
    }

    pub(crate) fn assemble(
        registry: Registry,
        ctx: CommandContext,
        evaluator: Option<Box<dyn ObjectiveEvaluator>>,
        completer: Option<Box<dyn CompletionProvider>>,
        output_sink: Option<OutputSink>,
    ) -> Self {
        let completer =
            completer.unwrap_or_else(|| Box::new(ShellCompleter::new(registry.names())));
        Self {
            registry,
            ctx,
            editor: InputBuffer::new(),
            recorder: EventRecorder::new(),
            completer,
            evaluator,
            output_sink,
            heredoc: None,
            processing: false,
        }
    }

    // --- accessors ---

    pub fn context(&self) -> &CommandContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut CommandContext {
        &mut self.ctx
    }

    pub fn recorder(&self) -> &EventRecorder {
        &self.recorder
    }

    pub fn recorder_mut(&mut self) -> &mut EventRecorder {
        &mut self.recorder
    }

    pub fn editor(&self) -> &InputBuffer {
        &self.editor
    }

    /// Snapshot of the session event log.
    pub fn events(&self) -> Vec<SessionEvent> {
        self.recorder.get_events()
    }

    /// Swap in a host-supplied objective evaluator.
    pub fn set_evaluator(&mut self, evaluator: Box<dyn ObjectiveEvaluator>) {
        self.evaluator = Some(evaluator);
    }

    /// Install the per-write output sink.
    pub fn set_output_sink(&mut self, sink: OutputSink) {
        self.output_sink = Some(sink);
    }

    /// Stop timers and flush pending events.
    pub fn stop(&mut self) {
        self.recorder.stop();
    }

    // --- output plumbing ---

    fn send(&mut self, bytes: &str) {
        if bytes.is_empty() {
            return;
        }
        if let Some(sink) = &mut self.output_sink {
            sink(bytes);
        }
    }

    /// The shell prompt: `user@host:cwd$ ` with home abbreviated to `~`.
    pub fn prompt(&self) -> String {
        format!(
            "{}{}@{}{}:{}{}{}$ ",
            GREEN,
            self.ctx.user,
            self.ctx.hostname,
            RESET,
            BLUE,
            self.ctx.display_cwd(),
            RESET
        )
    }

    /// Print the welcome banner and the first prompt; starts the recorder's
    /// flush timer when a runtime is available.
    pub fn boot(&mut self) -> String {
        if tokio::runtime::Handle::try_current().is_ok() {
            self.recorder.start();
        }
        let banner = format!(
            "{}FleetCore assessment workspace{}\r\n\
             Type 'help' for available commands, 'status' for your objectives.\r\n\
             \r\n",
            YELLOW, RESET
        );
        self.recorder.record(EventKind::Output {
            content: banner.clone(),
        });
        let out = format!("{}{}", banner, self.prompt());
        self.send(&out);
        out
    }

    // --- event helpers ---

    fn record_key(&self, key: &str, meta: KeyMeta) {
        self.recorder.record(EventKind::Key {
            key: key.to_string(),
            meta,
        });
    }

    fn record_plain_key(&self, key: &str) {
        self.record_key(key, KeyMeta::default());
    }

    /// Record a focus change from the widget.
    pub fn focus_changed(&mut self, focused: bool) {
        self.recorder.record(EventKind::FocusChange { focused });
    }

    /// Record a terminal resize from the widget.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.recorder.record(EventKind::Resize { cols, rows });
    }

    // --- input walking ---

    /// Consume a chunk of input bytes from the widget, returning the echo
    /// and output bytes to render. Input arriving while a command is being
    /// processed is discarded.
    pub async fn process_input(&mut self, input: &str) -> String {
        if self.processing {
            return String::new();
        }
        let mut out = String::new();
        let chars: Vec<char> = input.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            match c {
                '\x1b' => {
                    i += self.handle_escape(&chars[i..], &mut out);
                }
                '\r' | '\n' => {
                    // Treat CRLF as one submission.
                    if c == '\r' && chars.get(i + 1) == Some(&'\n') {
                        i += 1;
                    }
                    self.record_plain_key("Enter");
                    let enter = self.handle_enter().await;
                    out.push_str(&enter);
                    i += 1;
                }
                '\x7f' | '\x08' => {
                    self.record_plain_key("Backspace");
                    out.push_str(&self.editor.backspace());
                    i += 1;
                }
                '\t' => {
                    self.record_plain_key("Tab");
                    let completion = self.handle_tab();
                    out.push_str(&completion);
                    i += 1;
                }
                '\x01' => {
                    self.record_key("a", KeyMeta::ctrl());
                    out.push_str(&self.editor.move_home());
                    i += 1;
                }
                '\x05' => {
                    self.record_key("e", KeyMeta::ctrl());
                    out.push_str(&self.editor.move_end());
                    i += 1;
                }
                '\x0b' => {
                    self.record_key("k", KeyMeta::ctrl());
                    out.push_str(&self.editor.kill_to_end());
                    i += 1;
                }
                '\x15' => {
                    self.record_key("u", KeyMeta::ctrl());
                    out.push_str(&self.editor.kill_to_start());
                    i += 1;
                }
                '\x17' => {
                    self.record_key("w", KeyMeta::ctrl());
                    out.push_str(&self.editor.delete_word());
                    i += 1;
                }
                '\x03' => {
                    self.record_key("c", KeyMeta::ctrl());
                    self.editor.abandon();
                    self.heredoc = None;
                    out.push_str("^C\r\n");
                    out.push_str(&self.prompt());
                    i += 1;
                }
                '\x0c' => {
                    self.record_key("l", KeyMeta::ctrl());
                    out.push_str(ansi::CLEAR_SCREEN);
                    out.push_str(&self.prompt());
                    out.push_str(self.editor.buffer());
                    let back = self.editor.buffer().chars().count() - self.editor.cursor();
                    out.push_str(&cursor_left(back));
                    i += 1;
                }
                '\x04' => {
                    // Ctrl-D: no-op on empty, ignored otherwise.
                    self.record_key("d", KeyMeta::ctrl());
                    i += 1;
                }
                c if !c.is_control() => {
                    self.record_plain_key(&c.to_string());
                    out.push_str(&self.editor.insert_char(c));
                    i += 1;
                }
                _ => {
                    // Unrecognised control bytes are swallowed.
                    i += 1;
                }
            }
        }
        self.send(&out);
        out
    }

    /// Dispatch one escape sequence starting at `chars[0] == ESC`; returns
    /// how many chars were consumed. Lookahead is bounded: only the known
    /// CSI finals `A B C D H F` and `3~` are recognised, everything else is
    /// swallowed.
    fn handle_escape(&mut self, chars: &[char], out: &mut String) -> usize {
        if chars.get(1) != Some(&'[') {
            return 1;
        }
        match chars.get(2) {
            Some('A') => {
                self.record_plain_key("ArrowUp");
                out.push_str(&self.editor.history_up());
                3
            }
            Some('B') => {
                self.record_plain_key("ArrowDown");
                out.push_str(&self.editor.history_down());
                3
            }
            Some('C') => {
                self.record_plain_key("ArrowRight");
                out.push_str(&self.editor.move_right());
                3
            }
            Some('D') => {
                self.record_plain_key("ArrowLeft");
                out.push_str(&self.editor.move_left());
                3
            }
            Some('H') => {
                self.record_plain_key("Home");
                out.push_str(&self.editor.move_home());
                3
            }
            Some('F') => {
                self.record_plain_key("End");
                out.push_str(&self.editor.move_end());
                3
            }
            Some('3') if chars.get(3) == Some(&'~') => {
                self.record_plain_key("Delete");
                out.push_str(&self.editor.delete());
                4
            }
            Some(_) => 3,
            None => 2,
        }
    }

    fn handle_tab(&mut self) -> String {
        let (partial, at_command) = self.editor.partial_before_cursor();
        let candidates = self.completer.complete(&partial, at_command, &self.ctx);
        match self.editor.apply_completion(&candidates) {
            Completion::None => String::new(),
            Completion::Inserted(echo) => echo,
            Completion::List(listing) => {
                let mut out = listing;
                out.push_str(&self.prompt());
                out.push_str(self.editor.buffer());
                let back = self.editor.buffer().chars().count() - self.editor.cursor();
                out.push_str(&cursor_left(back));
                out
            }
        }
    }

    // --- submission ---

    /// Heredoc opener: `<< TAG`, `<< "TAG"`, `<< 'TAG'`.
    fn heredoc_tag(line: &str) -> Option<String> {
        let re = Regex::new(r#"<<\s*['"]?(\w+)['"]?"#).ok()?;
        re.captures(line)
            .map(|captures| captures[1].to_string())
    }

    async fn handle_enter(&mut self) -> String {
        let mut out = "\r\n".to_string();
        let raw_line = self.editor.submit();
        let line = raw_line.trim().to_string();

        // Heredoc continuation?
        if self.heredoc.is_some() {
            let terminates = self
                .heredoc
                .as_ref()
                .is_some_and(|heredoc| heredoc.tag == line);
            if terminates {
                let state = match self.heredoc.take() {
                    Some(state) => state,
                    None => return out,
                };
                if let Some(redirect) = state.redirect {
                    let mut content = state.lines.join("\n");
                    content.push('\n');
                    let path = self.ctx.expand_path(&redirect.path);
                    let result = if redirect.append {
                        self.ctx.fs.append_file(&path, &self.ctx.cwd, &content)
                    } else {
                        self.ctx.fs.write_file(&path, &self.ctx.cwd, &content)
                    };
                    if result.is_err() {
                        out.push_str(&format!("-bash: {}: No such file or directory\r\n", path));
                    }
                }
                out.push_str(&self.prompt());
            } else if let Some(heredoc) = &mut self.heredoc {
                // Body lines keep their indentation.
                heredoc.lines.push(raw_line);
                out.push_str("> ");
            }
            return out;
        }

        if line.is_empty() {
            out.push_str(&self.prompt());
            return out;
        }

        // Heredoc opener?
        if let Some(tag) = Self::heredoc_tag(&line) {
            let parsed = parser::parse_line(&line);
            let redirect = parsed
                .commands
                .first()
                .and_then(|cmd| cmd.output_redirect.clone());
            self.heredoc = Some(HeredocState {
                tag,
                lines: Vec::new(),
                redirect,
            });
            out.push_str("> ");
            return out;
        }

        let result = self.run_and_hook(&line).await;
        out.push_str(&normalize_newlines(&result.output));
        out.push_str(&self.prompt());
        out
    }

    /// Execute one raw line with full session bookkeeping: history mirror,
    /// command event, objective hook, challenge-delta events and banners.
    /// This is also the host/CLI entry point for driving the engine without
    /// a byte stream.
    pub async fn execute_line(&mut self, raw: &str) -> CmdOutput {
        let raw = raw.trim();
        if raw.is_empty() {
            return CmdOutput::ok("");
        }
        self.editor.push_history(raw);
        self.run_and_hook(raw).await
    }

    async fn run_and_hook(&mut self, raw: &str) -> CmdOutput {
        self.processing = true;
        self.ctx.history = self.editor.history().to_vec();

        let before_completed = self.ctx.challenge.completed.clone();
        let before_hints = self.ctx.challenge.hints_used.clone();
        let before_level = self.ctx.challenge.level;
        let level_was_complete = self
            .ctx
            .challenge
            .level_complete(&self.ctx.catalog, before_level);

        let mut result = executor::run_line(&self.registry, &mut self.ctx, raw).await;
        self.recorder.record(EventKind::Command {
            raw: raw.to_string(),
            exit_code: result.exit_code,
        });
        if !result.output.is_empty() {
            self.recorder.record(EventKind::Output {
                content: result.output.clone(),
            });
        }

        // Objective hook: the host evaluator sees the post-command state.
        if let Some(evaluator) = &self.evaluator {
            for id in evaluator.evaluate(&self.ctx, raw, result.exit_code) {
                self.ctx.challenge.completed.insert(id);
            }
        }

        // Challenge-delta bookkeeping covers both evaluator- and
        // handler-driven transitions (submit, hint, next-level).
        let mut banners = String::new();
        let catalog = self.ctx.catalog.clone();
        let mut newly_completed: Vec<String> = self
            .ctx
            .challenge
            .completed
            .difference(&before_completed)
            .cloned()
            .collect();
        newly_completed.sort();
        for id in &newly_completed {
            self.recorder.record(EventKind::Output {
                content: format!("objective_complete:{}", id),
            });
            self.recorder
                .record(EventKind::ObjectiveComplete { id: id.clone() });
            let title = catalog
                .level(self.ctx.challenge.level)
                .and_then(|level| level.objectives.iter().find(|o| &o.id == id))
                .map(|o| o.title.as_str())
                .unwrap_or(id.as_str());
            banners.push_str(&format!(
                "\n{}✔ Objective complete: {}{}\n",
                GREEN, title, RESET
            ));
        }
        let mut new_hints: Vec<String> = self
            .ctx
            .challenge
            .hints_used
            .difference(&before_hints)
            .cloned()
            .collect();
        new_hints.sort();
        for id in new_hints {
            self.recorder.record(EventKind::HintUsed { id });
        }
        if self.ctx.challenge.level != before_level {
            self.recorder.record(EventKind::LevelAdvance {
                level: self.ctx.challenge.level,
            });
        } else if !level_was_complete
            && self
                .ctx
                .challenge
                .level_complete(&catalog, self.ctx.challenge.level)
        {
            banners.push_str(&format!(
                "\n{}Level {} complete! Type 'next-level' to continue.{}\n",
                YELLOW, self.ctx.challenge.level, RESET
            ));
        }
        if !banners.is_empty() {
            self.recorder.record(EventKind::Output {
                content: banners.clone(),
            });
            result.output.push_str(&banners);
        }

        self.processing = false;
        result
    }

    // --- paste ---

    /// Feed pasted text in. Control characters other than `\n`, `\r`, `\t`
    /// are stripped; single-line pastes go through the input buffer,
    /// multi-line pastes execute line by line as if typed and submitted.
    pub async fn paste(&mut self, content: &str) -> String {
        if self.processing {
            return String::new();
        }
        let filtered: String = content
            .chars()
            .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
            .collect();

        let detected_by = self.recorder.classify_clipboard_paste();
        self.recorder.record(EventKind::Paste {
            content: filtered.clone(),
            detected_by,
        });

        let mut out = String::new();
        if !filtered.contains('\n') {
            out.push_str(&self.editor.insert_str(&filtered));
            self.send(&out);
            return out;
        }

        let normalized = filtered.replace("\r\n", "\n").replace('\r', "\n");
        let ends_with_newline = normalized.ends_with('\n');
        let lines: Vec<&str> = normalized.split('\n').collect();
        let last = lines.len() - 1;
        for (i, line) in lines.iter().enumerate() {
            if i == last {
                // Content after the final newline stays in the buffer,
                // exactly as if it had been typed without Enter.
                if !ends_with_newline && !line.is_empty() {
                    out.push_str(&self.editor.insert_str(line));
                }
                break;
            }
            out.push_str(&self.editor.insert_str(line));
            let enter = self.handle_enter().await;
            out.push_str(&enter);
        }
        self.send(&out);
        out
    }
}

/// Handlers emit `\n`; the widget wants `\r\n`.
pub(crate) fn normalize_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\n', "\r\n")
}
