//! Line editor.
//!
//! [`InputBuffer`] holds the line being typed, the logical cursor, and the
//! submission history. Every mutation returns the ANSI byte string the
//! terminal must echo so the rendered line stays consistent with the buffer.
//! The cursor is a character index, `0 ≤ cursor ≤ buffer chars`, always.

use crate::ansi::{cursor_left, cursor_right};

/// Outcome of a completion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Nothing to do (no candidates, or no extension possible beyond what
    /// could be listed).
    None,
    /// Bytes to echo for an in-place buffer extension.
    Inserted(String),
    /// Candidates to print on their own line; the engine must redraw the
    /// prompt and buffer afterwards.
    List(String),
}

/// Keystroke-level input buffer with history and kill operations.
#[derive(Debug, Clone, Default)]
pub struct InputBuffer {
    buffer: String,
    /// Character index, not byte index.
    cursor: usize,
    history: Vec<String>,
    /// −1 means "editing a fresh line".
    history_index: isize,
    /// Fresh-line content preserved while navigating history.
    temp_buffer: String,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    fn char_len(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_at(&self, char_idx: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(char_idx)
            .map(|(b, _)| b)
            .unwrap_or(self.buffer.len())
    }

    fn tail(&self) -> String {
        self.buffer[self.byte_at(self.cursor)..].to_string()
    }

    /// Insert a printable character at the cursor.
    pub fn insert_char(&mut self, c: char) -> String {
        let byte = self.byte_at(self.cursor);
        self.buffer.insert(byte, c);
        self.cursor += 1;
        let tail = self.tail();
        let tail_len = tail.chars().count();
        format!("{}{}{}", c, tail, cursor_left(tail_len))
    }

    /// Insert a run of printable characters.
    pub fn insert_str(&mut self, s: &str) -> String {
        s.chars().map(|c| self.insert_char(c)).collect()
    }

    /// Delete the character left of the cursor (backspace).
    pub fn backspace(&mut self) -> String {
        if self.cursor == 0 {
            return String::new();
        }
        self.cursor -= 1;
        let byte = self.byte_at(self.cursor);
        self.buffer.remove(byte);
        let tail = self.tail();
        let tail_len = tail.chars().count();
        format!("\x1b[D{} {}", tail, cursor_left(tail_len + 1))
    }

    /// Delete the character under the cursor (ESC[3~).
    pub fn delete(&mut self) -> String {
        if self.cursor >= self.char_len() {
            return String::new();
        }
        let byte = self.byte_at(self.cursor);
        self.buffer.remove(byte);
        let tail = self.tail();
        let tail_len = tail.chars().count();
        format!("{} {}", tail, cursor_left(tail_len + 1))
    }

    pub fn move_left(&mut self) -> String {
        if self.cursor == 0 {
            return String::new();
        }
        self.cursor -= 1;
        "\x1b[D".to_string()
    }

    pub fn move_right(&mut self) -> String {
        if self.cursor >= self.char_len() {
            return String::new();
        }
        self.cursor += 1;
        "\x1b[C".to_string()
    }

    pub fn move_home(&mut self) -> String {
        let n = self.cursor;
        self.cursor = 0;
        cursor_left(n)
    }

    pub fn move_end(&mut self) -> String {
        let n = self.char_len() - self.cursor;
        self.cursor = self.char_len();
        cursor_right(n)
    }

    /// Kill from the cursor to end of line (Ctrl-K).
    pub fn kill_to_end(&mut self) -> String {
        let tail_len = self.char_len() - self.cursor;
        if tail_len == 0 {
            return String::new();
        }
        let byte = self.byte_at(self.cursor);
        self.buffer.truncate(byte);
        format!("{}{}", " ".repeat(tail_len), cursor_left(tail_len))
    }

    /// Kill from beginning of line to the cursor (Ctrl-U).
    pub fn kill_to_start(&mut self) -> String {
        if self.cursor == 0 {
            return String::new();
        }
        let removed = self.cursor;
        let byte = self.byte_at(self.cursor);
        self.buffer = self.buffer[byte..].to_string();
        self.cursor = 0;
        let tail_len = self.buffer.chars().count();
        format!(
            "{}{}{}{}",
            cursor_left(removed),
            self.buffer,
            " ".repeat(removed),
            cursor_left(tail_len + removed)
        )
    }

    /// Delete the word before the cursor (Ctrl-W): skip trailing spaces,
    /// then a run of non-spaces.
    pub fn delete_word(&mut self) -> String {
        let chars: Vec<char> = self.buffer.chars().collect();
        let mut start = self.cursor;
        while start > 0 && chars[start - 1] == ' ' {
            start -= 1;
        }
        while start > 0 && chars[start - 1] != ' ' {
            start -= 1;
        }
        let removed = self.cursor - start;
        if removed == 0 {
            return String::new();
        }
        let start_byte = self.byte_at(start);
        let cursor_byte = self.byte_at(self.cursor);
        self.buffer.replace_range(start_byte..cursor_byte, "");
        self.cursor = start;
        let tail = self.tail();
        let tail_len = tail.chars().count();
        format!(
            "{}{}{}{}",
            cursor_left(removed),
            tail,
            " ".repeat(removed),
            cursor_left(tail_len + removed)
        )
    }

    /// Replace the displayed line with `new`, leaving the cursor at its end.
    fn replace_line(&mut self, new: &str) -> String {
        let old_len = self.char_len();
        let old_cursor = self.cursor;
        let new_len = new.chars().count();
        let mut echo = cursor_left(old_cursor);
        echo.push_str(new);
        if old_len > new_len {
            let surplus = old_len - new_len;
            echo.push_str(&" ".repeat(surplus));
            echo.push_str(&cursor_left(surplus));
        }
        self.buffer = new.to_string();
        self.cursor = new_len;
        echo
    }

    /// History up-arrow. The first press stashes the fresh line.
    pub fn history_up(&mut self) -> String {
        if self.history.is_empty() {
            return String::new();
        }
        let next_index = if self.history_index < 0 {
            self.temp_buffer = self.buffer.clone();
            self.history.len() as isize - 1
        } else if self.history_index > 0 {
            self.history_index - 1
        } else {
            return String::new();
        };
        self.history_index = next_index;
        let entry = self.history[next_index as usize].clone();
        self.replace_line(&entry)
    }

    /// History down-arrow; arrowing past the newest entry restores the
    /// stashed fresh line.
    pub fn history_down(&mut self) -> String {
        if self.history_index < 0 {
            return String::new();
        }
        if (self.history_index as usize) < self.history.len() - 1 {
            self.history_index += 1;
            let entry = self.history[self.history_index as usize].clone();
            self.replace_line(&entry)
        } else {
            self.history_index = -1;
            let fresh = self.temp_buffer.clone();
            self.replace_line(&fresh)
        }
    }

    /// Submit the line: push the trimmed content to history when non-empty,
    /// reset editing state, and return the raw line (heredoc bodies keep
    /// their indentation).
    pub fn submit(&mut self) -> String {
        let raw = std::mem::take(&mut self.buffer);
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            self.history.push(trimmed.to_string());
        }
        self.cursor = 0;
        self.history_index = -1;
        self.temp_buffer.clear();
        raw
    }

    /// Record an externally executed command in history, as if it had been
    /// typed and submitted.
    pub fn push_history(&mut self, command: &str) {
        let trimmed = command.trim();
        if !trimmed.is_empty() {
            self.history.push(trimmed.to_string());
        }
    }

    /// Abandon the current line (Ctrl-C). The engine echoes `^C` and a new
    /// prompt.
    pub fn abandon(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.history_index = -1;
        self.temp_buffer.clear();
    }

    /// The whitespace-split fragment immediately before the cursor, and
    /// whether it is the first token of the buffer (command position).
    pub fn partial_before_cursor(&self) -> (String, bool) {
        let byte = self.byte_at(self.cursor);
        let before = &self.buffer[..byte];
        let partial = before.rsplit(' ').next().unwrap_or("").to_string();
        let leading = before[..before.len() - partial.len()].trim();
        (partial, leading.is_empty())
    }

    /// Apply the completion policy for `candidates` of the current partial:
    /// one candidate completes (plus a trailing space unless it names a
    /// directory); several extend to the longest common prefix, or are
    /// returned for listing when no extension is possible.
    pub fn apply_completion(&mut self, candidates: &[String]) -> Completion {
        if candidates.is_empty() {
            return Completion::None;
        }
        let (partial, _) = self.partial_before_cursor();
        let component = partial.rsplit('/').next().unwrap_or("");

        if candidates.len() == 1 {
            let candidate = &candidates[0];
            let Some(suffix) = candidate.strip_prefix(component) else {
                return Completion::None;
            };
            let mut echo = self.insert_str(suffix);
            if !candidate.ends_with('/') {
                echo.push_str(&self.insert_char(' '));
            }
            return Completion::Inserted(echo);
        }

        let prefix = longest_common_prefix(candidates);
        if prefix.chars().count() > component.chars().count() {
            let suffix = prefix[component.len()..].to_string();
            return Completion::Inserted(self.insert_str(&suffix));
        }
        Completion::List(format!("\r\n{}\r\n", candidates.join("  ")))
    }
}

fn longest_common_prefix(candidates: &[String]) -> String {
    let Some(first) = candidates.first() else {
        return String::new();
    };
    let mut prefix = first.clone();
    for candidate in &candidates[1..] {
        let common: usize = prefix
            .chars()
            .zip(candidate.chars())
            .take_while(|(a, b)| a == b)
            .count();
        prefix = prefix.chars().take(common).collect();
        if prefix.is_empty() {
            break;
        }
    }
    prefix
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn type_str(editor: &mut InputBuffer, s: &str) {
        for c in s.chars() {
            editor.insert_char(c);
        }
    }

    #[test]
    fn insert_at_end_echoes_char_only() {
        let mut editor = InputBuffer::new();
        assert_eq!(editor.insert_char('a'), "a");
        assert_eq!(editor.insert_char('b'), "b");
        assert_eq!(editor.buffer(), "ab");
        assert_eq!(editor.cursor(), 2);
    }

    #[test]
    fn insert_mid_line_rewrites_tail() {
        let mut editor = InputBuffer::new();
        type_str(&mut editor, "ac");
        editor.move_left();
        let echo = editor.insert_char('b');
        assert_eq!(editor.buffer(), "abc");
        assert_eq!(editor.cursor(), 2);
        assert_eq!(echo, "bc\x1b[D");
    }

    #[test]
    fn backspace_at_start_is_noop() {
        let mut editor = InputBuffer::new();
        assert_eq!(editor.backspace(), "");
        assert_eq!(editor.cursor(), 0);
    }

    #[test]
    fn backspace_mid_line() {
        let mut editor = InputBuffer::new();
        type_str(&mut editor, "abc");
        editor.move_left();
        let echo = editor.backspace();
        assert_eq!(editor.buffer(), "ac");
        assert_eq!(editor.cursor(), 1);
        assert_eq!(echo, "\x1b[Dc \x1b[2D");
    }

    #[test]
    fn delete_under_cursor() {
        let mut editor = InputBuffer::new();
        type_str(&mut editor, "abc");
        editor.move_home();
        let echo = editor.delete();
        assert_eq!(editor.buffer(), "bc");
        assert_eq!(editor.cursor(), 0);
        assert_eq!(echo, "bc \x1b[3D");
    }

    #[test]
    fn cursor_motion_is_bounded() {
        let mut editor = InputBuffer::new();
        type_str(&mut editor, "ab");
        assert_eq!(editor.move_right(), "");
        editor.move_home();
        assert_eq!(editor.move_left(), "");
        assert_eq!(editor.move_end(), "\x1b[2C");
        assert_eq!(editor.cursor(), 2);
    }

    #[test]
    fn kill_to_end_truncates() {
        let mut editor = InputBuffer::new();
        type_str(&mut editor, "hello world");
        for _ in 0..5 {
            editor.move_left();
        }
        let echo = editor.kill_to_end();
        assert_eq!(editor.buffer(), "hello ");
        assert_eq!(echo, "     \x1b[5D");
    }

    #[test]
    fn kill_to_start_keeps_tail() {
        let mut editor = InputBuffer::new();
        type_str(&mut editor, "abcdef");
        for _ in 0..2 {
            editor.move_left();
        }
        editor.kill_to_start();
        assert_eq!(editor.buffer(), "ef");
        assert_eq!(editor.cursor(), 0);
    }

    #[test]
    fn delete_word_skips_spaces_then_word() {
        let mut editor = InputBuffer::new();
        type_str(&mut editor, "git commit  ");
        editor.delete_word();
        assert_eq!(editor.buffer(), "git ");
        assert_eq!(editor.cursor(), 4);

        editor.delete_word();
        assert_eq!(editor.buffer(), "");
    }

    #[test]
    fn delete_word_on_empty_is_noop() {
        let mut editor = InputBuffer::new();
        assert_eq!(editor.delete_word(), "");
    }

    #[test]
    fn submit_returns_raw_line_and_records_trimmed() {
        let mut editor = InputBuffer::new();
        type_str(&mut editor, "  ls -la  ");
        let command = editor.submit();
        assert_eq!(command, "  ls -la  ");
        assert_eq!(editor.history(), &["ls -la".to_string()]);
        assert_eq!(editor.buffer(), "");
        assert_eq!(editor.cursor(), 0);
    }

    #[test]
    fn empty_submit_not_recorded() {
        let mut editor = InputBuffer::new();
        type_str(&mut editor, "   ");
        assert_eq!(editor.submit(), "   ");
        assert!(editor.history().is_empty());
    }

    #[test]
    fn duplicate_history_entries_allowed() {
        let mut editor = InputBuffer::new();
        type_str(&mut editor, "pwd");
        editor.submit();
        type_str(&mut editor, "pwd");
        editor.submit();
        assert_eq!(editor.history().len(), 2);
    }

    #[test]
    fn history_navigation_round_trip() {
        let mut editor = InputBuffer::new();
        type_str(&mut editor, "ls");
        editor.submit();
        type_str(&mut editor, "pwd");
        editor.submit();

        type_str(&mut editor, "par");
        editor.history_up();
        assert_eq!(editor.buffer(), "pwd");
        editor.history_up();
        assert_eq!(editor.buffer(), "ls");
        editor.history_down();
        assert_eq!(editor.buffer(), "pwd");
        editor.history_down();
        // Back past the newest entry restores the fresh line.
        assert_eq!(editor.buffer(), "par");
    }

    #[test]
    fn history_up_at_oldest_stays() {
        let mut editor = InputBuffer::new();
        type_str(&mut editor, "only");
        editor.submit();
        editor.history_up();
        assert_eq!(editor.history_up(), "");
        assert_eq!(editor.buffer(), "only");
    }

    #[test]
    fn block_insert_equals_keystrokes() {
        let mut a = InputBuffer::new();
        let mut b = InputBuffer::new();
        for c in "docker compose up -d".chars() {
            a.insert_char(c);
        }
        b.insert_str("docker compose up -d");
        assert_eq!(a.buffer(), b.buffer());
        assert_eq!(a.cursor(), b.cursor());
    }

    #[test]
    fn cursor_invariant_over_mixed_ops() {
        let mut editor = InputBuffer::new();
        type_str(&mut editor, "abc def");
        for _ in 0..20 {
            editor.move_left();
        }
        editor.delete_word();
        editor.backspace();
        editor.delete();
        editor.move_end();
        editor.kill_to_start();
        assert!(editor.cursor() <= editor.buffer().chars().count());
    }

    #[test]
    fn partial_before_cursor_detects_command_position() {
        let mut editor = InputBuffer::new();
        type_str(&mut editor, "gi");
        let (partial, first) = editor.partial_before_cursor();
        assert_eq!(partial, "gi");
        assert!(first);

        let mut editor = InputBuffer::new();
        type_str(&mut editor, "cat src/ma");
        let (partial, first) = editor.partial_before_cursor();
        assert_eq!(partial, "src/ma");
        assert!(!first);
    }

    #[test]
    fn completion_single_candidate_appends_space() {
        let mut editor = InputBuffer::new();
        type_str(&mut editor, "gi");
        let result = editor.apply_completion(&["git".to_string()]);
        assert!(matches!(result, Completion::Inserted(_)));
        assert_eq!(editor.buffer(), "git ");
    }

    #[test]
    fn completion_directory_gets_no_space() {
        let mut editor = InputBuffer::new();
        type_str(&mut editor, "cd sr");
        let result = editor.apply_completion(&["src/".to_string()]);
        assert!(matches!(result, Completion::Inserted(_)));
        assert_eq!(editor.buffer(), "cd src/");
    }

    #[test]
    fn completion_extends_to_common_prefix() {
        let mut editor = InputBuffer::new();
        type_str(&mut editor, "cat se");
        let candidates = vec!["server.js".to_string(), "service.js".to_string()];
        let result = editor.apply_completion(&candidates);
        assert!(matches!(result, Completion::Inserted(_)));
        assert_eq!(editor.buffer(), "cat serv");
    }

    #[test]
    fn completion_lists_when_no_extension() {
        let mut editor = InputBuffer::new();
        type_str(&mut editor, "cat serv");
        let candidates = vec!["server.js".to_string(), "service.js".to_string()];
        match editor.apply_completion(&candidates) {
            Completion::List(listing) => {
                assert!(listing.contains("server.js  service.js"));
            }
            other => panic!("expected listing, got {:?}", other),
        }
        assert_eq!(editor.buffer(), "cat serv");
    }

    #[test]
    fn completion_no_candidates_is_noop() {
        let mut editor = InputBuffer::new();
        type_str(&mut editor, "xy");
        assert_eq!(editor.apply_completion(&[]), Completion::None);
        assert_eq!(editor.buffer(), "xy");
    }

    #[test]
    fn completion_nested_path_component() {
        let mut editor = InputBuffer::new();
        type_str(&mut editor, "cat src/ma");
        let result = editor.apply_completion(&["main.js".to_string()]);
        assert!(matches!(result, Completion::Inserted(_)));
        assert_eq!(editor.buffer(), "cat src/main.js ");
    }

    #[test]
    fn longest_common_prefix_cases() {
        let candidates = vec!["server.js".to_string(), "service.js".to_string()];
        assert_eq!(longest_common_prefix(&candidates), "serv");
        let nothing = vec!["alpha".to_string(), "beta".to_string()];
        assert_eq!(longest_common_prefix(&nothing), "");
    }
}
