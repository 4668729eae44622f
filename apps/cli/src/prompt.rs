//! Stdin-backed speaker prompt.

use std::io::{BufRead, Write};

use castbridge_core::SpeakerPrompt;

/// Prompts on stdout and reads the choice from stdin.
///
/// Prints the numbered speaker list once per attempt; the user may answer
/// with either the exact identifier or its list number. EOF or an empty
/// line aborts.
pub struct StdinPrompt;

impl SpeakerPrompt for StdinPrompt {
    fn pick(&self, speakers: &[String]) -> Option<String> {
        let mut stdout = std::io::stdout();
        for (index, speaker) in speakers.iter().enumerate() {
            let _ = writeln!(stdout, "  {}) {}", index + 1, speaker);
        }
        let _ = write!(stdout, "Speaker: ");
        let _ = stdout.flush();

        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line).ok()? == 0 {
            return None;
        }
        let answer = line.trim();
        if answer.is_empty() {
            return None;
        }
        // A numeric answer maps to the listed entry; anything else is taken
        // verbatim and validated by the selection flow.
        if let Ok(index) = answer.parse::<usize>() {
            if (1..=speakers.len()).contains(&index) {
                return Some(speakers[index - 1].clone());
            }
        }
        Some(answer.to_string())
    }
}
