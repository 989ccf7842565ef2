// Copyright 2024 The Subsplit Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Legacy (`git_compat == 1`) commit message normalization, matching the
//! subject/body split git versions before 1.8.2 performed themselves.

use once_cell::sync::Lazy;
use regex::Regex;

static SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n\r\n|\n\n").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\r?\n").unwrap());

/// Rewrites `message` as `subject + "\n\n" + body`, where the subject is
/// everything up to the first blank line with internal newlines
/// collapsed to single spaces and trailing spaces trimmed, and the body
/// is the remainder with any leading run of `\r`/`\n` stripped.
pub fn normalize_legacy(message: &str) -> String {
    let (raw_subject, raw_body) = match SPLIT.find(message) {
        Some(m) => (&message[..m.start()], &message[m.end()..]),
        None => (message, ""),
    };
    let collapsed = WHITESPACE_RUN.replace_all(raw_subject, " ");
    let subject = collapsed.trim_end_matches(' ');
    let body = raw_body.trim_start_matches(['\r', '\n']);
    format!("{subject}\n\n{body}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_blank_line() {
        let msg = "Add feature\n\nLonger description.\n";
        assert_eq!(normalize_legacy(msg), "Add feature\n\nLonger description.\n");
    }

    #[test]
    fn collapses_wrapped_subject_lines() {
        let msg = "Add a very\nlong subject line\n\nBody text";
        assert_eq!(normalize_legacy(msg), "Add a very long subject line\n\nBody text");
    }

    #[test]
    fn trims_trailing_spaces_on_subject() {
        let msg = "Trailing spaces   \n\nBody";
        assert_eq!(normalize_legacy(msg), "Trailing spaces\n\nBody");
    }

    #[test]
    fn strips_leading_crlf_from_body() {
        let msg = "Subject\r\n\r\n\r\nBody after crlf";
        assert_eq!(normalize_legacy(msg), "Subject\n\nBody after crlf");
    }

    #[test]
    fn strips_entire_leading_newline_run_from_body() {
        let msg = "Subject\n\n\nBody";
        assert_eq!(normalize_legacy(msg), "Subject\n\nBody");
    }

    #[test]
    fn no_blank_line_means_whole_message_is_subject() {
        let msg = "Just a subject, no body";
        assert_eq!(normalize_legacy(msg), "Just a subject, no body\n\n");
    }
}
