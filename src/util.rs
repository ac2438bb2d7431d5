//! Small utility helpers used across modules.

use lazy_static::lazy_static;
use regex::Regex;

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Cut `s` to at most `max_chars` characters, appending "..." when cut.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
  match s.char_indices().nth(max_chars) {
    Some((byte_idx, _)) => format!("{}...", &s[..byte_idx]),
    None => s.to_string(),
  }
}

lazy_static! {
  static ref PREAMBLE_RE: Regex =
    Regex::new(r"(?i)^(Here's|Here is|This is|The following is)\s+(a\s+)?(summary|text|content)[^:]*:\s*")
      .expect("valid preamble regex");
  static ref SUMMARY_LABEL_RE: Regex = Regex::new(r"(?i)^Summary:\s*").expect("valid summary label regex");
}

/// Drop chatty lead-ins such as "Here's a summary of the text:" or
/// "Summary:" that models put in front of the actual summary.
pub fn strip_summary_preamble(raw: &str) -> String {
  let s = PREAMBLE_RE.replace(raw.trim(), "");
  let s = SUMMARY_LABEL_RE.replace(&s, "");
  s.trim().to_string()
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge model replies.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) {
    cut -= 1;
  }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fills_placeholders() {
    assert_eq!(fill_template("{a} and {b} and {a}", &[("a", "x"), ("b", "y")]), "x and y and x");
  }

  #[test]
  fn truncates_on_char_boundary() {
    assert_eq!(truncate_chars("héllo wörld", 5), "héllo...");
    assert_eq!(truncate_chars("short", 5), "short");
    assert_eq!(truncate_chars("", 3), "");
  }

  #[test]
  fn strips_preambles() {
    assert_eq!(strip_summary_preamble("Here's a summary of the article:\nCells divide."), "Cells divide.");
    assert_eq!(strip_summary_preamble("This is content condensed for you: Cells divide."), "Cells divide.");
    assert_eq!(strip_summary_preamble("Here is the text: Cells divide."), "Here is the text: Cells divide.");
    assert_eq!(strip_summary_preamble("THE FOLLOWING IS A SUMMARY: x"), "x");
    assert_eq!(strip_summary_preamble("summary: Cells divide."), "Cells divide.");
    assert_eq!(strip_summary_preamble("Here's why: cells divide."), "Here's why: cells divide.");
    assert_eq!(strip_summary_preamble("  Mitosis has four phases.  "), "Mitosis has four phases.");
    assert_eq!(strip_summary_preamble("Here is a\tsummary of the notes: Cells divide."), "Cells divide.");
    assert_eq!(strip_summary_preamble("Here's a\nsummary:\nCells divide."), "Cells divide.");
  }

  #[test]
  fn log_truncation_respects_utf8() {
    let out = trunc_for_log("ééééé", 3);
    assert!(out.starts_with('é'));
    assert!(out.ends_with("(10 bytes total)"));
  }
}
