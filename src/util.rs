//! Small utility helpers used across modules.

use std::{future::Future, time::Duration};

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

/// Log-safe truncation for large strings (char-boundary aware).
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

/// Run an external call with a hard deadline; expiry becomes an ordinary error.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, String>
where
  F: Future<Output = Result<T, String>>,
{
  with_deadline(limit, fut).await?
}

/// Like `with_timeout`, for futures with their own error type.
pub async fn with_deadline<F: Future>(limit: Duration, fut: F) -> Result<F::Output, String> {
  tokio::time::timeout(limit, fut)
    .await
    .map_err(|_| format!("timed out after {:.1}s", limit.as_secs_f32()))
}

const STOPWORDS: &[&str] = &[
  "about", "after", "again", "also", "although", "always", "because", "before", "every", "from", "have", "here",
  "into", "just", "like", "many", "more", "most", "much", "only", "other", "really", "same", "should", "some",
  "that", "their", "them", "then", "there", "these", "they", "this", "those", "through", "very", "what", "when",
  "where", "which", "while", "with", "would", "your", "each", "even", "does", "were", "will", "than",
];

/// Lowercased alphabetic words of a passage, in order, with duplicates.
pub fn passage_words(text: &str) -> Vec<String> {
  text
    .split(|c: char| !c.is_ascii_alphabetic())
    .filter(|w| !w.is_empty())
    .map(|w| w.to_ascii_lowercase())
    .collect()
}

/// Distinct, non-stopword passage words within a length range, first occurrence order.
pub fn content_words(text: &str, min_len: usize, max_len: usize) -> Vec<String> {
  let mut out: Vec<String> = vec![];
  for w in passage_words(text) {
    if w.len() < min_len || w.len() > max_len || STOPWORDS.contains(&w.as_str()) {
      continue;
    }
    if !out.contains(&w) {
      out.push(w);
    }
  }
  out
}
