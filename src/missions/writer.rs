//! Bestseller writer: continue the story using a few passage keywords.

use rand::{seq::SliceRandom, Rng};

use crate::domain::MissionDetails;
use crate::util::content_words;

use super::ActivityOutcome;

pub const SCORE_ACCEPTED: u8 = 85;
const MAX_KEYWORDS: usize = 3;
const FALLBACK_KEYWORDS: [&str; 2] = ["friend", "future"];

#[derive(Clone, Debug)]
pub struct WriterPrompt {
  pub keywords: Vec<String>,
  pub min_chars: usize,
}

impl WriterPrompt {
  pub fn new<R: Rng + ?Sized>(passage: &str, min_chars: usize, rng: &mut R) -> Self {
    Self { keywords: pick_keywords(passage, rng), min_chars }
  }

  pub fn instructions(&self) -> String {
    format!(
      "Imagine what happens next and write the rest of the story. Try to use these words: {}.",
      self.keywords.join(", ")
    )
  }
}

/// Up to three distinct passage words of 5+ letters, kept in passage order.
pub fn pick_keywords<R: Rng + ?Sized>(passage: &str, rng: &mut R) -> Vec<String> {
  let candidates = content_words(passage, 5, 12);
  if candidates.is_empty() {
    return FALLBACK_KEYWORDS.iter().map(|w| w.to_string()).collect();
  }
  let chosen: Vec<&String> = candidates.choose_multiple(rng, MAX_KEYWORDS).collect();
  candidates.iter().filter(|w| chosen.contains(w)).cloned().collect()
}

/// Any text of at least `min_chars` (trimmed) is accepted with a fixed score.
/// Content is not graded; keyword use is only recorded.
pub fn answer(prompt: &WriterPrompt, text: &str) -> Result<ActivityOutcome, String> {
  let text = text.trim();
  let char_count = text.chars().count();
  if char_count == 0 || char_count < prompt.min_chars {
    return Err(format!("Please write at least {} characters.", prompt.min_chars.max(1)));
  }
  let lower = text.to_lowercase();
  let keywords_used = prompt.keywords.iter().filter(|k| lower.contains(k.as_str())).cloned().collect();
  Ok(ActivityOutcome {
    score: SCORE_ACCEPTED,
    details: MissionDetails::Writer {
      keywords: prompt.keywords.clone(),
      text: text.to_string(),
      char_count,
      keywords_used,
    },
  })
}
