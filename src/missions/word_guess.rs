//! Mystery 20 questions: a word is blanked out of the passage and the student
//! unlocks up to ten cumulative hints before guessing.
//!
//! Hint tiers, in order:
//!  1. length
//!  2. first letter
//!  3. last letter
//!  4. vowel count
//!  5. pattern with first and last letters shown
//!  6. ... plus every vowel
//!  7. ... plus the first half
//!  8. ... with a single letter still hidden
//!  9. the letters in alphabetical order
//! 10. the answer itself
//!
//! Hints used are recorded but do not change the score: any case-insensitive match
//! scores 100, anything else 50.

use std::collections::BTreeSet;

use rand::{seq::SliceRandom, Rng};

use crate::domain::MissionDetails;
use crate::util::content_words;

use super::ActivityOutcome;

pub const MAX_HINTS: u8 = 10;
pub const SCORE_CORRECT: u8 = 100;
pub const SCORE_WRONG: u8 = 50;

const FALLBACK_WORDS: [&str; 4] = ["reading", "friend", "school", "family"];
const BLANK: &str = "_____";

#[derive(Clone, Debug)]
pub struct WordGuessRound {
  pub target: String,
  pub blanked_passage: String,
  pub hints_used: u8,
}

impl WordGuessRound {
  pub fn new<R: Rng + ?Sized>(passage: &str, rng: &mut R) -> Self {
    let target = pick_target(passage, rng);
    let blanked_passage = blank_out(passage, &target);
    Self { target, blanked_passage, hints_used: 0 }
  }

  /// Unlock one more tier, saturating at `MAX_HINTS`.
  pub fn reveal_next(&mut self) -> bool {
    if self.hints_used >= MAX_HINTS {
      return false;
    }
    self.hints_used += 1;
    true
  }

  pub fn hints(&self) -> Vec<String> {
    hints(&self.target, self.hints_used)
  }

  pub fn answer_revealed(&self) -> bool {
    self.hints_used >= MAX_HINTS
  }
}

pub fn pick_target<R: Rng + ?Sized>(passage: &str, rng: &mut R) -> String {
  let candidates = content_words(passage, 4, 10);
  candidates
    .choose(rng)
    .cloned()
    .unwrap_or_else(|| FALLBACK_WORDS.choose(rng).copied().unwrap_or("reading").to_string())
}

/// Replace whole-word, case-insensitive occurrences of `target` with a blank.
pub fn blank_out(passage: &str, target: &str) -> String {
  let mut out = String::with_capacity(passage.len());
  let mut word = String::new();
  let flush = |word: &mut String, out: &mut String| {
    if !word.is_empty() {
      if word.eq_ignore_ascii_case(target) {
        out.push_str(BLANK);
      } else {
        out.push_str(word);
      }
      word.clear();
    }
  };
  for ch in passage.chars() {
    if ch.is_ascii_alphabetic() {
      word.push(ch);
    } else {
      flush(&mut word, &mut out);
      out.push(ch);
    }
  }
  flush(&mut word, &mut out);
  out
}

/// The first `level` hints for `target`; each level extends the previous one.
pub fn hints(target: &str, level: u8) -> Vec<String> {
  let letters: Vec<char> = target.to_lowercase().chars().collect();
  (1..=level.min(MAX_HINTS)).map(|tier| hint_line(&letters, tier)).collect()
}

fn is_vowel(c: char) -> bool {
  matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Positions shown by the pattern hints, cumulative from tier 5 up to `tier`.
fn revealed_positions(letters: &[char], tier: u8) -> BTreeSet<usize> {
  let n = letters.len();
  let mut shown = BTreeSet::new();
  if n == 0 {
    return shown;
  }
  if tier >= 5 {
    shown.insert(0);
    shown.insert(n - 1);
  }
  if tier >= 6 {
    shown.extend((0..n).filter(|&i| is_vowel(letters[i])));
  }
  if tier >= 7 {
    shown.extend(0..(n + 1) / 2);
  }
  if tier >= 8 {
    let hidden: Vec<usize> = (0..n).filter(|i| !shown.contains(i)).collect();
    if let Some((_, rest)) = hidden.split_last() {
      shown.extend(rest.iter().copied());
    }
  }
  shown
}

fn pattern(letters: &[char], shown: &BTreeSet<usize>) -> String {
  letters
    .iter()
    .enumerate()
    .map(|(i, c)| if shown.contains(&i) { c.to_string() } else { "_".to_string() })
    .collect::<Vec<_>>()
    .join(" ")
}

fn hint_line(letters: &[char], tier: u8) -> String {
  let first = letters.first().copied().unwrap_or('?');
  let last = letters.last().copied().unwrap_or('?');
  match tier {
    1 => format!("The word has {} letters.", letters.len()),
    2 => format!("It starts with '{}'.", first),
    3 => format!("It ends with '{}'.", last),
    4 => {
      let v = letters.iter().filter(|c| is_vowel(**c)).count();
      format!("It has {} vowel{}.", v, if v == 1 { "" } else { "s" })
    }
    5..=8 => format!("Pattern: {}", pattern(letters, &revealed_positions(letters, tier))),
    9 => {
      let mut sorted = letters.to_vec();
      sorted.sort_unstable();
      format!("Its letters in alphabetical order: {}", sorted.iter().collect::<String>())
    }
    _ => format!("The answer is '{}'.", letters.iter().collect::<String>()),
  }
}

/// Case-insensitive exact match scores 100 regardless of hints used, otherwise 50.
pub fn answer(round: &WordGuessRound, guess: &str) -> Result<ActivityOutcome, String> {
  let guess = guess.trim();
  if guess.is_empty() {
    return Err("Please type a guess.".into());
  }
  let correct = guess.to_lowercase() == round.target.to_lowercase();
  Ok(ActivityOutcome {
    score: if correct { SCORE_CORRECT } else { SCORE_WRONG },
    details: MissionDetails::Mystery20Questions {
      target: round.target.clone(),
      guess: guess.to_string(),
      correct,
      hints_used: round.hints_used,
      answer_revealed: round.answer_revealed(),
    },
  })
}
