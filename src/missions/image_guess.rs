//! Image detective: name the word an illustration shows, among 4 options.

use rand::{seq::SliceRandom, Rng};
use serde::Serialize;

use crate::assist::GeneratedDistractors;
use crate::catalog::{table_distractors, GENERIC_DISTRACTORS, IMAGE_WORDS};
use crate::domain::{DistractorKind, MissionDetails};
use crate::images::GeneratedImage;
use crate::util::passage_words;

use super::ActivityOutcome;

pub const SCORE_CORRECT: u8 = 100;
pub const SCORE_WRONG: u8 = 30;

#[derive(Clone, Debug, Serialize)]
pub struct OptionEntry {
  pub word: String,
  #[serde(skip)]
  pub kind: DistractorKind,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DistractorSource {
  Generated,
  BuiltinTable,
  Generic,
}

#[derive(Clone, Debug)]
pub struct ImageGuessRound {
  pub target: String,
  pub options: Vec<OptionEntry>,
  pub distractor_source: DistractorSource,
  pub image: GeneratedImage,
}

/// Prefer a drawable word that occurs in the passage.
pub fn pick_target<R: Rng + ?Sized>(passage: &str, rng: &mut R) -> String {
  let words = passage_words(passage);
  let in_passage: Vec<&str> = IMAGE_WORDS.iter().copied().filter(|w| words.iter().any(|p| p.as_str() == *w)).collect();
  let pool: &[&str] = if in_passage.is_empty() { &IMAGE_WORDS } else { &in_passage };
  pool.choose(rng).copied().unwrap_or(IMAGE_WORDS[0]).to_string()
}

/// Target plus one semantic, one spelling, and one random distractor, shuffled.
///
/// Candidates per kind are tried in order (generated, built-in table, generic), then any
/// spare word from the built-in list, so the result always holds 4 distinct words with
/// exactly one equal to `target`.
pub fn build_options<R: Rng + ?Sized>(
  target: &str,
  generated: Option<&GeneratedDistractors>,
  rng: &mut R,
) -> (Vec<OptionEntry>, DistractorSource) {
  let table = table_distractors(target);
  let mut spare: Vec<&str> = IMAGE_WORDS.to_vec();
  spare.shuffle(rng);

  let mut semantic: Vec<String> = vec![];
  let mut spelling: Vec<String> = vec![];
  let mut random: Vec<String> = vec![];
  if let Some(g) = generated {
    semantic.push(g.semantic.clone());
    spelling.push(g.spelling.clone());
    random.push(g.random.clone());
  }
  if let Some((s, sp)) = table {
    semantic.push(s.to_string());
    spelling.push(sp.to_string());
  }
  semantic.push(GENERIC_DISTRACTORS.0.to_string());
  spelling.push(GENERIC_DISTRACTORS.1.to_string());
  random.extend(spare.iter().map(|w| w.to_string()));
  random.push(GENERIC_DISTRACTORS.2.to_string());
  for list in [&mut semantic, &mut spelling] {
    list.extend(spare.iter().map(|w| w.to_string()));
  }

  let mut options = vec![OptionEntry { word: target.to_string(), kind: DistractorKind::Correct }];
  let mut from_generated = 0;
  for (kind, candidates) in [
    (DistractorKind::Semantic, &semantic),
    (DistractorKind::Spelling, &spelling),
    (DistractorKind::Random, &random),
  ] {
    let pick = candidates
      .iter()
      .enumerate()
      .find(|(_, w)| !w.is_empty() && !options.iter().any(|o| o.word.eq_ignore_ascii_case(w)));
    if let Some((idx, word)) = pick {
      if generated.is_some() && idx == 0 {
        from_generated += 1;
      }
      options.push(OptionEntry { word: word.clone(), kind });
    }
  }
  options.shuffle(rng);

  let source = if from_generated == 3 {
    DistractorSource::Generated
  } else if table.is_some() {
    DistractorSource::BuiltinTable
  } else {
    DistractorSource::Generic
  };
  (options, source)
}

/// Exact match scores 100, any other listed option 30. Unlisted words are rejected.
pub fn answer(round: &ImageGuessRound, chosen: &str) -> Result<ActivityOutcome, String> {
  let chosen = chosen.trim();
  let entry = round
    .options
    .iter()
    .find(|o| o.word == chosen)
    .ok_or_else(|| format!("'{}' is not one of the options.", chosen))?;
  let correct = entry.word == round.target;
  Ok(ActivityOutcome {
    score: if correct { SCORE_CORRECT } else { SCORE_WRONG },
    details: MissionDetails::ImageDetective {
      target: round.target.clone(),
      options: round.options.iter().map(|o| o.word.clone()).collect(),
      chosen: entry.word.clone(),
      chosen_kind: entry.kind,
      correct,
      image_source: round.image.source.clone(),
    },
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::images::builtin_image;
  use rand::{rngs::StdRng, SeedableRng};

  fn assert_well_formed(target: &str, options: &[OptionEntry]) {
    assert_eq!(options.len(), 4, "{target}: {options:?}");
    assert_eq!(options.iter().filter(|o| o.word == target).count(), 1);
    for (i, a) in options.iter().enumerate() {
      for b in &options[i + 1..] {
        assert!(!a.word.eq_ignore_ascii_case(&b.word), "duplicate {} for {target}", a.word);
      }
    }
    let kinds: Vec<DistractorKind> = options.iter().map(|o| o.kind).collect();
    for k in [DistractorKind::Correct, DistractorKind::Semantic, DistractorKind::Spelling, DistractorKind::Random] {
      assert!(kinds.contains(&k), "{target}: missing {k:?}");
    }
  }

  #[test]
  fn options_are_distinct_for_every_known_and_unknown_word() {
    let mut rng = StdRng::seed_from_u64(42);
    let extra = ["desk", "chair", "window", "spaceship", "star", "log"];
    for target in IMAGE_WORDS.iter().chain(extra.iter()) {
      for _ in 0..20 {
        let (options, _) = build_options(target, None, &mut rng);
        assert_well_formed(target, &options);
      }
    }
  }

  #[test]
  fn generated_distractors_win_when_usable() {
    let mut rng = StdRng::seed_from_u64(1);
    let g = GeneratedDistractors { semantic: "puppy".into(), spelling: "fog".into(), random: "spoon".into() };
    let (options, source) = build_options("dog", Some(&g), &mut rng);
    assert_well_formed("dog", &options);
    assert_eq!(source, DistractorSource::Generated);
    assert!(options.iter().any(|o| o.word == "puppy" && o.kind == DistractorKind::Semantic));
  }

  #[test]
  fn colliding_generated_words_fall_back_per_kind() {
    let mut rng = StdRng::seed_from_u64(3);
    // only the first generated word survives the duplicate check
    let g = GeneratedDistractors { semantic: "cat".into(), spelling: "cat".into(), random: "cat".into() };
    let (options, source) = build_options("dog", Some(&g), &mut rng);
    assert_well_formed("dog", &options);
    assert_eq!(source, DistractorSource::BuiltinTable);
  }

  #[test]
  fn unknown_word_uses_generic_triple() {
    let mut rng = StdRng::seed_from_u64(9);
    let (options, source) = build_options("spaceship", None, &mut rng);
    assert_eq!(source, DistractorSource::Generic);
    assert!(options.iter().any(|o| o.word == "desk"));
  }

  #[test]
  fn target_prefers_passage_words() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..10 {
      assert_eq!(pick_target("I walk my dog in the rain.", &mut rng), "dog");
    }
    let t = pick_target("Nothing drawable here.", &mut rng);
    assert!(IMAGE_WORDS.contains(&t.as_str()));
  }

  #[test]
  fn scoring_is_exact_match() {
    let mut rng = StdRng::seed_from_u64(11);
    let (options, distractor_source) = build_options("apple", None, &mut rng);
    let round = ImageGuessRound { target: "apple".into(), options, distractor_source, image: builtin_image() };
    assert_eq!(answer(&round, "apple").unwrap().score, 100);
    let outcome = answer(&round, "banana").unwrap();
    assert_eq!(outcome.score, 30);
    match outcome.details {
      MissionDetails::ImageDetective { chosen_kind, correct, .. } => {
        assert_eq!(chosen_kind, DistractorKind::Semantic);
        assert!(!correct);
      }
      other => panic!("unexpected details {other:?}"),
    }
    assert!(answer(&round, "pineapple").is_err());
  }
}
