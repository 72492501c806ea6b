//! Post-quiz missions. Each variant owns its scratch state and scoring;
//! dispatch is a single match on `MissionScratch`.

use std::time::Duration;

use rand::rngs::StdRng;
use tracing::{debug, instrument, warn};

use crate::assist::{generate_distractors, TextGenerator};
use crate::config::Prompts;
use crate::domain::{MissionDetails, MissionId};
use crate::images::ImageChain;

pub mod image_guess;
pub mod word_guess;
pub mod writer;

use image_guess::ImageGuessRound;
use word_guess::WordGuessRound;
use writer::WriterPrompt;

/// Per-run mission state, created on first entry to the activity step and dropped on leaving it.
#[derive(Clone, Debug)]
pub enum MissionScratch {
  ImageGuess(ImageGuessRound),
  WordGuess(WordGuessRound),
  Writer(WriterPrompt),
}

impl MissionScratch {
  pub fn mission(&self) -> MissionId {
    match self {
      MissionScratch::ImageGuess(_) => MissionId::ImageDetective,
      MissionScratch::WordGuess(_) => MissionId::Mystery20Questions,
      MissionScratch::Writer(_) => MissionId::Writer,
    }
  }
}

/// Result of a finished activity: a reward tier plus a report payload.
#[derive(Clone, Debug, PartialEq)]
pub struct ActivityOutcome {
  pub score: u8,
  pub details: MissionDetails,
}

/// Score a student answer against the active mission. `Err` is a user-facing
/// rejection; the step does not advance.
pub fn score_activity(scratch: &MissionScratch, answer: &str) -> Result<ActivityOutcome, String> {
  match scratch {
    MissionScratch::ImageGuess(round) => image_guess::answer(round, answer),
    MissionScratch::WordGuess(round) => word_guess::answer(round, answer),
    MissionScratch::Writer(prompt) => writer::answer(prompt, answer),
  }
}

/// Collaborators needed to set up a mission.
pub struct PrepareContext<'a> {
  pub passage: &'a str,
  pub prompts: &'a Prompts,
  pub text_gen: Option<&'a dyn TextGenerator>,
  pub images: &'a ImageChain,
  pub timeout: Duration,
  pub writer_min_chars: usize,
}

/// Build the scratch state for `mission`. External failures degrade to local
/// fallbacks and are reported as user-visible warnings.
#[instrument(level = "info", skip(ctx, rng), fields(%mission))]
pub async fn prepare(mission: MissionId, ctx: &PrepareContext<'_>, rng: &mut StdRng) -> (MissionScratch, Vec<String>) {
  let mut warnings = vec![];
  let scratch = match mission {
    MissionId::ImageDetective => {
      let target = image_guess::pick_target(ctx.passage, rng);
      let generated = match ctx.text_gen {
        Some(gen) => match generate_distractors(gen, ctx.prompts, &target, ctx.passage, ctx.timeout).await {
          Ok(d) => Some(d),
          Err(e) => {
            warn!(target: "mission", %target, error = %e, "Contextual distractors failed; using built-in table");
            warnings.push("AI answer choices are unavailable right now; using built-in choices.".to_string());
            None
          }
        },
        None => {
          debug!(target: "mission", "No text model configured; using built-in distractors");
          None
        }
      };
      let (image, image_warnings) = ctx.images.generate(&target).await;
      warnings.extend(image_warnings);
      let (options, distractor_source) = image_guess::build_options(&target, generated.as_ref(), rng);
      MissionScratch::ImageGuess(ImageGuessRound { target, options, distractor_source, image })
    }
    MissionId::Mystery20Questions => MissionScratch::WordGuess(WordGuessRound::new(ctx.passage, rng)),
    MissionId::Writer => MissionScratch::Writer(WriterPrompt::new(ctx.passage, ctx.writer_min_chars, rng)),
  };
  (scratch, warnings)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::assist::tests::FakeGen;
  use crate::images::Placeholder;
  use rand::SeedableRng;
  use serde_json::json;
  use std::sync::Arc;

  fn chain() -> ImageChain {
    ImageChain::new(vec![Arc::new(Placeholder) as Arc<dyn crate::images::ImageProvider>], Duration::from_millis(100))
  }

  #[tokio::test]
  async fn image_mission_survives_text_model_outage() {
    let prompts = Prompts::default();
    let images = chain();
    let gen = FakeGen { text: None, json: None };
    let ctx = PrepareContext {
      passage: "My dog sleeps under the tree.",
      prompts: &prompts,
      text_gen: Some(&gen),
      images: &images,
      timeout: Duration::from_millis(100),
      writer_min_chars: 10,
    };
    let mut rng = StdRng::seed_from_u64(1);
    let (scratch, warnings) = prepare(MissionId::ImageDetective, &ctx, &mut rng).await;
    assert_eq!(warnings.len(), 1);
    match &scratch {
      MissionScratch::ImageGuess(round) => {
        assert!(round.target == "dog" || round.target == "tree");
        assert_eq!(round.options.len(), 4);
        assert_eq!(round.image.source, "placeholder");
      }
      other => panic!("unexpected {other:?}"),
    }
    let outcome = score_activity(&scratch, &scratch_target(&scratch)).unwrap();
    assert_eq!(outcome.score, 100);
  }

  #[tokio::test]
  async fn image_mission_uses_generated_distractors() {
    let prompts = Prompts::default();
    let images = chain();
    let gen = FakeGen { text: None, json: Some(json!({"semantic": "puppy", "spelling": "fog", "random": "spoon"})) };
    let ctx = PrepareContext {
      passage: "A dog.",
      prompts: &prompts,
      text_gen: Some(&gen),
      images: &images,
      timeout: Duration::from_millis(100),
      writer_min_chars: 10,
    };
    let mut rng = StdRng::seed_from_u64(2);
    let (scratch, warnings) = prepare(MissionId::ImageDetective, &ctx, &mut rng).await;
    assert!(warnings.is_empty());
    match scratch {
      MissionScratch::ImageGuess(round) => {
        assert_eq!(round.distractor_source, image_guess::DistractorSource::Generated);
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[tokio::test]
  async fn dispatch_matches_mission() {
    let prompts = Prompts::default();
    let images = chain();
    let ctx = PrepareContext {
      passage: "Hana visited Rome and walked everywhere.",
      prompts: &prompts,
      text_gen: None,
      images: &images,
      timeout: Duration::from_millis(100),
      writer_min_chars: 10,
    };
    let mut rng = StdRng::seed_from_u64(3);
    for m in MissionId::ALL {
      let (scratch, _) = prepare(m, &ctx, &mut rng).await;
      assert_eq!(scratch.mission(), m);
    }
  }

  fn scratch_target(s: &MissionScratch) -> String {
    match s {
      MissionScratch::ImageGuess(r) => r.target.clone(),
      MissionScratch::WordGuess(r) => r.target.clone(),
      MissionScratch::Writer(_) => String::new(),
    }
  }
}
