//! AI-backed helper calls: contextual distractors, report feedback, and optional quiz drafting.
//!
//! Every helper validates model output before returning it. Callers treat any `Err`
//! as a signal to use their local fallback.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::Prompts;
use crate::domain::QuizQuestion;
use crate::util::{fill_template, trunc_for_log, with_timeout};

/// Text model seam. `complete_json` must return a JSON object parsed from the model reply.
#[async_trait]
pub trait TextGenerator: Send + Sync {
  async fn complete_text(&self, system: &str, user: &str) -> Result<String, String>;
  async fn complete_json(&self, system: &str, user: &str) -> Result<serde_json::Value, String>;
}

/// Three wrong answers for the image-guess mission, one per kind.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct GeneratedDistractors {
  pub semantic: String,
  pub spelling: String,
  pub random: String,
}

impl GeneratedDistractors {
  fn normalized(self) -> Self {
    Self {
      semantic: self.semantic.trim().to_lowercase(),
      spelling: self.spelling.trim().to_lowercase(),
      random: self.random.trim().to_lowercase(),
    }
  }

  fn check(&self, target: &str) -> Result<(), String> {
    let words = [&self.semantic, &self.spelling, &self.random];
    for w in words {
      if w.is_empty() || w.len() > 30 {
        return Err(format!("bad distractor length: '{}'", w));
      }
      if !w.chars().all(|c| c.is_ascii_alphabetic() || c == '-' || c == ' ' || c == '\'') {
        return Err(format!("distractor is not a plain word: '{}'", w));
      }
      if w.eq_ignore_ascii_case(target) {
        return Err(format!("distractor repeats the target '{}'", target));
      }
    }
    if self.semantic == self.spelling || self.semantic == self.random || self.spelling == self.random {
      return Err("distractors are not distinct".into());
    }
    Ok(())
  }
}

#[instrument(level = "info", skip(gen, prompts, passage), fields(%word, passage_len = passage.len()))]
pub async fn generate_distractors(
  gen: &dyn TextGenerator,
  prompts: &Prompts,
  word: &str,
  passage: &str,
  limit: Duration,
) -> Result<GeneratedDistractors, String> {
  let user = fill_template(&prompts.distractor_user_template, &[("word", word), ("passage", passage)]);
  let value = with_timeout(limit, gen.complete_json(&prompts.distractor_system, &user)).await?;
  let d: GeneratedDistractors = serde_json::from_value(value).map_err(|e| format!("distractor schema: {e}"))?;
  let d = d.normalized();
  d.check(word)?;
  debug!(target: "mission", semantic = %d.semantic, spelling = %d.spelling, random = %d.random, "Contextual distractors accepted");
  Ok(d)
}

/// Inputs for the report feedback prompt.
pub struct FeedbackRequest<'a> {
  pub student: &'a str,
  pub mission: &'a str,
  pub quiz_score: u8,
  pub activity_score: u8,
  pub total_score: u8,
  pub title: &'a str,
  pub details_json: &'a str,
}

#[instrument(level = "info", skip_all, fields(total = req.total_score))]
pub async fn generate_feedback(
  gen: &dyn TextGenerator,
  prompts: &Prompts,
  req: &FeedbackRequest<'_>,
  limit: Duration,
) -> Result<String, String> {
  let (q, a, t) = (req.quiz_score.to_string(), req.activity_score.to_string(), req.total_score.to_string());
  let user = fill_template(
    &prompts.feedback_user_template,
    &[
      ("student", req.student),
      ("mission", req.mission),
      ("quiz_score", &q),
      ("activity_score", &a),
      ("total_score", &t),
      ("title", req.title),
      ("details", req.details_json),
    ],
  );
  let text = with_timeout(limit, gen.complete_text(&prompts.feedback_system, &user)).await?;
  let text = text.trim();
  if text.is_empty() {
    return Err("empty feedback".into());
  }
  debug!(target: "mission", feedback = %trunc_for_log(text, 80), "Generated feedback");
  Ok(text.to_string())
}

#[derive(Deserialize)]
struct QuizDraft {
  questions: Vec<QuizQuestion>,
}

#[instrument(level = "info", skip(gen, prompts, passage), fields(passage_len = passage.len()))]
pub async fn generate_quiz(
  gen: &dyn TextGenerator,
  prompts: &Prompts,
  passage: &str,
  limit: Duration,
) -> Result<Vec<QuizQuestion>, String> {
  let user = fill_template(&prompts.quiz_user_template, &[("passage", passage)]);
  let value = with_timeout(limit, gen.complete_json(&prompts.quiz_system, &user)).await?;
  let draft: QuizDraft = serde_json::from_value(value).map_err(|e| format!("quiz schema: {e}"))?;
  if draft.questions.is_empty() || draft.questions.len() > 10 {
    return Err(format!("unexpected question count {}", draft.questions.len()));
  }
  for (i, q) in draft.questions.iter().enumerate() {
    q.validate().map_err(|e| format!("question {}: {}", i + 1, e))?;
  }
  Ok(draft.questions)
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use serde_json::json;

  /// Canned replies for tests; `None` simulates an outage.
  pub struct FakeGen {
    pub text: Option<String>,
    pub json: Option<serde_json::Value>,
  }

  #[async_trait]
  impl TextGenerator for FakeGen {
    async fn complete_text(&self, _system: &str, _user: &str) -> Result<String, String> {
      self.text.clone().ok_or_else(|| "text model down".to_string())
    }
    async fn complete_json(&self, _system: &str, _user: &str) -> Result<serde_json::Value, String> {
      self.json.clone().ok_or_else(|| "text model down".to_string())
    }
  }

  const LIMIT: Duration = Duration::from_secs(1);

  #[tokio::test]
  async fn distractors_are_normalized_and_checked() {
    let gen = FakeGen { text: None, json: Some(json!({"semantic": " Puppy ", "spelling": "Fog", "random": "spoon"})) };
    let d = generate_distractors(&gen, &Prompts::default(), "dog", "My dog runs.", LIMIT).await.unwrap();
    assert_eq!(d, GeneratedDistractors { semantic: "puppy".into(), spelling: "fog".into(), random: "spoon".into() });
  }

  #[tokio::test]
  async fn distractors_repeating_the_target_are_rejected() {
    let gen = FakeGen { text: None, json: Some(json!({"semantic": "DOG", "spelling": "fog", "random": "spoon"})) };
    assert!(generate_distractors(&gen, &Prompts::default(), "dog", "", LIMIT).await.is_err());
    let gen = FakeGen { text: None, json: Some(json!({"semantic": "fog", "spelling": "fog", "random": "spoon"})) };
    assert!(generate_distractors(&gen, &Prompts::default(), "dog", "", LIMIT).await.is_err());
    let gen = FakeGen { text: None, json: Some(json!({"semantic": "cat"})) };
    assert!(generate_distractors(&gen, &Prompts::default(), "dog", "", LIMIT).await.is_err());
  }

  #[tokio::test]
  async fn blank_feedback_is_an_error() {
    let req = FeedbackRequest {
      student: "Mina",
      mission: "writer",
      quiz_score: 67,
      activity_score: 85,
      total_score: 77,
      title: "Hard-Working Student",
      details_json: "{}",
    };
    let gen = FakeGen { text: Some("   ".into()), json: None };
    assert!(generate_feedback(&gen, &Prompts::default(), &req, LIMIT).await.is_err());
    let gen = FakeGen { text: Some(" Nice story! ".into()), json: None };
    assert_eq!(generate_feedback(&gen, &Prompts::default(), &req, LIMIT).await.unwrap(), "Nice story!");
  }

  #[tokio::test]
  async fn quiz_draft_must_pass_question_validation() {
    let good = json!({"questions": [{"question": "Who runs?", "options": ["Harin", "Mike", "Elena"], "answer": 0}]});
    let gen = FakeGen { text: None, json: Some(good) };
    assert_eq!(generate_quiz(&gen, &Prompts::default(), "text", LIMIT).await.unwrap().len(), 1);

    let bad = json!({"questions": [{"question": "Who runs?", "options": ["Harin", "Mike", "Elena"], "answer": 5}]});
    let gen = FakeGen { text: None, json: Some(bad) };
    assert!(generate_quiz(&gen, &Prompts::default(), "text", LIMIT).await.is_err());
  }
}
