//! Loading service configuration (prompts + tunables) from TOML.
//!
//! Secrets and endpoints come from environment variables; see `main.rs`.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub settings: Settings,
}

/// Runtime knobs.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Upper bound for every external call (AI, images, store lookups during a step).
  pub external_timeout_secs: u64,
  /// Minimum trimmed length for writer submissions.
  pub writer_min_chars: usize,
  /// Default page size for teacher listings.
  pub list_limit: usize,
  /// Student sessions untouched for this long are dropped.
  pub session_idle_secs: u64,
  /// Teacher tokens unused for this long are dropped.
  pub teacher_token_idle_secs: u64,
  /// Period of the idle sweep.
  pub sweep_interval_secs: u64,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      external_timeout_secs: 8,
      writer_min_chars: 10,
      list_limit: 50,
      session_idle_secs: 2 * 60 * 60,
      teacher_token_idle_secs: 12 * 60 * 60,
      sweep_interval_secs: 60,
    }
  }
}

/// Prompts used by the text and image models.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub distractor_system: String,
  pub distractor_user_template: String,
  pub feedback_system: String,
  pub feedback_user_template: String,
  pub quiz_system: String,
  pub quiz_user_template: String,
  pub image_prompt_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      distractor_system: "You write multiple-choice distractors for young English learners. Respond ONLY with strict JSON.".into(),
      distractor_user_template: "Target word: {word}\nReading passage: {passage}\n\nReturn JSON {\"semantic\": string, \"spelling\": string, \"random\": string}.\n- semantic: a different word with a related meaning\n- spelling: a real word spelled similarly to the target\n- random: an unrelated simple noun\nAll three must be single lowercase English words, different from the target and from each other.".into(),
      feedback_system: "You are a warm English teacher writing short encouraging feedback for a middle-school student. Reply in 2-3 sentences of plain text.".into(),
      feedback_user_template: "Student: {student}\nMission: {mission}\nQuiz score: {quiz_score}/100\nActivity score: {activity_score}/100\nTotal: {total_score}/100 ({title})\nActivity details: {details}\n\nWrite feedback that praises one concrete thing and suggests one next step.".into(),
      quiz_system: "You create reading-comprehension quizzes. Respond ONLY with strict JSON.".into(),
      quiz_user_template: "Passage:\n{passage}\n\nWrite 3 multiple-choice questions answerable from the passage. Return JSON {\"questions\": [{\"question\": string, \"options\": [3 strings], \"answer\": index of the correct option}]}.".into(),
      image_prompt_template: "A simple, friendly, colorful illustration of a {word} for young English learners. No text or letters in the image.".into(),
    }
  }
}

/// Attempt to load `AppConfig` from READFIT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("READFIT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "readfit_backend", %path, "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "readfit_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "readfit_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_toml_keeps_defaults() {
    let cfg: AppConfig = toml::from_str(
      r#"
        [settings]
        writer_min_chars = 20

        [prompts]
        feedback_system = "Be brief."
      "#,
    )
    .unwrap();
    assert_eq!(cfg.settings.writer_min_chars, 20);
    assert_eq!(cfg.settings.external_timeout_secs, 8);
    assert_eq!(cfg.settings.session_idle_secs, 7200);
    assert_eq!(cfg.prompts.feedback_system, "Be brief.");
    assert!(cfg.prompts.distractor_user_template.contains("{word}"));
  }
}
