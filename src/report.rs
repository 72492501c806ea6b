//! Final report: weighted total, title ladder, and the canned feedback sentence.

use serde::Serialize;

use crate::domain::MissionId;

/// Descending; the first threshold `<= total` wins.
const TITLES: [(u8, &str); 6] = [
  (100, "Perfect Master"),
  (90, "Eagle-Eyed Detective"),
  (80, "Outstanding Learner"),
  (70, "Hard-Working Student"),
  (60, "Growing Bookworm"),
  (0, "Rising Star"),
];

/// `floor(quiz * 0.4 + activity * 0.6)` computed in integers.
pub fn total_score(quiz_score: u8, activity_score: u8) -> u8 {
  ((quiz_score as u32 * 4 + activity_score as u32 * 6) / 10) as u8
}

pub fn title_for(total: u8) -> &'static str {
  TITLES
    .iter()
    .find(|(threshold, _)| total >= *threshold)
    .map(|(_, label)| *label)
    .unwrap_or(TITLES[TITLES.len() - 1].1)
}

/// Feedback used when no generated text is available.
pub fn canned_feedback(mission: MissionId, quiz_score: u8, activity_score: u8, total: u8) -> String {
  format!(
    "Great job! You completed the '{}' mission and earned {} points in total (quiz: {}, activity: {}). Keep reading every day and you will do even better next time!",
    mission.title(),
    total,
    quiz_score,
    activity_score
  )
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackSource {
  Generated,
  Fallback,
}

#[derive(Clone, Debug, Serialize)]
pub struct Report {
  pub mission: MissionId,
  pub quiz_score: u8,
  pub activity_score: u8,
  pub total_score: u8,
  pub title: String,
  pub feedback: String,
  pub feedback_source: FeedbackSource,
  /// Whether the submission record reached the store.
  pub saved: bool,
  pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn total_is_floor_of_weighted_sum() {
    for q in 0..=100u8 {
      for a in 0..=100u8 {
        let t = total_score(q, a);
        let expected = ((q as f64 * 0.4) + (a as f64 * 0.6) + 1e-9).floor() as u8;
        assert_eq!(t, expected, "q={q} a={a}");
        assert!(t <= 100);
      }
    }
  }

  #[test]
  fn title_thresholds_are_inclusive() {
    assert_eq!(title_for(100), "Perfect Master");
    assert_eq!(title_for(99), "Eagle-Eyed Detective");
    assert_eq!(title_for(95), "Eagle-Eyed Detective");
    assert_eq!(title_for(90), "Eagle-Eyed Detective");
    assert_eq!(title_for(80), "Outstanding Learner");
    assert_eq!(title_for(70), "Hard-Working Student");
    assert_eq!(title_for(69), "Growing Bookworm");
    assert_eq!(title_for(59), "Rising Star");
    assert_eq!(title_for(0), "Rising Star");
  }

  #[test]
  fn writer_after_two_of_three() {
    let total = total_score(67, 85);
    assert_eq!(total, 77);
    assert_eq!(title_for(total), "Hard-Working Student");
  }

  #[test]
  fn canned_feedback_mentions_scores() {
    let text = canned_feedback(MissionId::Writer, 67, 85, 77);
    assert!(text.contains("Bestseller Writer"));
    assert!(text.contains("77"));
  }
}
