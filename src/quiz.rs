//! Quiz scoring and the advisory mission recommendation.

use crate::domain::{MissionId, QuizQuestion};

/// `round(100 * correct / total)`, half rounding up. An empty quiz scores 0.
///
/// Answers beyond the question count are ignored; missing answers count as wrong.
pub fn score_quiz(quiz: &[QuizQuestion], answers: &[usize]) -> u8 {
  let total = quiz.len();
  if total == 0 {
    return 0;
  }
  let correct = quiz
    .iter()
    .zip(answers)
    .filter(|(q, a)| q.answer == **a)
    .count();
  ((200 * correct + total) / (2 * total)) as u8
}

/// Recommendation only; any mission may still be chosen.
pub fn recommend_mission(quiz_score: u8) -> MissionId {
  match quiz_score {
    80.. => MissionId::Writer,
    60..=79 => MissionId::Mystery20Questions,
    _ => MissionId::ImageDetective,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn quiz(n: usize) -> Vec<QuizQuestion> {
    (0..n)
      .map(|i| QuizQuestion {
        question: format!("Q{i}"),
        options: vec!["a".into(), "b".into(), "c".into()],
        answer: i % 3,
      })
      .collect()
  }

  #[test]
  fn two_of_three_rounds_to_67() {
    let q = quiz(3);
    assert_eq!(score_quiz(&q, &[0, 1, 0]), 67);
    assert_eq!(score_quiz(&q, &[0, 0, 0]), 33);
    assert_eq!(score_quiz(&q, &[0, 1, 2]), 100);
    assert_eq!(score_quiz(&q, &[1, 2, 0]), 0);
  }

  #[test]
  fn empty_quiz_scores_zero() {
    assert_eq!(score_quiz(&[], &[]), 0);
    assert_eq!(score_quiz(&[], &[1, 2]), 0);
  }

  #[test]
  fn score_matches_rounded_ratio_for_all_counts() {
    for total in 1..=12usize {
      let q = quiz(total);
      for correct in 0..=total {
        let answers: Vec<usize> = q
          .iter()
          .enumerate()
          .map(|(i, q)| if i < correct { q.answer } else { (q.answer + 1) % 3 })
          .collect();
        let expected = (100.0 * correct as f64 / total as f64).round() as u8;
        let got = score_quiz(&q, &answers);
        assert_eq!(got, expected, "{correct}/{total}");
        assert!(got <= 100);
      }
    }
  }

  #[test]
  fn short_answer_list_counts_missing_as_wrong() {
    let q = quiz(4);
    assert_eq!(score_quiz(&q, &[0, 1]), 50);
  }

  #[test]
  fn recommendation_thresholds() {
    assert_eq!(recommend_mission(100), MissionId::Writer);
    assert_eq!(recommend_mission(80), MissionId::Writer);
    assert_eq!(recommend_mission(79), MissionId::Mystery20Questions);
    assert_eq!(recommend_mission(60), MissionId::Mystery20Questions);
    assert_eq!(recommend_mission(59), MissionId::ImageDetective);
    assert_eq!(recommend_mission(0), MissionId::ImageDetective);
  }
}
