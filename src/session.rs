//! Student session flow: quiz → mission choice → activity → report.
//!
//! `StudentSession` is the per-session context handed to every handler. Each
//! transition checks that the step's inputs are present before advancing.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Assignment, MissionId};
use crate::missions::{ActivityOutcome, MissionScratch};
use crate::quiz::{recommend_mission, score_quiz};
use crate::report::Report;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Step {
  AwaitingQuiz = 1,
  AwaitingMissionChoice = 2,
  AwaitingActivity = 3,
  Report = 4,
}

impl Step {
  pub fn number(self) -> u8 {
    self as u8
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
  #[error("This action belongs to step {expected}, but the session is at step {actual}.")]
  WrongStep { expected: u8, actual: u8 },
  #[error("Submit the quiz before choosing a mission.")]
  QuizNotSubmitted,
  #[error("Choose a mission before starting the activity.")]
  NoMissionSelected,
  #[error("The activity has not been completed yet.")]
  ActivityIncomplete,
  #[error("The activity has not been started yet.")]
  ActivityNotStarted,
  #[error("Expected {expected} answers, got {actual}.")]
  AnswerCount { expected: usize, actual: usize },
  #[error("Question {question} has no option {option}.")]
  InvalidOption { question: usize, option: usize },
  #[error("The active mission is {active}, not {requested}.")]
  MissionMismatch { active: MissionId, requested: MissionId },
}

#[derive(Debug)]
pub struct StudentSession {
  pub id: Uuid,
  pub student_name: String,
  pub assignment: Assignment,
  pub started_at: DateTime<Utc>,
  step: Step,
  quiz_score: Option<u8>,
  selected_mission: Option<MissionId>,
  scratch: Option<MissionScratch>,
  outcome: Option<ActivityOutcome>,
  report: Option<Report>,
  runs_completed: u32,
}

impl StudentSession {
  pub fn new(assignment: Assignment, student_name: &str) -> Self {
    Self {
      id: Uuid::new_v4(),
      student_name: student_name.trim().to_string(),
      assignment,
      started_at: Utc::now(),
      step: Step::AwaitingQuiz,
      quiz_score: None,
      selected_mission: None,
      scratch: None,
      outcome: None,
      report: None,
      runs_completed: 0,
    }
  }

  pub fn step(&self) -> Step { self.step }
  pub fn quiz_score(&self) -> Option<u8> { self.quiz_score }
  pub fn selected_mission(&self) -> Option<MissionId> { self.selected_mission }
  pub fn scratch(&self) -> Option<&MissionScratch> { self.scratch.as_ref() }
  pub fn scratch_mut(&mut self) -> Option<&mut MissionScratch> { self.scratch.as_mut() }
  pub fn outcome(&self) -> Option<&ActivityOutcome> { self.outcome.as_ref() }
  pub fn report(&self) -> Option<&Report> { self.report.as_ref() }
  pub fn runs_completed(&self) -> u32 { self.runs_completed }

  pub fn activity_score(&self) -> Option<u8> {
    self.outcome.as_ref().map(|o| o.score)
  }

  /// Advisory only, available once the quiz is scored.
  pub fn recommendation(&self) -> Option<MissionId> {
    self.quiz_score.map(recommend_mission)
  }

  fn expect_step(&self, expected: Step) -> Result<(), FlowError> {
    if self.step != expected {
      return Err(FlowError::WrongStep { expected: expected.number(), actual: self.step.number() });
    }
    Ok(())
  }

  /// Move one step forward; refuses if the target step's prerequisites are missing.
  fn advance_to(&mut self, to: Step) -> Result<(), FlowError> {
    let prev = match to {
      Step::AwaitingQuiz => return Err(FlowError::WrongStep { expected: 4, actual: self.step.number() }),
      Step::AwaitingMissionChoice => Step::AwaitingQuiz,
      Step::AwaitingActivity => Step::AwaitingMissionChoice,
      Step::Report => Step::AwaitingActivity,
    };
    self.expect_step(prev)?;
    match to {
      Step::AwaitingMissionChoice if self.quiz_score.is_none() => return Err(FlowError::QuizNotSubmitted),
      Step::AwaitingActivity if self.selected_mission.is_none() => return Err(FlowError::NoMissionSelected),
      Step::Report if self.outcome.is_none() => return Err(FlowError::ActivityIncomplete),
      _ => {}
    }
    self.step = to;
    Ok(())
  }

  /// 1 → 2. One option index per question.
  pub fn submit_quiz(&mut self, answers: &[usize]) -> Result<u8, FlowError> {
    self.expect_step(Step::AwaitingQuiz)?;
    let quiz = &self.assignment.quiz;
    if answers.len() != quiz.len() {
      return Err(FlowError::AnswerCount { expected: quiz.len(), actual: answers.len() });
    }
    if let Some((i, &option)) = answers.iter().enumerate().find(|(i, a)| **a >= quiz[*i].options.len()) {
      return Err(FlowError::InvalidOption { question: i + 1, option });
    }
    let score = score_quiz(quiz, answers);
    self.quiz_score = Some(score);
    self.advance_to(Step::AwaitingMissionChoice)?;
    Ok(score)
  }

  /// 2 → 3. Any mission is allowed regardless of the recommendation.
  pub fn choose_mission(&mut self, mission: MissionId) -> Result<(), FlowError> {
    self.expect_step(Step::AwaitingMissionChoice)?;
    if self.quiz_score.is_none() {
      return Err(FlowError::QuizNotSubmitted);
    }
    self.selected_mission = Some(mission);
    self.advance_to(Step::AwaitingActivity)
  }

  /// Mission to set up for step 3; rejects when none was chosen.
  pub fn activity_mission(&self) -> Result<MissionId, FlowError> {
    self.expect_step(Step::AwaitingActivity)?;
    self.selected_mission.ok_or(FlowError::NoMissionSelected)
  }

  /// Attach lazily prepared scratch state. Keeps an existing one.
  pub fn install_scratch(&mut self, scratch: MissionScratch) -> Result<&MissionScratch, FlowError> {
    let mission = self.activity_mission()?;
    if scratch.mission() != mission {
      return Err(FlowError::MissionMismatch { active: mission, requested: scratch.mission() });
    }
    Ok(self.scratch.get_or_insert(scratch))
  }

  /// 3 → 4. Outcome, report and step change land together; scratch state is torn down.
  pub fn complete_activity(&mut self, outcome: ActivityOutcome, report: Report) -> Result<(), FlowError> {
    let mission = self.activity_mission()?;
    for requested in [outcome.details.mission(), report.mission] {
      if requested != mission {
        return Err(FlowError::MissionMismatch { active: mission, requested });
      }
    }
    self.outcome = Some(outcome);
    self.advance_to(Step::Report)?;
    self.report = Some(report);
    self.scratch = None;
    self.runs_completed += 1;
    Ok(())
  }

  /// 4 → 1. Clears every per-run field; identity and assignment are kept.
  pub fn retry(&mut self) -> Result<(), FlowError> {
    self.expect_step(Step::Report)?;
    self.step = Step::AwaitingQuiz;
    self.quiz_score = None;
    self.selected_mission = None;
    self.scratch = None;
    self.outcome = None;
    self.report = None;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog;
  use crate::domain::{AccessCode, AssignmentStatus, Difficulty, MissionDetails, QuizSource, Unit};
  use crate::missions::{score_activity, writer::WriterPrompt};
  use crate::report::FeedbackSource;

  fn assignment() -> Assignment {
    Assignment {
      access_code: AccessCode::parse("123456").unwrap(),
      unit: Unit::Unit1,
      difficulty: Difficulty::Beginner,
      text: catalog::passage(Unit::Unit1, Difficulty::Beginner).to_string(),
      quiz: catalog::quiz_for(Unit::Unit1),
      quiz_source: QuizSource::Catalog,
      status: AssignmentStatus::Active,
      created_at: Utc::now(),
      created_by: None,
    }
  }

  fn writer_outcome() -> ActivityOutcome {
    let prompt = WriterPrompt { keywords: vec!["park".into()], min_chars: 10 };
    score_activity(&MissionScratch::Writer(prompt), "A long enough story.").unwrap()
  }

  fn report_for(mission: MissionId, activity_score: u8) -> Report {
    Report {
      mission,
      quiz_score: 67,
      activity_score,
      total_score: 77,
      title: "Hard-Working Student".into(),
      feedback: "Well done.".into(),
      feedback_source: FeedbackSource::Fallback,
      saved: true,
      warnings: vec![],
    }
  }

  #[test]
  fn mission_cannot_be_chosen_before_quiz() {
    let mut s = StudentSession::new(assignment(), "Mina");
    assert_eq!(
      s.choose_mission(MissionId::Writer),
      Err(FlowError::WrongStep { expected: 2, actual: 1 })
    );
    assert_eq!(s.activity_mission(), Err(FlowError::WrongStep { expected: 3, actual: 1 }));
  }

  #[test]
  fn activity_requires_selected_mission() {
    let mut s = StudentSession::new(assignment(), "Mina");
    s.submit_quiz(&[0, 1, 1]).unwrap();
    // force the step without a selection: advance_to must refuse
    assert_eq!(s.advance_to(Step::AwaitingActivity), Err(FlowError::NoMissionSelected));
    assert_eq!(s.step(), Step::AwaitingMissionChoice);
    assert!(s.install_scratch(MissionScratch::Writer(WriterPrompt { keywords: vec![], min_chars: 10 })).is_err());
  }

  #[test]
  fn quiz_answers_are_validated() {
    let mut s = StudentSession::new(assignment(), "Mina");
    assert_eq!(s.submit_quiz(&[0, 1]), Err(FlowError::AnswerCount { expected: 3, actual: 2 }));
    assert_eq!(s.submit_quiz(&[0, 1, 7]), Err(FlowError::InvalidOption { question: 3, option: 7 }));
    assert_eq!(s.step(), Step::AwaitingQuiz);
    assert_eq!(s.quiz_score(), None);
  }

  #[test]
  fn full_run_then_retry_clears_scores() {
    let mut s = StudentSession::new(assignment(), " Mina ");
    assert_eq!(s.student_name, "Mina");
    assert_eq!(s.submit_quiz(&[0, 1, 0]).unwrap(), 67);
    assert_eq!(s.recommendation(), Some(MissionId::Mystery20Questions));
    s.choose_mission(MissionId::Writer).unwrap();
    assert_eq!(s.step(), Step::AwaitingActivity);

    let scratch = MissionScratch::Writer(WriterPrompt { keywords: vec!["park".into()], min_chars: 10 });
    s.install_scratch(scratch).unwrap();
    assert!(s.scratch().is_some());

    assert!(s.report().is_none());
    s.complete_activity(writer_outcome(), report_for(MissionId::Writer, 85)).unwrap();
    assert_eq!(s.step(), Step::Report);
    assert_eq!(s.report().map(|r| r.total_score), Some(77));
    assert_eq!(s.activity_score(), Some(85));
    assert!(s.scratch().is_none());

    s.retry().unwrap();
    assert_eq!(s.step(), Step::AwaitingQuiz);
    assert_eq!(s.quiz_score(), None);
    assert_eq!(s.activity_score(), None);
    assert_eq!(s.selected_mission(), None);
    assert_eq!(s.runs_completed(), 1);
    assert_eq!(s.student_name, "Mina");
  }

  #[test]
  fn outcome_must_match_selected_mission() {
    let mut s = StudentSession::new(assignment(), "Mina");
    s.submit_quiz(&[0, 1, 1]).unwrap();
    s.choose_mission(MissionId::ImageDetective).unwrap();
    let err = s.complete_activity(writer_outcome(), report_for(MissionId::ImageDetective, 85)).unwrap_err();
    assert!(matches!(err, FlowError::MissionMismatch { .. }));
    assert_eq!(s.step(), Step::AwaitingActivity);
    let wrong = ActivityOutcome {
      score: 100,
      details: MissionDetails::Mystery20Questions {
        target: "dog".into(),
        guess: "dog".into(),
        correct: true,
        hints_used: 0,
        answer_revealed: false,
      },
    };
    assert!(s.complete_activity(wrong, report_for(MissionId::ImageDetective, 100)).is_err());
    let detective = ActivityOutcome {
      score: 30,
      details: MissionDetails::ImageDetective {
        target: "dog".into(),
        options: vec!["dog".into(), "cat".into(), "fog".into(), "spoon".into()],
        chosen: "cat".into(),
        chosen_kind: crate::domain::DistractorKind::Semantic,
        correct: false,
        image_source: "placeholder".into(),
      },
    };
    let mismatched_report = s.complete_activity(detective, report_for(MissionId::Writer, 30));
    assert!(mismatched_report.is_err());
    assert_eq!(s.step(), Step::AwaitingActivity);
    assert!(s.report().is_none());
  }

  #[test]
  fn retry_only_from_report() {
    let mut s = StudentSession::new(assignment(), "Mina");
    assert!(s.retry().is_err());
    s.submit_quiz(&[0, 1, 1]).unwrap();
    assert!(s.retry().is_err());
  }
}
