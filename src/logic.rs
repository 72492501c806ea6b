//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Teacher sign-in, assignment publishing and dashboards
//!   - Student entry by access code
//!   - The four-step session flow (quiz, mission choice, activity, report)
//!   - Report composition with AI feedback and persisted submissions
//!
//! Every external call is bounded by the configured timeout. AI and image failures
//! degrade to local content and surface as warnings; store failures while saving a
//! result never block the report.

use chrono::Utc;
use rand::{rngs::StdRng, SeedableRng};
use tracing::{error, info, instrument, warn};

use crate::assist::{generate_feedback, generate_quiz, FeedbackRequest};
use crate::catalog::{passage, quiz_for, unit_title};
use crate::domain::{
  AccessCode, Assignment, AssignmentStatus, MissionId, QuizSource, Submission, Unit,
};
use crate::error::{AppError, AppResult};
use crate::identity::{AuthError, Identity};
use crate::missions::{prepare, score_activity, MissionScratch, PrepareContext};
use crate::protocol::*;
use crate::quiz::recommend_mission;
use crate::report::{canned_feedback, title_for, total_score, FeedbackSource, Report};
use crate::session::{FlowError, StudentSession};
use crate::state::AppState;
use crate::store::{from_document, to_document, FieldFilter, OrderBy, StoreError, ASSIGNMENTS, SUBMISSIONS};
use crate::util::with_deadline;

pub const WARN_BUILTIN_QUIZ: &str = "AI quiz generation is unavailable right now; using the textbook quiz.";
pub const WARN_CANNED_FEEDBACK: &str = "AI feedback is unavailable right now; showing standard feedback.";
pub const WARN_NOT_SAVED: &str = "Your result could not be saved. Please let your teacher know.";

/// Upper bound on rows pulled for a single dashboard listing.
const MAX_SCAN: usize = 500;

// -------- Teacher --------

#[instrument(level = "info", skip(state, password), fields(%email))]
pub async fn login(state: &AppState, email: &str, password: &str) -> AppResult<LoginOut> {
  let email = email.trim();
  if email.is_empty() || password.is_empty() {
    return Err(AppError::Validation("Please enter your email and password.".into()));
  }
  let identity = with_deadline(state.timeout(), state.identity.sign_in(email, password))
    .await
    .map_err(AuthError::Other)??;
  let token = state.issue_teacher_token(identity.clone()).await;
  Ok(LoginOut { token, email: identity.email, user_id: identity.user_id })
}

#[instrument(level = "info", skip(state, teacher), fields(unit = ?req.unit, difficulty = ?req.difficulty, ai_quiz = req.ai_quiz))]
pub async fn create_assignment(state: &AppState, teacher: &Identity, req: CreateAssignmentIn) -> AppResult<AssignmentOut> {
  let access_code = AccessCode::generate(&mut rand::thread_rng());
  let text = passage(req.unit, req.difficulty).to_string();
  let mut warnings = vec![];

  let mut quiz = quiz_for(req.unit);
  let mut quiz_source = QuizSource::Catalog;
  if req.ai_quiz {
    match &state.text_gen {
      Some(gen) => match generate_quiz(gen.as_ref(), &state.prompts, &text, state.timeout()).await {
        Ok(q) => {
          quiz = q;
          quiz_source = QuizSource::Generated;
        }
        Err(e) => {
          warn!(target: "readfit_backend", error = %e, "AI quiz rejected; using textbook quiz");
          warnings.push(WARN_BUILTIN_QUIZ.to_string());
        }
      },
      None => warnings.push(WARN_BUILTIN_QUIZ.to_string()),
    }
  }

  let assignment = Assignment {
    access_code: access_code.clone(),
    unit: req.unit,
    difficulty: req.difficulty,
    text,
    quiz,
    quiz_source: quiz_source.clone(),
    status: AssignmentStatus::Active,
    created_at: Utc::now(),
    created_by: Some(teacher.email.clone()),
  };
  let doc = to_document(&assignment)?;
  bounded_store(state, state.store.set(ASSIGNMENTS, access_code.as_str(), doc)).await?;
  info!(target: "store", code = %access_code, unit = ?assignment.unit, source = ?quiz_source, "Assignment published");

  Ok(AssignmentOut { unit_title: unit_title(assignment.unit), quiz_source, assignment, warnings })
}

#[instrument(level = "info", skip(state))]
pub async fn list_assignments(state: &AppState, limit: Option<usize>) -> AppResult<AssignmentsOut> {
  let limit = limit.unwrap_or(state.settings.list_limit).clamp(1, MAX_SCAN);
  let order = OrderBy { field: "created_at".into(), descending: true };
  let docs = bounded_store(state, state.store.query(ASSIGNMENTS, None, Some(order), limit)).await?;
  Ok(AssignmentsOut { assignments: decode_rows(docs) })
}

/// Newest first, ordered by the store. On Firestore this needs the composite index
/// (`access_code` ASC, `timestamp` DESC) on `readfit_submissions`.
#[instrument(level = "info", skip(state))]
pub async fn list_submissions(state: &AppState, code: &str, limit: Option<usize>) -> AppResult<SubmissionsOut> {
  let access_code = AccessCode::parse(code).map_err(AppError::Validation)?;
  let limit = limit.unwrap_or(state.settings.list_limit).clamp(1, MAX_SCAN);
  let filter = FieldFilter { field: "access_code".into(), value: serde_json::Value::String(access_code.to_string()) };
  let order = OrderBy { field: "timestamp".into(), descending: true };
  let docs = bounded_store(state, state.store.query(SUBMISSIONS, Some(filter), Some(order), limit)).await?;
  Ok(SubmissionsOut { access_code, submissions: decode_rows(docs) })
}

pub fn catalog() -> CatalogOut {
  CatalogOut {
    units: Unit::ALL.iter().map(|&unit| UnitOut { unit, title: unit_title(unit) }).collect(),
    difficulties: crate::domain::Difficulty::ALL.to_vec(),
    missions: missions_out(None),
  }
}

// -------- Student --------

/// Validate the code and name, then open a fresh session at step 1.
#[instrument(level = "info", skip(state), fields(%code))]
pub async fn enter(state: &AppState, code: &str, student_name: &str) -> AppResult<StudentSession> {
  let access_code = AccessCode::parse(code).map_err(AppError::Validation)?;
  if student_name.trim().is_empty() {
    return Err(AppError::Validation("Please enter your name.".into()));
  }
  let assignment = lookup_assignment(state, &access_code).await?;
  let session = StudentSession::new(assignment, student_name);
  info!(target: "session", id = %session.id, code = %access_code, "Student entered");
  Ok(session)
}

async fn lookup_assignment(state: &AppState, code: &AccessCode) -> AppResult<Assignment> {
  let doc = bounded_store(state, state.store.get(ASSIGNMENTS, code.as_str()))
    .await?
    .ok_or_else(|| AppError::NotFound("Invalid access code. Please check with your teacher.".into()))?;
  Ok(from_document(doc)?)
}

#[instrument(level = "info", skip(session, answers), fields(id = %session.id, answers = answers.len()))]
pub fn submit_quiz(session: &mut StudentSession, answers: &[usize]) -> AppResult<QuizResultOut> {
  let quiz_score = session.submit_quiz(answers)?;
  let recommended_mission = recommend_mission(quiz_score);
  info!(target: "session", id = %session.id, quiz_score, recommended = %recommended_mission, "Quiz scored");
  Ok(QuizResultOut { quiz_score, recommended_mission, step: session.step().number() })
}

#[instrument(level = "info", skip(session), fields(id = %session.id))]
pub fn choose_mission(session: &mut StudentSession, mission: MissionId) -> AppResult<SessionView> {
  session.choose_mission(mission)?;
  info!(target: "session", id = %session.id, %mission, "Mission chosen");
  Ok(session_view(session))
}

/// Step 3 entry: prepares the mission on first call and reuses it afterwards.
#[instrument(level = "info", skip(state, session), fields(id = %session.id))]
pub async fn start_activity(state: &AppState, session: &mut StudentSession) -> AppResult<ActivityOut> {
  let mission = session.activity_mission()?;
  let mut warnings = vec![];
  if session.scratch().is_none() {
    let ctx = PrepareContext {
      passage: &session.assignment.text,
      prompts: &state.prompts,
      text_gen: state.text_gen.as_deref(),
      images: &state.images,
      timeout: state.timeout(),
      writer_min_chars: state.settings.writer_min_chars,
    };
    let mut rng = StdRng::from_entropy();
    let (scratch, w) = prepare(mission, &ctx, &mut rng).await;
    warnings = w;
    session.install_scratch(scratch)?;
  }
  let scratch = session.scratch().ok_or(FlowError::ActivityNotStarted)?;
  Ok(ActivityOut { mission, title: mission.title(), activity: activity_view(scratch), warnings })
}

#[instrument(level = "info", skip(session), fields(id = %session.id))]
pub fn hint(session: &mut StudentSession) -> AppResult<HintOut> {
  let mission = session.activity_mission()?;
  if mission != MissionId::Mystery20Questions {
    return Err(AppError::Validation("Hints are only available in Mystery 20 Questions.".into()));
  }
  match session.scratch_mut() {
    Some(MissionScratch::WordGuess(round)) => {
      round.reveal_next();
      Ok(HintOut {
        hints: round.hints(),
        hints_used: round.hints_used,
        max_hints: crate::missions::word_guess::MAX_HINTS,
        answer_revealed: round.answer_revealed(),
      })
    }
    _ => Err(FlowError::ActivityNotStarted.into()),
  }
}

/// Step 3 → 4: score, compose the report, persist the submission.
///
/// The session stays at step 3 across every await; the step only moves once the
/// report exists, so a dropped request leaves the activity open for another try.
#[instrument(level = "info", skip(state, session, answer), fields(id = %session.id, answer_len = answer.len()))]
pub async fn submit_activity(state: &AppState, session: &mut StudentSession, answer: &str) -> AppResult<Report> {
  let mission = session.activity_mission()?;
  let scratch = session.scratch().ok_or(FlowError::ActivityNotStarted)?;
  let outcome = score_activity(scratch, answer).map_err(AppError::Validation)?;

  let quiz_score = session.quiz_score().ok_or(FlowError::QuizNotSubmitted)?;
  let activity_score = outcome.score;
  let total = total_score(quiz_score, activity_score);
  let title = title_for(total);
  let mut warnings = vec![];

  let details_json = serde_json::to_string(&outcome.details).unwrap_or_default();
  let generated = match &state.text_gen {
    Some(gen) => {
      let req = FeedbackRequest {
        student: &session.student_name,
        mission: mission.title(),
        quiz_score,
        activity_score,
        total_score: total,
        title,
        details_json: &details_json,
      };
      generate_feedback(gen.as_ref(), &state.prompts, &req, state.timeout())
        .await
        .map_err(|e| warn!(target: "mission", error = %e, "Feedback generation failed; using canned text"))
        .ok()
    }
    None => None,
  };
  let (feedback, feedback_source) = match generated {
    Some(text) => (text, FeedbackSource::Generated),
    None => {
      warnings.push(WARN_CANNED_FEEDBACK.to_string());
      (canned_feedback(mission, quiz_score, activity_score, total), FeedbackSource::Fallback)
    }
  };

  let submission = Submission {
    access_code: session.assignment.access_code.clone(),
    student_name: session.student_name.clone(),
    quiz_score,
    activity_score,
    total_score: total,
    title: title.to_string(),
    mission_id: mission,
    mission_details: outcome.details.clone(),
    timestamp: Utc::now(),
  };
  let saved = match save_submission(state, &submission).await {
    Ok(key) => {
      info!(target: "store", %key, code = %submission.access_code, total, "Submission saved");
      true
    }
    Err(e) => {
      error!(target: "store", error = %e, code = %submission.access_code, "Submission not saved");
      warnings.push(WARN_NOT_SAVED.to_string());
      false
    }
  };

  let report = Report {
    mission,
    quiz_score,
    activity_score,
    total_score: total,
    title: title.to_string(),
    feedback,
    feedback_source,
    saved,
    warnings,
  };
  session.complete_activity(outcome, report.clone())?;
  info!(target: "session", id = %session.id, %mission, quiz_score, activity_score, total, %title, "Report ready");
  Ok(report)
}

async fn save_submission(state: &AppState, submission: &Submission) -> Result<String, StoreError> {
  let doc = to_document(submission)?;
  bounded_store(state, state.store.add(SUBMISSIONS, doc)).await
}

pub fn report(session: &StudentSession) -> AppResult<Report> {
  session.report().cloned().ok_or_else(|| FlowError::ActivityIncomplete.into())
}

#[instrument(level = "info", skip(session), fields(id = %session.id))]
pub fn retry(session: &mut StudentSession) -> AppResult<SessionView> {
  session.retry()?;
  info!(target: "session", id = %session.id, runs = session.runs_completed(), "Session restarted");
  Ok(session_view(session))
}

// -------- Local helpers --------

async fn bounded_store<T, F>(state: &AppState, fut: F) -> Result<T, StoreError>
where
  F: std::future::Future<Output = Result<T, StoreError>>,
{
  with_deadline(state.timeout(), fut).await.map_err(StoreError::Request)?
}

/// Decode store rows, skipping (and logging) any that no longer match the schema.
fn decode_rows<T: serde::de::DeserializeOwned>(docs: Vec<crate::store::Document>) -> Vec<T> {
  docs
    .into_iter()
    .filter_map(|d| match from_document::<T>(d) {
      Ok(v) => Some(v),
      Err(e) => {
        warn!(target: "store", error = %e, "Skipping malformed row");
        None
      }
    })
    .collect()
}
