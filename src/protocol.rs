//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::unit_title;
use crate::domain::{AccessCode, Assignment, Difficulty, MissionId, QuizSource, Submission, Unit};
use crate::images::ImageOut;
use crate::missions::{word_guess::MAX_HINTS, MissionScratch};
use crate::report::Report;
use crate::session::{Step, StudentSession};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Enter {
        access_code: String,
        student_name: String,
    },
    SubmitQuiz {
        answers: Vec<usize>,
    },
    ChooseMission {
        mission: MissionId,
    },
    StartActivity,
    Hint,
    SubmitActivity {
        answer: String,
    },
    Report,
    Retry,
    Leave,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Session {
        session: SessionView,
    },
    QuizResult {
        result: QuizResultOut,
    },
    Activity {
        activity: ActivityOut,
    },
    Hint {
        hint: HintOut,
    },
    Report {
        report: Report,
    },
    Left,
    Error {
        error: String,
        message: String,
    },
}

//
// Session views
//

/// Quiz question as shown to students (no answer key).
#[derive(Debug, Serialize)]
pub struct QuizQuestionOut {
    pub question: String,
    pub options: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MissionOut {
    pub id: MissionId,
    pub title: &'static str,
    pub description: &'static str,
    pub recommended: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub student_name: String,
    pub access_code: AccessCode,
    pub unit: Unit,
    pub unit_title: &'static str,
    pub difficulty: Difficulty,
    pub text: String,
    pub step: u8,
    pub step_name: Step,
    pub quiz: Vec<QuizQuestionOut>,
    pub quiz_score: Option<u8>,
    pub recommended_mission: Option<MissionId>,
    pub missions: Vec<MissionOut>,
    pub selected_mission: Option<MissionId>,
    pub activity_score: Option<u8>,
    pub runs_completed: u32,
}

pub fn session_view(s: &StudentSession) -> SessionView {
    let recommended = s.recommendation();
    SessionView {
        session_id: s.id,
        student_name: s.student_name.clone(),
        access_code: s.assignment.access_code.clone(),
        unit: s.assignment.unit,
        unit_title: unit_title(s.assignment.unit),
        difficulty: s.assignment.difficulty,
        text: s.assignment.text.clone(),
        step: s.step().number(),
        step_name: s.step(),
        quiz: s
            .assignment
            .quiz
            .iter()
            .map(|q| QuizQuestionOut { question: q.question.clone(), options: q.options.clone() })
            .collect(),
        quiz_score: s.quiz_score(),
        recommended_mission: recommended,
        missions: missions_out(recommended),
        selected_mission: s.selected_mission(),
        activity_score: s.activity_score(),
        runs_completed: s.runs_completed(),
    }
}

pub fn missions_out(recommended: Option<MissionId>) -> Vec<MissionOut> {
    MissionId::ALL
        .iter()
        .map(|&m| MissionOut {
            id: m,
            title: m.title(),
            description: m.description(),
            recommended: recommended == Some(m),
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct QuizResultOut {
    pub quiz_score: u8,
    pub recommended_mission: MissionId,
    pub step: u8,
}

/// What the student sees for the active mission.
#[derive(Debug, Serialize)]
#[serde(tag = "mission", rename_all = "snake_case")]
pub enum ActivityView {
    ImageDetective {
        image: ImageOut,
        options: Vec<String>,
    },
    #[serde(rename = "mystery_20_questions")]
    Mystery20Questions {
        passage: String,
        hints: Vec<String>,
        hints_used: u8,
        max_hints: u8,
        answer_revealed: bool,
    },
    Writer {
        keywords: Vec<String>,
        min_chars: usize,
        instructions: String,
    },
}

pub fn activity_view(scratch: &MissionScratch) -> ActivityView {
    match scratch {
        MissionScratch::ImageGuess(r) => ActivityView::ImageDetective {
            image: ImageOut::from(&r.image),
            options: r.options.iter().map(|o| o.word.clone()).collect(),
        },
        MissionScratch::WordGuess(r) => ActivityView::Mystery20Questions {
            passage: r.blanked_passage.clone(),
            hints: r.hints(),
            hints_used: r.hints_used,
            max_hints: MAX_HINTS,
            answer_revealed: r.answer_revealed(),
        },
        MissionScratch::Writer(p) => ActivityView::Writer {
            keywords: p.keywords.clone(),
            min_chars: p.min_chars,
            instructions: p.instructions(),
        },
    }
}

#[derive(Debug, Serialize)]
pub struct ActivityOut {
    pub mission: MissionId,
    pub title: &'static str,
    pub activity: ActivityView,
    /// Degraded-service notices (fallback images, built-in choices).
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HintOut {
    pub hints: Vec<String>,
    pub hints_used: u8,
    pub max_hints: u8,
    pub answer_revealed: bool,
}

//
// HTTP request/response DTOs
//

#[derive(Deserialize)]
pub struct LoginIn {
    pub email: String,
    pub password: String,
}
#[derive(Serialize)]
pub struct LoginOut {
    pub token: String,
    pub email: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateAssignmentIn {
    pub unit: Unit,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub ai_quiz: bool,
}
#[derive(Debug, Serialize)]
pub struct AssignmentOut {
    pub assignment: Assignment,
    pub unit_title: &'static str,
    pub quiz_source: QuizSource,
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}
#[derive(Debug, Serialize)]
pub struct AssignmentsOut {
    pub assignments: Vec<Assignment>,
}
#[derive(Debug, Serialize)]
pub struct SubmissionsOut {
    pub access_code: AccessCode,
    pub submissions: Vec<Submission>,
}

#[derive(Debug, Serialize)]
pub struct UnitOut {
    pub unit: Unit,
    pub title: &'static str,
}
#[derive(Debug, Serialize)]
pub struct CatalogOut {
    pub units: Vec<UnitOut>,
    pub difficulties: Vec<Difficulty>,
    pub missions: Vec<MissionOut>,
}

#[derive(Debug, Deserialize)]
pub struct EnterIn {
    pub access_code: String,
    pub student_name: String,
}

#[derive(Debug, Deserialize)]
pub struct QuizIn {
    pub answers: Vec<usize>,
}

#[derive(Debug, Deserialize)]
pub struct MissionIn {
    pub mission: MissionId,
}

#[derive(Deserialize)]
pub struct ActivityIn {
    pub answer: String,
}

#[derive(Serialize)]
pub struct LeaveOut {
    pub left: bool,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
