//! Domain models: units/difficulties, quiz questions, assignments, submissions and missions.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Textbook unit an assignment is built from.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Unit {
  #[serde(rename = "Unit 1")] Unit1,
  #[serde(rename = "Unit 2")] Unit2,
  #[serde(rename = "Unit 3")] Unit3,
  #[serde(rename = "Unit 4")] Unit4,
  #[serde(rename = "Unit 5")] Unit5,
  #[serde(rename = "Unit 6")] Unit6,
  #[serde(rename = "Unit 7")] Unit7,
  #[serde(rename = "Unit 8")] Unit8,
}

impl Unit {
  pub const ALL: [Unit; 8] = [
    Unit::Unit1, Unit::Unit2, Unit::Unit3, Unit::Unit4,
    Unit::Unit5, Unit::Unit6, Unit::Unit7, Unit::Unit8,
  ];

  /// Zero-based position in the catalog.
  pub fn index(self) -> usize {
    self as usize
  }

  pub fn label(self) -> String {
    format!("Unit {}", self.index() + 1)
  }
}

/// Passage tier. Korean labels from the teacher UI (상/중/하) are accepted on input.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  #[serde(alias = "하", alias = "Beginner")]
  Beginner,
  #[serde(alias = "중", alias = "Intermediate")]
  Intermediate,
  #[serde(alias = "상", alias = "Advanced")]
  Advanced,
}

impl Difficulty {
  pub const ALL: [Difficulty; 3] = [Difficulty::Beginner, Difficulty::Intermediate, Difficulty::Advanced];

  pub fn index(self) -> usize {
    self as usize
  }
}

/// One multiple-choice question. `answer` indexes into `options`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizQuestion {
  pub question: String,
  pub options: Vec<String>,
  pub answer: usize,
}

impl QuizQuestion {
  /// Structural check used before accepting externally generated questions.
  pub fn validate(&self) -> Result<(), String> {
    if self.question.trim().is_empty() {
      return Err("question text is empty".into());
    }
    if !(3..=4).contains(&self.options.len()) {
      return Err(format!("expected 3-4 options, got {}", self.options.len()));
    }
    if self.options.iter().any(|o| o.trim().is_empty()) {
      return Err("empty option".into());
    }
    for (i, a) in self.options.iter().enumerate() {
      if self.options[i + 1..].iter().any(|b| b.trim().eq_ignore_ascii_case(a.trim())) {
        return Err(format!("duplicate option '{}'", a));
      }
    }
    if self.answer >= self.options.len() {
      return Err(format!("answer index {} out of range", self.answer));
    }
    Ok(())
  }
}

/// Six-digit numeric code students type to open an assignment.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct AccessCode(String);

impl AccessCode {
  pub const LEN: usize = 6;

  /// Parse user input. `Err` carries the user-facing message.
  pub fn parse(raw: &str) -> Result<Self, String> {
    let code = raw.trim();
    if code.is_empty() {
      return Err("Please enter an access code.".into());
    }
    if code.len() != Self::LEN || !code.bytes().all(|b| b.is_ascii_digit()) {
      return Err("Access codes are exactly 6 digits.".into());
    }
    Ok(Self(code.to_string()))
  }

  /// Fresh random code. Not checked against existing assignments.
  pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
    let code: String = (0..Self::LEN).map(|_| char::from(b'0' + rng.gen_range(0..10u8))).collect();
    Self(code)
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for AccessCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
  Active,
}

/// Where the quiz of an assignment came from.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuizSource {
  Catalog,
  Generated,
}

impl Default for QuizSource {
  fn default() -> Self { QuizSource::Catalog }
}

/// Teacher-published reading assignment, keyed by access code. Never mutated after creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Assignment {
  pub access_code: AccessCode,
  pub unit: Unit,
  pub difficulty: Difficulty,
  pub text: String,
  pub quiz: Vec<QuizQuestion>,
  #[serde(default)] pub quiz_source: QuizSource,
  pub status: AssignmentStatus,
  #[serde(with = "stored_time")]
  pub created_at: DateTime<Utc>,
  #[serde(default)] pub created_by: Option<String>,
}

/// The three post-quiz activities.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MissionId {
  ImageDetective,
  #[serde(rename = "mystery_20_questions")]
  Mystery20Questions,
  Writer,
}

impl MissionId {
  pub const ALL: [MissionId; 3] = [MissionId::ImageDetective, MissionId::Mystery20Questions, MissionId::Writer];

  pub fn as_str(self) -> &'static str {
    match self {
      MissionId::ImageDetective => "image_detective",
      MissionId::Mystery20Questions => "mystery_20_questions",
      MissionId::Writer => "writer",
    }
  }

  pub fn title(self) -> &'static str {
    match self {
      MissionId::ImageDetective => "Image Detective",
      MissionId::Mystery20Questions => "Mystery 20 Questions",
      MissionId::Writer => "Bestseller Writer",
    }
  }

  pub fn description(self) -> &'static str {
    match self {
      MissionId::ImageDetective => "Look at the picture and guess the word!",
      MissionId::Mystery20Questions => "Use the hints to find the hidden word!",
      MissionId::Writer => "Imagine what happens next and write it!",
    }
  }
}

impl fmt::Display for MissionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// How an image-guess option relates to the target word.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DistractorKind {
  Correct,
  Semantic,
  Spelling,
  Random,
}

/// Mission-specific payload stored with a submission.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mission", rename_all = "snake_case")]
pub enum MissionDetails {
  ImageDetective {
    target: String,
    options: Vec<String>,
    chosen: String,
    chosen_kind: DistractorKind,
    correct: bool,
    image_source: String,
  },
  #[serde(rename = "mystery_20_questions")]
  Mystery20Questions {
    target: String,
    guess: String,
    correct: bool,
    hints_used: u8,
    answer_revealed: bool,
  },
  Writer {
    keywords: Vec<String>,
    text: String,
    char_count: usize,
    keywords_used: Vec<String>,
  },
}

impl MissionDetails {
  pub fn mission(&self) -> MissionId {
    match self {
      MissionDetails::ImageDetective { .. } => MissionId::ImageDetective,
      MissionDetails::Mystery20Questions { .. } => MissionId::Mystery20Questions,
      MissionDetails::Writer { .. } => MissionId::Writer,
    }
  }
}

/// A completed student run, appended once and never updated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Submission {
  pub access_code: AccessCode,
  pub student_name: String,
  pub quiz_score: u8,
  pub activity_score: u8,
  pub total_score: u8,
  pub title: String,
  pub mission_id: MissionId,
  pub mission_details: MissionDetails,
  #[serde(with = "stored_time")]
  pub timestamp: DateTime<Utc>,
}

/// RFC 3339 with exactly three fractional digits, so stored timestamps sort as strings.
pub mod stored_time {
  use chrono::{DateTime, SecondsFormat, Utc};
  use serde::{de::Error, Deserialize, Deserializer, Serializer};

  pub fn format(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
  }

  pub fn serialize<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format(at))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(d)?;
    DateTime::parse_from_rfc3339(&raw)
      .map(|t| t.with_timezone(&Utc))
      .map_err(D::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::{rngs::StdRng, SeedableRng};

  #[test]
  fn stored_times_sort_as_strings() {
    use chrono::TimeZone;
    let whole = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let half = whole + chrono::Duration::milliseconds(500);
    let a = stored_time::format(&whole);
    let b = stored_time::format(&half);
    assert_eq!(a, "2024-03-01T09:00:00.000Z");
    assert_eq!(b, "2024-03-01T09:00:00.500Z");
    assert!(a < b);

    let sub = Submission {
      access_code: AccessCode::parse("123456").unwrap(),
      student_name: "Mina".into(),
      quiz_score: 67,
      activity_score: 85,
      total_score: 77,
      title: "Hard-Working Student".into(),
      mission_id: MissionId::Writer,
      mission_details: MissionDetails::Writer {
        keywords: vec!["park".into()],
        text: "A story.".into(),
        char_count: 8,
        keywords_used: vec![],
      },
      timestamp: half,
    };
    let v = serde_json::to_value(&sub).unwrap();
    assert_eq!(v["timestamp"], "2024-03-01T09:00:00.500Z");
    let back: Submission = serde_json::from_value(v).unwrap();
    assert_eq!(back.timestamp, half);
    let older: Submission = serde_json::from_value(serde_json::json!({
      "access_code": "123456", "student_name": "Mina", "quiz_score": 0, "activity_score": 0,
      "total_score": 0, "title": "Rising Star", "mission_id": "writer",
      "mission_details": {"mission": "writer", "keywords": [], "text": "x", "char_count": 1, "keywords_used": []},
      "timestamp": "2024-03-01T09:00:00Z"
    }))
    .unwrap();
    assert_eq!(older.timestamp, whole);
  }

  #[test]
  fn access_code_validation_messages() {
    assert!(AccessCode::parse("").unwrap_err().contains("enter"));
    assert!(AccessCode::parse("12a456").is_err());
    assert!(AccessCode::parse("12345").is_err());
    assert_eq!(AccessCode::parse(" 012345 ").unwrap().as_str(), "012345");
  }

  #[test]
  fn generated_codes_are_six_digits() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
      let code = AccessCode::generate(&mut rng);
      assert!(AccessCode::parse(code.as_str()).is_ok(), "bad code {code}");
    }
  }

  #[test]
  fn difficulty_accepts_korean_labels() {
    let d: Difficulty = serde_json::from_str("\"상\"").unwrap();
    assert_eq!(d, Difficulty::Advanced);
    let d: Difficulty = serde_json::from_str("\"beginner\"").unwrap();
    assert_eq!(d, Difficulty::Beginner);
  }

  #[test]
  fn unit_and_mission_wire_names() {
    assert_eq!(serde_json::to_string(&Unit::Unit3).unwrap(), "\"Unit 3\"");
    assert_eq!(serde_json::to_string(&MissionId::Mystery20Questions).unwrap(), "\"mystery_20_questions\"");
    let m: MissionId = serde_json::from_str("\"image_detective\"").unwrap();
    assert_eq!(m, MissionId::ImageDetective);
  }

  #[test]
  fn question_validation_rejects_bad_shapes() {
    let mut q = QuizQuestion { question: "Q?".into(), options: vec!["a".into(), "b".into(), "c".into()], answer: 2 };
    assert!(q.validate().is_ok());
    q.answer = 3;
    assert!(q.validate().is_err());
    q.answer = 0;
    q.options.push("A".into());
    assert!(q.validate().is_err());
    q.options = vec!["a".into(), "b".into()];
    assert!(q.validate().is_err());
  }
}
