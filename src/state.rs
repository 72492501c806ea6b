//! Application state: collaborators, prompts, tunables, and live sessions.
//!
//! This module owns:
//!   - the document store (Firestore when configured, in-memory otherwise)
//!   - the teacher identity provider
//!   - the optional text model and the ordered image provider chain
//!   - HTTP student sessions (by id) and teacher sign-in tokens

use std::{
  collections::HashMap,
  sync::{Arc, Weak},
  time::Duration,
};

use tokio::{
  sync::{Mutex, RwLock},
  task::JoinHandle,
  time::{interval, Instant, MissedTickBehavior},
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::assist::TextGenerator;
use crate::config::{load_config_from_env, AppConfig, Prompts, Settings};
use crate::error::AppError;
use crate::identity::{FirebaseIdentity, Identity, IdentityProvider};
use crate::images::{ImageChain, ImageProvider, Placeholder, StockPhoto};
use crate::openai::OpenAI;
use crate::session::StudentSession;
use crate::store::{DocumentStore, FirestoreStore, MemoryStore};

pub type SharedSession = Arc<Mutex<StudentSession>>;

/// A map value plus the last time a request used it.
struct Touched<T> {
  value: T,
  at: Instant,
}

impl<T> Touched<T> {
  fn new(value: T) -> Self {
    Self { value, at: Instant::now() }
  }
}

pub struct AppState {
  pub store: Arc<dyn DocumentStore>,
  pub identity: Arc<dyn IdentityProvider>,
  pub text_gen: Option<Arc<dyn TextGenerator>>,
  pub images: ImageChain,
  pub prompts: Prompts,
  pub settings: Settings,
  sessions: RwLock<HashMap<Uuid, Touched<SharedSession>>>,
  teacher_tokens: RwLock<HashMap<String, Touched<Identity>>>,
}

impl AppState {
  /// Build state from env: load config, pick the store, init OpenAI and image providers.
  #[instrument(level = "info", skip_all)]
  pub fn new() -> Self {
    let cfg = load_config_from_env().unwrap_or_default();

    let store: Arc<dyn DocumentStore> = match FirestoreStore::from_env() {
      Some(fs) => {
        info!(target: "store", project = %fs.project_id(), "Firestore store enabled.");
        Arc::new(fs)
      }
      None => {
        warn!(target: "store", "FIRESTORE_PROJECT_ID not set; using in-memory store (data is lost on restart).");
        Arc::new(MemoryStore::new())
      }
    };

    let firebase = FirebaseIdentity::from_env();
    if !firebase.is_configured() {
      warn!(target: "readfit_backend", "FIREBASE_WEB_API_KEY not set; teacher sign-in will fail.");
    }

    let openai = OpenAI::from_env(&cfg.prompts.image_prompt_template);
    let mut providers: Vec<Arc<dyn ImageProvider>> = vec![];
    let text_gen: Option<Arc<dyn TextGenerator>> = match openai {
      Some(oa) => {
        info!(target: "readfit_backend", base_url = %oa.base_url, text_model = %oa.text_model, image_model = %oa.image_model, "OpenAI enabled.");
        let oa = Arc::new(oa);
        providers.push(oa.clone());
        Some(oa as Arc<dyn TextGenerator>)
      }
      None => {
        info!(target: "readfit_backend", "OpenAI disabled (no OPENAI_API_KEY). Using built-in content.");
        None
      }
    };
    providers.push(Arc::new(StockPhoto::from_env()));
    providers.push(Arc::new(Placeholder));

    let images = ImageChain::new(providers, Duration::from_secs(cfg.settings.external_timeout_secs));
    info!(target: "readfit_backend", providers = ?images.provider_names(), "Image chain ready");

    Self::with_parts(store, Arc::new(firebase), text_gen, images, cfg)
  }

  /// Assemble state from explicit collaborators.
  pub fn with_parts(
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    text_gen: Option<Arc<dyn TextGenerator>>,
    images: ImageChain,
    cfg: AppConfig,
  ) -> Self {
    Self {
      store,
      identity,
      text_gen,
      images,
      prompts: cfg.prompts,
      settings: cfg.settings,
      sessions: RwLock::new(HashMap::new()),
      teacher_tokens: RwLock::new(HashMap::new()),
    }
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.settings.external_timeout_secs)
  }

  pub async fn insert_session(&self, session: StudentSession) -> Uuid {
    let id = session.id;
    self.sessions.write().await.insert(id, Touched::new(Arc::new(Mutex::new(session))));
    id
  }

  /// Looks up a live session and marks it as used.
  pub async fn session(&self, id: Uuid) -> Result<SharedSession, AppError> {
    let mut sessions = self.sessions.write().await;
    let entry = sessions
      .get_mut(&id)
      .ok_or_else(|| AppError::NotFound("Session not found. Please enter your access code again.".into()))?;
    entry.at = Instant::now();
    Ok(entry.value.clone())
  }

  pub async fn remove_session(&self, id: Uuid) -> bool {
    self.sessions.write().await.remove(&id).is_some()
  }

  pub async fn session_count(&self) -> usize {
    self.sessions.read().await.len()
  }

  pub async fn issue_teacher_token(&self, identity: Identity) -> String {
    let token = Uuid::new_v4().simple().to_string();
    self.teacher_tokens.write().await.insert(token.clone(), Touched::new(identity));
    token
  }

  pub async fn teacher(&self, token: Option<&str>) -> Result<Identity, AppError> {
    let token = token.ok_or(AppError::Unauthorized)?;
    let mut tokens = self.teacher_tokens.write().await;
    let entry = tokens.get_mut(token).ok_or(AppError::Unauthorized)?;
    entry.at = Instant::now();
    Ok(entry.value.clone())
  }

  /// Drop sessions and teacher tokens idle longer than their configured limits as of `now`.
  /// Returns how many of each were removed.
  pub async fn evict_idle(&self, now: Instant) -> (usize, usize) {
    let session_idle = Duration::from_secs(self.settings.session_idle_secs);
    let token_idle = Duration::from_secs(self.settings.teacher_token_idle_secs);

    let mut sessions = self.sessions.write().await;
    let before = sessions.len();
    sessions.retain(|_, e| now.saturating_duration_since(e.at) < session_idle);
    let sessions_dropped = before - sessions.len();
    drop(sessions);

    let mut tokens = self.teacher_tokens.write().await;
    let before = tokens.len();
    tokens.retain(|_, e| now.saturating_duration_since(e.at) < token_idle);
    let tokens_dropped = before - tokens.len();

    if sessions_dropped + tokens_dropped > 0 {
      info!(target: "session", sessions_dropped, tokens_dropped, "Evicted idle entries");
    }
    (sessions_dropped, tokens_dropped)
  }
}

/// Periodic idle sweep. The task ends once the state is dropped.
pub fn spawn_idle_sweeper(state: &Arc<AppState>) -> JoinHandle<()> {
  let weak: Weak<AppState> = Arc::downgrade(state);
  let period = Duration::from_secs(state.settings.sweep_interval_secs.max(1));
  tokio::spawn(async move {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    loop {
      ticker.tick().await;
      let Some(state) = weak.upgrade() else {
        debug!(target: "session", "State dropped; idle sweeper stopping");
        break;
      };
      state.evict_idle(Instant::now()).await;
    }
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog;
  use crate::domain::{AccessCode, Assignment, AssignmentStatus, Difficulty, QuizSource, Unit};
  use crate::identity::AuthError;
  use async_trait::async_trait;
  use chrono::Utc;

  struct NoIdentity;

  #[async_trait]
  impl IdentityProvider for NoIdentity {
    async fn sign_in(&self, _: &str, _: &str) -> Result<Identity, AuthError> {
      Err(AuthError::UserNotFound)
    }
  }

  fn state(session_idle_secs: u64, teacher_token_idle_secs: u64) -> AppState {
    let mut cfg = AppConfig::default();
    cfg.settings.session_idle_secs = session_idle_secs;
    cfg.settings.teacher_token_idle_secs = teacher_token_idle_secs;
    let images = ImageChain::new(vec![Arc::new(Placeholder) as Arc<dyn ImageProvider>], Duration::from_secs(1));
    AppState::with_parts(Arc::new(MemoryStore::new()), Arc::new(NoIdentity), None, images, cfg)
  }

  fn student() -> StudentSession {
    let assignment = Assignment {
      access_code: AccessCode::parse("482913").unwrap(),
      unit: Unit::Unit2,
      difficulty: Difficulty::Intermediate,
      text: catalog::passage(Unit::Unit2, Difficulty::Intermediate).to_string(),
      quiz: catalog::quiz_for(Unit::Unit2),
      quiz_source: QuizSource::Catalog,
      status: AssignmentStatus::Active,
      created_at: Utc::now(),
      created_by: None,
    };
    StudentSession::new(assignment, "Dana")
  }

  fn teacher() -> Identity {
    Identity { email: "t@school.kr".into(), user_id: "t-9".into() }
  }

  #[tokio::test]
  async fn idle_sessions_and_tokens_are_evicted() {
    let state = state(60, 600);
    let idle = state.insert_session(student()).await;
    let token = state.issue_teacher_token(teacher()).await;

    let now = Instant::now();
    assert_eq!(state.evict_idle(now).await, (0, 0));
    assert_eq!(state.evict_idle(now + Duration::from_secs(61)).await, (1, 0));
    assert!(state.session(idle).await.is_err());
    assert!(state.teacher(Some(token.as_str())).await.is_ok());

    assert_eq!(state.evict_idle(now + Duration::from_secs(601)).await, (0, 1));
    assert!(matches!(state.teacher(Some(token.as_str())).await, Err(AppError::Unauthorized)));
  }

  #[tokio::test]
  async fn lookups_keep_entries_alive() {
    let state = state(60, 60);
    let used = state.insert_session(student()).await;
    let abandoned = state.insert_session(student()).await;
    let token = state.issue_teacher_token(teacher()).await;
    let inserted = Instant::now();

    tokio::time::sleep(Duration::from_millis(50)).await;
    state.session(used).await.unwrap();
    state.teacher(Some(token.as_str())).await.unwrap();

    let later = inserted + Duration::from_millis(60_010);
    assert_eq!(state.evict_idle(later).await, (1, 0));
    assert!(state.session(used).await.is_ok());
    assert!(state.session(abandoned).await.is_err());
  }

  #[tokio::test]
  async fn sweeper_runs_on_its_interval() {
    let mut idle_state = state(0, 0);
    idle_state.settings.sweep_interval_secs = 1;
    let state = Arc::new(idle_state);
    state.insert_session(student()).await;
    let sweeper = spawn_idle_sweeper(&state);

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(state.session_count().await, 0);
    sweeper.abort();
  }
}
