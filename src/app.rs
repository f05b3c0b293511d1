use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::AnalysisResult;
use crate::analyzer::Analyzer;
use crate::conversation::{ConversationInput, Submission};
use crate::error::{GossipError, Result};
use crate::model::LanguageModel;
use crate::render::ActiveCard;
use crate::store::{ConversationStore, LoadOutcome, StoredRecord};

pub const NOT_CONFIGURED: &str =
    "Gemini API is not configured. Please add your API key (GEMINI_API_KEY) to continue.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Overview,
    NewSubmission,
    Results,
}

/// Submission flow and view state, with the model and store injected.
pub struct App<M, S> {
    analyzer: Option<Analyzer<M>>,
    store: S,
    history: LoadOutcome,
    view: View,
    current: Option<AnalysisResult>,
    active_card: Option<ActiveCard>,
}

impl<M: LanguageModel, S: ConversationStore> App<M, S> {
    /// `analyzer` is `None` when no language-API key is configured; the app
    /// still browses history but refuses new submissions.
    pub fn new(analyzer: Option<Analyzer<M>>, store: S) -> Self {
        Self {
            analyzer,
            store,
            history: LoadOutcome::Loaded(Vec::new()),
            view: View::Overview,
            current: None,
            active_card: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.analyzer.is_some()
    }

    pub fn analyzer(&self) -> Option<&Analyzer<M>> {
        self.analyzer.as_ref()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn history(&self) -> &LoadOutcome {
        &self.history
    }

    pub fn current(&self) -> Option<&AnalysisResult> {
        self.current.as_ref()
    }

    pub fn active_card(&self) -> Option<ActiveCard> {
        self.active_card
    }

    pub fn select_card(&mut self, card: ActiveCard) {
        self.active_card = Some(card);
    }

    /// Replaces the in-memory history wholesale with the store's contents.
    pub async fn refresh(&mut self) -> &LoadOutcome {
        self.history = LoadOutcome::fetch(&self.store).await;
        &self.history
    }

    pub fn show_overview(&mut self) {
        self.view = View::Overview;
        self.current = None;
        self.active_card = None;
    }

    pub fn start_submission(&mut self) {
        self.view = View::NewSubmission;
        self.current = None;
        self.active_card = None;
    }

    /// Shows a stored record; `None` selects the newest.
    pub fn open(&mut self, id: Option<Uuid>) -> Option<&StoredRecord> {
        let records = self.history.records();
        let record = match id {
            Some(id) => records.iter().find(|r| r.id() == id),
            None => records.first(),
        }?;
        self.current = Some(record.analysis.clone());
        self.active_card = ActiveCard::default_for(&record.analysis);
        self.view = View::Results;
        Some(record)
    }

    /// Validates, transcribes audio if present, analyses, saves and reloads.
    ///
    /// Nothing external is called when validation fails or the model is not
    /// configured. On any failure the view returns to the submission form.
    ///
    /// Once the save succeeds the submission counts as done: a failed reload
    /// only leaves the history marked unavailable.
    pub async fn submit(&mut self, submission: Submission) -> Result<StoredRecord> {
        self.start_submission();
        submission.validate()?;
        let analyzer = self
            .analyzer
            .as_ref()
            .ok_or_else(|| GossipError::NotConfigured(NOT_CONFIGURED.into()))?;

        self.view = View::Results;
        let outcome = Self::run_analysis(analyzer, &self.store, submission).await;
        let (conversation, analysis) = match outcome {
            Ok(done) => done,
            Err(e) => {
                self.view = View::NewSubmission;
                return Err(e);
            }
        };

        self.active_card = ActiveCard::default_for(&analysis);
        self.current = Some(analysis.clone());

        if let LoadOutcome::Unavailable(reason) = self.refresh().await {
            warn!(id = %conversation.id, %reason, "saved conversation but could not reload history");
        }
        Ok(StoredRecord {
            created_at: conversation.created_at,
            conversation,
            analysis,
        })
    }

    async fn run_analysis(
        analyzer: &Analyzer<M>,
        store: &S,
        submission: Submission,
    ) -> Result<(ConversationInput, AnalysisResult)> {
        let audio_analysis = match &submission.audio {
            Some(audio) => Some(analyzer.analyze_audio(audio).await?),
            None => None,
        };
        let transcript = audio_analysis.as_ref().map(|a| a.transcribed_text.clone());
        let conversation = submission.into_conversation(transcript);

        let decoded = analyzer.analyze_conversation(&conversation).await?;
        if decoded.result.is_empty() {
            warn!(id = %conversation.id, "model reply contained no recognised sections");
        }
        let mut analysis = decoded.result;
        if analysis.audio_analysis.is_none() {
            analysis.audio_analysis = audio_analysis;
        }

        store.save(&conversation, &analysis).await?;
        info!(id = %conversation.id, "submission analysed and stored");
        Ok((conversation, analysis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::tests::ScriptedModel;
    use crate::conversation::{EMPTY_SUBMISSION, Media};
    use crate::model::Part;
    use crate::store::LocalStore;
    use tempfile::TempDir;

    const ANALYSIS: &str = "```json\n{\"summary\": {\"mainEmotionEmoji\": \"😅\", \"summaryText\": \"Awkward.\", \"relationshipTone\": \"Romantic Interest\"}, \"emotionTimeline\": {\"phases\": []}}\n```";

    fn app(model: Option<ScriptedModel>) -> (App<ScriptedModel, LocalStore>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("history.json"));
        (App::new(model.map(Analyzer::new), store), dir)
    }

    fn text(text: &str) -> Submission {
        Submission {
            text: text.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn empty_submission_makes_no_external_call() {
        let (mut app, _dir) = app(Some(ScriptedModel::default()));
        let err = app.submit(Submission::default()).await.unwrap_err();
        assert_eq!(err.to_string(), EMPTY_SUBMISSION);
        assert_eq!(app.analyzer().unwrap().model().calls(), 0);
        assert_eq!(app.view(), View::NewSubmission);
    }

    #[tokio::test]
    async fn missing_key_blocks_submission() {
        let (mut app, _dir) = app(None);
        assert!(!app.is_configured());
        let err = app.submit(text("A: hi")).await.unwrap_err();
        assert!(matches!(err, GossipError::NotConfigured(_)));
        assert!(app.refresh().await.records().is_empty());
    }

    #[tokio::test]
    async fn submission_is_saved_and_listed_first() {
        let (mut app, _dir) = app(Some(ScriptedModel::replying([ANALYSIS, ANALYSIS])));
        let first = app.submit(text("A: one")).await.unwrap().id();
        let second = app.submit(text("A: two")).await.unwrap().id();

        assert_ne!(first, second);
        assert_eq!(app.history().records()[0].id(), second);
        assert_eq!(app.history().records().len(), 2);
        assert_eq!(app.view(), View::Results);
        assert_eq!(app.active_card(), Some(ActiveCard::Timeline));
        assert_eq!(app.current().unwrap().summary.as_ref().unwrap().summary_text, "Awkward.");
    }

    #[tokio::test]
    async fn failed_analysis_returns_to_form_and_saves_nothing() {
        let (mut app, _dir) = app(Some(ScriptedModel::replying(["I can't do that."])));
        assert!(app.submit(text("A: hi")).await.is_err());
        assert_eq!(app.view(), View::NewSubmission);
        assert!(app.current().is_none());
        assert!(app.refresh().await.records().is_empty());
    }

    #[tokio::test]
    async fn audio_is_transcribed_before_analysis() {
        let audio_reply = r#"{"transcribedText": "B: we need to talk", "toneAnalysis": "tense", "emotionAnalysis": "worry", "briefSummary": "bad news"}"#;
        let (mut app, _dir) = app(Some(ScriptedModel::replying([audio_reply, ANALYSIS])));
        let submission = Submission {
            audio: Some(Media::from_bytes("audio/mp3", b"ID3")),
            ..Default::default()
        };

        let record = app.submit(submission).await.unwrap();
        assert_eq!(record.conversation.text, "B: we need to talk");
        assert!(record.conversation.audio.is_some());
        assert_eq!(record.analysis.audio_analysis.as_ref().unwrap().tone_analysis, "tense");

        let requests = app.analyzer().unwrap().model().requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(matches!(&requests[1][0], Part::Text(t) if t.contains("B: we need to talk")));
    }

    struct UnreadableStore {
        saved: std::sync::Mutex<usize>,
    }

    #[async_trait::async_trait]
    impl ConversationStore for UnreadableStore {
        async fn save(&self, _: &ConversationInput, _: &AnalysisResult) -> Result<()> {
            *self.saved.lock().unwrap() += 1;
            Ok(())
        }

        async fn load_all(&self) -> Result<Vec<StoredRecord>> {
            Err(GossipError::Store("connection reset".into()))
        }
    }

    #[tokio::test]
    async fn saved_submission_succeeds_when_reload_fails() {
        let store = UnreadableStore {
            saved: std::sync::Mutex::new(0),
        };
        let mut app = App::new(Some(Analyzer::new(ScriptedModel::replying([ANALYSIS]))), store);

        let record = app.submit(text("A: hi")).await.unwrap();
        assert_eq!(record.conversation.text, "A: hi");
        assert_eq!(record.analysis.summary.as_ref().unwrap().summary_text, "Awkward.");
        assert_eq!(*app.store.saved.lock().unwrap(), 1);
        assert_eq!(app.view(), View::Results);
        assert!(app.current().is_some());
        assert!(matches!(app.history(), LoadOutcome::Unavailable(reason) if reason.contains("connection reset")));
    }

    #[tokio::test]
    async fn open_selects_record_and_default_tab() {
        let (mut app, _dir) = app(Some(ScriptedModel::replying([ANALYSIS])));
        let id = app.submit(text("A: hi")).await.unwrap().id();
        app.show_overview();
        assert!(app.current().is_none());

        assert!(app.open(Some(Uuid::new_v4())).is_none());
        assert_eq!(app.open(None).unwrap().id(), id);
        assert_eq!(app.view(), View::Results);
        assert_eq!(app.active_card(), Some(ActiveCard::Timeline));
    }
}
