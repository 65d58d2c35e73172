use serde::Deserialize;
use serde::Serialize;

use crate::error::AnalysisError;
use crate::model::AnalysisResult;

/// Inline message shown when an empty batch is submitted.
pub const EMPTY_BATCH_MESSAGE: &str = "Please enter some text or upload a file to analyze.";

/// The two top-level views of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum View {
    #[default]
    Input,
    Results,
}

/// Lifecycle of the results slot. There is no partially-loaded state: a
/// classification either loads completely or fails completely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResultsState {
    Loading,
    Failed(String),
    Loaded(Vec<AnalysisResult>),
}

/// Byte range of the active text selection, as reported by the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start: usize,
    pub end: usize,
}

/// Displayed suggestion popover: the selection it belongs to and its
/// candidate replacements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionPopover {
    pub selection: SelectionRange,
    pub candidates: Vec<String>,
}

/// Handed out when a suggestion lookup is launched; captures the selection
/// the query was issued for so late responses can be recognized as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionTicket {
    selection: SelectionRange,
}

/// What a [`Session::submit`] call decided.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The batch was accepted; the caller must now launch exactly one
    /// classification call and report back through [`Session::complete`].
    Launched(Vec<String>),
    /// The submission was refused (empty batch, or one already in flight);
    /// nothing may be sent to the network.
    Rejected,
}

/// Explicit, serializable view state owned by one controller.
///
/// All mutation goes through the transition methods; the view layer renders
/// from the accessors and never touches the fields directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    view: View,
    results: Option<ResultsState>,
    input_error: Option<String>,
    selection: Option<SelectionRange>,
    popover: Option<SuggestionPopover>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn results(&self) -> Option<&ResultsState> {
        self.results.as_ref()
    }

    pub fn input_error(&self) -> Option<&str> {
        self.input_error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.results, Some(ResultsState::Loading))
    }

    pub fn popover(&self) -> Option<&SuggestionPopover> {
        self.popover.as_ref()
    }

    /// Submit a batch for classification.
    ///
    /// An empty batch blocks the transition and records the inline
    /// validation error. Otherwise the session moves to the results view
    /// immediately, before the network call resolves, so a loading
    /// indicator can render.
    pub fn submit(&mut self, texts: Vec<String>) -> SubmitOutcome {
        if self.is_loading() {
            return SubmitOutcome::Rejected;
        }

        if texts.is_empty() {
            self.input_error = Some(EMPTY_BATCH_MESSAGE.to_string());
            self.view = View::Input;
            return SubmitOutcome::Rejected;
        }

        self.input_error = None;
        self.results = Some(ResultsState::Loading);
        self.view = View::Results;
        SubmitOutcome::Launched(texts)
    }

    /// Record the terminal outcome of the in-flight classification.
    pub fn complete(&mut self, outcome: Result<Vec<AnalysisResult>, AnalysisError>) {
        if !self.is_loading() {
            return;
        }

        self.results = Some(match outcome {
            Ok(results) => ResultsState::Loaded(results),
            Err(err) => ResultsState::Failed(err.to_string()),
        });
    }

    /// Switch tabs. The results view stays unreachable until loading has
    /// started or a result set exists; a manual switch clears the inline
    /// error.
    pub fn switch_to(&mut self, view: View) -> bool {
        if view == View::Results && self.results.is_none() {
            return false;
        }
        if self.view != view {
            self.input_error = None;
            self.view = view;
        }
        true
    }

    /// Discard the result set and return to input. Nothing is persisted.
    pub fn clear(&mut self) {
        self.results = None;
        self.popover = None;
        self.view = View::Input;
    }

    pub fn set_selection(&mut self, selection: Option<SelectionRange>) {
        self.selection = selection;
    }

    pub fn selection(&self) -> Option<SelectionRange> {
        self.selection
    }

    /// Begin a suggestion lookup for the active selection. The returned
    /// ticket must accompany the eventual response.
    pub fn request_suggestion(&mut self) -> Option<SuggestionTicket> {
        self.selection.map(|selection| SuggestionTicket { selection })
    }

    /// Deliver a resolved suggestion lookup. A response whose ticket no
    /// longer matches the current selection is stale and is discarded
    /// without touching the popover; in-flight requests are never aborted,
    /// only ignored here.
    pub fn resolve_suggestion(
        &mut self,
        ticket: SuggestionTicket,
        candidates: Vec<String>,
    ) -> bool {
        if self.selection != Some(ticket.selection) {
            return false;
        }

        self.popover = Some(SuggestionPopover {
            selection: ticket.selection,
            candidates,
        });
        true
    }

    pub fn dismiss_popover(&mut self) {
        self.popover = None;
    }
}
