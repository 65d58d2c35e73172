use serde::Deserialize;
use serde::Serialize;

/// Dictation capability state. A recognizer is either absent entirely,
/// present and idle, or actively recording; there is no separate
/// "supported" flag to fall out of sync with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DictationState {
    Unavailable,
    Idle,
    Recording,
}

/// Known causes of a failed dictation attempt, mapped from the recognizer's
/// error codes by the embedding view layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictationFault {
    NoSpeech,
    AudioCapture,
    NotAllowed,
    Other(String),
}

impl DictationFault {
    /// User-facing message for this fault.
    pub fn message(&self) -> String {
        match self {
            DictationFault::NoSpeech => {
                "No speech was detected. Please make sure your microphone is active and try speaking again."
                    .to_string()
            }
            DictationFault::AudioCapture => {
                "Microphone problem. Please check your microphone connection and system settings."
                    .to_string()
            }
            DictationFault::NotAllowed => {
                "Permission denied. Please allow microphone access in your browser settings to use this feature."
                    .to_string()
            }
            DictationFault::Other(code) => {
                format!("An error occurred: {code}. Please try again.")
            }
        }
    }
}

/// Events emitted by the speech recognizer while recording.
#[derive(Debug, Clone, PartialEq)]
pub enum DictationEvent {
    /// Provisional transcript for the utterance in progress; replaces the
    /// previous interim text.
    Interim(String),
    /// Finalized transcript fragment; appended durably.
    Final(String),
    Error(DictationFault),
    End,
}

/// Accumulated transcript: durable finalized text plus the current interim
/// tail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Transcript {
    finals: String,
    interim: String,
}

impl Transcript {
    fn rendered(&self) -> String {
        format!("{}{}", self.finals, self.interim)
    }

    fn clear(&mut self) {
        self.finals.clear();
        self.interim.clear();
    }
}

/// Owns the dictation lifecycle: capability state, transcript accumulation,
/// error reporting, and end-of-dictation segmentation into batch lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictationController {
    state: DictationState,
    transcript: Transcript,
    error: Option<String>,
}

impl DictationController {
    /// Build the controller from a capability probe of the host recognizer.
    pub fn detect(available: bool) -> Self {
        let state = if available {
            DictationState::Idle
        } else {
            DictationState::Unavailable
        };

        Self {
            state,
            transcript: Transcript::default(),
            error: None,
        }
    }

    pub fn state(&self) -> DictationState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Current buffer contents: finalized text plus the interim tail.
    pub fn buffer(&self) -> String {
        self.transcript.rendered()
    }

    /// Start recording. Clears the previous transcript and error. Returns
    /// false when the capability is unavailable or recording already.
    pub fn start(&mut self) -> bool {
        if self.state != DictationState::Idle {
            return false;
        }

        self.transcript.clear();
        self.error = None;
        self.state = DictationState::Recording;
        true
    }

    /// Feed one recognizer event into the controller.
    pub fn handle_event(&mut self, event: DictationEvent) {
        if self.state != DictationState::Recording {
            return;
        }

        match event {
            DictationEvent::Interim(text) => {
                self.transcript.interim = text;
            }
            DictationEvent::Final(text) => {
                self.transcript.finals.push_str(&text);
                self.transcript.interim.clear();
            }
            DictationEvent::Error(fault) => {
                self.error = Some(fault.message());
                self.state = DictationState::Idle;
            }
            DictationEvent::End => {
                self.transcript.finals = segment_sentences(&self.transcript.rendered());
                self.transcript.interim.clear();
                self.state = DictationState::Idle;
            }
        }
    }
}

/// Break a dictated transcript into one line per sentence so each sentence
/// becomes one batch entry: sentence-ending punctuation followed by a space
/// becomes a line break.
pub fn segment_sentences(text: &str) -> String {
    let re = regex::Regex::new(r"([.!?]) ").unwrap();
    re.replace_all(text.trim(), "$1\n").trim().to_string()
}
