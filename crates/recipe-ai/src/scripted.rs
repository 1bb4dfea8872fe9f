use std::collections::VecDeque;
use std::sync::Mutex;

use crate::completion::{CompletionError, TextCompletion};

/// Replays queued completions in order and records every prompt it sees.
#[derive(Default)]
pub(crate) struct ScriptedCompletion {
    responses: Mutex<VecDeque<Result<String, CompletionError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub(crate) fn with_response(self, response: &str) -> Self {
        self.push(Ok(response.to_string()))
    }

    pub(crate) fn with_error(self, error: CompletionError) -> Self {
        self.push(Err(error))
    }

    fn push(self, response: Result<String, CompletionError>) -> Self {
        self.responses
            .lock()
            .expect("scripted responses lock")
            .push_back(response);
        self
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("scripted prompts lock").clone()
    }
}

impl TextCompletion for ScriptedCompletion {
    fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.prompts
            .lock()
            .expect("scripted prompts lock")
            .push(prompt.to_string());
        self.responses
            .lock()
            .expect("scripted responses lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(CompletionError::Transport(
                    "no remaining scripted responses".to_string(),
                ))
            })
    }
}
