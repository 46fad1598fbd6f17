//! Developer-facing utilities for driving the I/O subsystem.
//!
//! This is intentionally a regular module (not `#[cfg(test)]`) so that unit
//! tests, the integration tests and embedding hosts can all reuse it.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::frontend::FrontEnd;

/// A front end that answers prompts from a queue and records everything.
///
/// An exhausted queue (or a queued `None`) answers as a cancelled prompt.
#[derive(Debug, Default)]
pub struct ScriptedFrontEnd {
    interactive: bool,
    detached: bool,
    static_input: String,
    answers: Mutex<VecDeque<Option<String>>>,
    prompts: Mutex<Vec<String>>,
    bounded: Mutex<Vec<i32>>,
    posted: Mutex<Vec<String>>,
}

impl ScriptedFrontEnd {
    /// Input is typed into the run pane.
    pub fn interactive() -> Self {
        ScriptedFrontEnd {
            interactive: true,
            ..Default::default()
        }
    }

    /// Input comes from a static input field holding `contents`.
    pub fn with_static_input(contents: impl Into<String>) -> Self {
        ScriptedFrontEnd {
            interactive: false,
            static_input: contents.into(),
            ..Default::default()
        }
    }

    /// Present but not attached to the running simulation.
    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    pub fn with_answers<I, S>(self, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.answers.lock().extend(answers.into_iter().map(|s| Some(s.into())));
        self
    }

    /// Queue a cancelled prompt.
    pub fn then_cancel(self) -> Self {
        self.answers.lock().push_back(None);
        self
    }

    /// Modal prompt texts, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// `max_len` of every run-pane request, in order.
    pub fn bounded_requests(&self) -> Vec<i32> {
        self.bounded.lock().clone()
    }

    /// Every delivery received through `post_output`.
    pub fn posted(&self) -> Vec<String> {
        self.posted.lock().clone()
    }

    fn next_answer(&self) -> Option<String> {
        self.answers.lock().pop_front().flatten()
    }
}

impl FrontEnd for ScriptedFrontEnd {
    fn is_attached(&self) -> bool {
        !self.detached
    }

    fn is_interactive_mode(&self) -> bool {
        self.interactive
    }

    fn prompt_for_line(&self, prompt: &str) -> Option<String> {
        self.prompts.lock().push(prompt.to_string());
        self.next_answer()
    }

    fn prompt_for_bounded(&self, max_len: i32) -> Option<String> {
        self.bounded.lock().push(max_len);
        self.next_answer()
    }

    fn post_output(&self, text: &str) {
        self.posted.lock().push(text.to_string());
    }

    fn static_input_contents(&self) -> String {
        self.static_input.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_then_cancellation() {
        let fe = ScriptedFrontEnd::interactive().with_answers(["a"]).then_cancel();
        assert_eq!(fe.prompt_for_line("p").as_deref(), Some("a"));
        assert_eq!(fe.prompt_for_bounded(3), None);
        assert_eq!(fe.prompt_for_bounded(3), None);
        assert_eq!(fe.prompts(), vec!["p".to_string()]);
        assert_eq!(fe.bounded_requests(), vec![3, 3]);
    }
}
