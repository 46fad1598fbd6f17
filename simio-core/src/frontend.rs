//! Capabilities the subsystem consumes from its host.
//!
//! Neither is implemented here: the simulator's front end and settings store
//! plug in through these traits. [`crate::test::ScriptedFrontEnd`] and
//! [`crate::IoConfig`] are the in-crate implementations.

use std::path::PathBuf;
use std::time::Duration;

/// An interactive front end able to prompt for input and display output.
pub trait FrontEnd: Send + Sync {
    /// Whether the front end is currently driving the simulation.
    fn is_attached(&self) -> bool {
        true
    }

    /// `true` when input is typed into the run pane while the program runs;
    /// `false` when a separate static input field supplies it.
    fn is_interactive_mode(&self) -> bool;

    /// Modal prompt for one value. `None` means the user cancelled.
    fn prompt_for_line(&self, prompt: &str) -> Option<String>;

    /// Blocking run-pane request for at most `max_len` characters
    /// (`max_len < 0`: unbounded). `None` means the user cancelled.
    fn prompt_for_bounded(&self, max_len: i32) -> Option<String>;

    fn post_output(&self, text: &str);

    /// Full contents of the static input field.
    fn static_input_contents(&self) -> String;
}

/// Host settings consulted by the subsystem.
pub trait Settings: Send + Sync {
    fn use_popup_for_input(&self) -> bool;

    fn derive_working_directory_from_program(&self) -> bool;

    /// Path of the loaded guest program, if any.
    fn loaded_program(&self) -> Option<PathBuf> {
        None
    }

    /// Minimum spacing between two deliveries to the front end.
    fn flush_interval(&self) -> Duration {
        Duration::from_millis(100)
    }
}
