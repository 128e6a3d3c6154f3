//! Transition requests and the hook flags that accompany them.

use crate::core::StateId;

/// Which lifecycle hooks a push or pop should run.
///
/// All hooks run by default. Turning one off lets a caller, for instance,
/// layer a transient overlay without suspending the state underneath
/// (`Hooks::default().without_exit()`), or install a state silently and
/// enter it later (`Hooks::default().without_entry()`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hooks {
    /// Run `on_exit` on the state leaving the top of the stack
    pub exit: bool,
    /// Run `on_entry` on the state becoming topmost
    pub entry: bool,
    /// Run `if_from` on the state becoming topmost
    pub notify: bool,
}

impl Hooks {
    pub const ALL: Hooks = Hooks {
        exit: true,
        entry: true,
        notify: true,
    };

    pub const NONE: Hooks = Hooks {
        exit: false,
        entry: false,
        notify: false,
    };

    pub fn without_exit(mut self) -> Self {
        self.exit = false;
        self
    }

    pub fn without_entry(mut self) -> Self {
        self.entry = false;
        self
    }

    pub fn without_notify(mut self) -> Self {
        self.notify = false;
        self
    }
}

impl Default for Hooks {
    fn default() -> Self {
        Self::ALL
    }
}

/// A stack mutation waiting to be applied.
///
/// Requests made from inside a hook are queued and applied, in order, once
/// that hook has returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Push { id: StateId, hooks: Hooks },
    Pop { hooks: Hooks },
    Clear,
}
