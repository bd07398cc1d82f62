use std::fmt;

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Lifecycle action a directive asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Restart,
}

impl Action {
    pub fn all() -> &'static [Action] {
        &[Action::Up, Action::Down, Action::Restart]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Up => "up",
            Action::Down => "down",
            Action::Restart => "restart",
        }
    }

    /// Work-order type tag, e.g. `service-up`.
    pub fn work_order_type(self) -> &'static str {
        match self {
            Action::Up => "service-up",
            Action::Down => "service-down",
            Action::Restart => "service-restart",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
