use serde::Serialize;

/// Position within the questionnaire. Positions are 1-based and never leave
/// `1..=total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    current: usize,
    total: usize,
}

/// Which navigation controls the renderer should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavigationControls {
    pub show_previous: bool,
    pub show_next: bool,
    pub show_submit: bool,
}

impl Navigation {
    pub fn new(total: usize) -> Result<Self, NavigationError> {
        if total == 0 {
            return Err(NavigationError::NoQuestions);
        }
        Ok(Self { current: 1, total })
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Moves forward one question. Returns `false` at the last question.
    pub fn advance(&mut self) -> bool {
        if self.current < self.total {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Moves back one question. Returns `false` at the first question.
    pub fn retreat(&mut self) -> bool {
        if self.current > 1 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    pub fn is_first(&self) -> bool {
        self.current == 1
    }

    pub fn is_last(&self) -> bool {
        self.current == self.total
    }

    pub fn progress_fraction(&self) -> f64 {
        self.current as f64 / self.total as f64
    }

    pub fn progress_percent(&self) -> f64 {
        self.progress_fraction() * 100.0
    }

    pub fn progress_label(&self) -> String {
        format!("Question {} of {}", self.current, self.total)
    }

    pub fn controls(&self) -> NavigationControls {
        NavigationControls {
            show_previous: !self.is_first(),
            show_next: !self.is_last(),
            show_submit: self.is_last(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("navigation requires at least one question")]
    NoQuestions,
}
