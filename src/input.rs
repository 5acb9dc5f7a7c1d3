//! Input surface controller
//!
//! Mirrors the lifecycle onto the input box and submit button. It has no
//! state machine of its own: the runtime tells it when to enable or disable.

/// What the submit button shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitAffordance {
    Send,
    Loading,
}

/// Snapshot of the input surface handed to the display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputView {
    pub enabled: bool,
    pub affordance: SubmitAffordance,
    pub text: String,
    pub height_px: u32,
    pub focused: bool,
}

/// Sizing of the input box in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputMetrics {
    pub line_height_px: u32,
    pub padding_px: u32,
    pub max_height_px: u32,
}

impl Default for InputMetrics {
    fn default() -> Self {
        Self {
            line_height_px: 24,
            padding_px: 14,
            max_height_px: 120,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InputController {
    metrics: InputMetrics,
    enabled: bool,
    text: String,
    height_px: u32,
    focused: bool,
}

impl InputController {
    pub fn new(metrics: InputMetrics) -> Self {
        let mut controller = Self {
            metrics,
            enabled: true,
            text: String::new(),
            height_px: 0,
            focused: false,
        };
        controller.autosize();
        controller
    }

    pub fn set_enabled(&mut self, enabled: bool) -> InputView {
        self.enabled = enabled;
        self.view()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> InputView {
        self.text = text.into();
        self.autosize();
        self.view()
    }

    pub fn clear(&mut self) -> InputView {
        self.set_text(String::new())
    }

    pub fn focus(&mut self) -> InputView {
        self.focused = true;
        self.view()
    }

    /// Fit the box to its content, capped at the maximum height
    pub fn autosize(&mut self) -> u32 {
        let lines = u32::try_from(self.text.split('\n').count()).unwrap_or(u32::MAX);
        let content = lines
            .saturating_mul(self.metrics.line_height_px)
            .saturating_add(self.metrics.padding_px);
        self.height_px = content.min(self.metrics.max_height_px);
        self.height_px
    }

    pub fn view(&self) -> InputView {
        InputView {
            enabled: self.enabled,
            affordance: if self.enabled {
                SubmitAffordance::Send
            } else {
                SubmitAffordance::Loading
            },
            text: self.text.clone(),
            height_px: self.height_px,
            focused: self.focused,
        }
    }
}

impl Default for InputController {
    fn default() -> Self {
        Self::new(InputMetrics::default())
    }
}
