/// Split log text into displayable lines, dropping blank ones
#[must_use]
pub fn log_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Scroll geometry of the log box, in rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub scroll_top: usize,
    pub scroll_height: usize,
    pub client_height: usize,
}

impl Viewport {
    /// Distance left to scroll is under one row
    #[must_use]
    pub const fn at_bottom(&self) -> bool {
        self.scroll_height.abs_diff(self.scroll_top + self.client_height) < 1
    }

    const fn max_scroll_top(&self) -> usize {
        self.scroll_height.saturating_sub(self.client_height)
    }
}

/// Log box state: lines, scroll position, and the auto-scroll flags
#[derive(Debug, Clone)]
pub struct LogPanel {
    lines: Vec<String>,
    scroll_top: usize,
    client_height: usize,
    auto_scroll: bool,
    user_scrolled: bool,
}

impl LogPanel {
    /// `rows` is the visible height of the box
    #[must_use]
    pub fn new(rows: usize, auto_scroll: bool) -> Self {
        Self {
            lines: Vec::new(),
            scroll_top: 0,
            client_height: rows.max(1),
            auto_scroll,
            user_scrolled: false,
        }
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub const fn auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    #[must_use]
    pub const fn user_scrolled(&self) -> bool {
        self.user_scrolled
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        Viewport {
            scroll_top: self.scroll_top,
            // Content shorter than the box still fills it
            scroll_height: self.lines.len().max(self.client_height),
            client_height: self.client_height,
        }
    }

    #[must_use]
    pub fn at_bottom(&self) -> bool {
        self.viewport().at_bottom()
    }

    /// Lines currently inside the viewport
    #[must_use]
    pub fn visible_lines(&self) -> &[String] {
        let start = self.scroll_top.min(self.lines.len());
        let end = (start + self.client_height).min(self.lines.len());
        &self.lines[start..end]
    }

    /// Replace the content, keeping the view pinned to the bottom when it was
    /// there already or auto-scroll is on without a manual scroll-away
    pub fn update(&mut self, text: &str) {
        let was_at_bottom = self.at_bottom() || (self.auto_scroll && !self.user_scrolled);

        self.lines = log_lines(text);
        self.scroll_top = self.scroll_top.min(self.viewport().max_scroll_top());

        if was_at_bottom {
            self.scroll_to_bottom();
        }
    }

    /// User-driven scroll; fires the scroll listener
    pub fn scroll_to(&mut self, top: usize) {
        self.scroll_top = top.min(self.viewport().max_scroll_top());
        self.on_scroll();
    }

    /// Scroll by a signed number of rows
    pub fn scroll_by(&mut self, rows: isize) {
        let top = self.scroll_top.saturating_add_signed(rows);
        self.scroll_to(top);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_to(self.viewport().max_scroll_top());
    }

    /// Scroll listener: leaving the bottom with auto-scroll on marks a manual
    /// scroll, returning to the bottom clears it
    pub fn on_scroll(&mut self) {
        let at_bottom = self.at_bottom();
        if self.auto_scroll && !at_bottom {
            self.user_scrolled = true;
        }
        if at_bottom {
            self.user_scrolled = false;
        }
    }

    /// Flip auto-scroll; returns the new value
    pub fn toggle_auto_scroll(&mut self) -> bool {
        self.set_auto_scroll(!self.auto_scroll);
        self.auto_scroll
    }

    /// Set auto-scroll, clearing the manual-scroll flag
    pub fn set_auto_scroll(&mut self, enabled: bool) {
        self.auto_scroll = enabled;
        self.user_scrolled = false;
        if enabled {
            self.scroll_to_bottom();
        }
    }
}
