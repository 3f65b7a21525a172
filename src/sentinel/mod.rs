use std::ops::Range;

// the sentinel has to be fully in view before the next page is requested
pub const FULL_VISIBILITY: f64 = 1.0;

const SENTINEL_ROWS: usize = 1;

pub type SentinelCallback = Box<dyn FnMut(f64) + Send>;

/// A rendering surface that can report when the end-of-list sentinel comes
/// into view. The callback receives the sentinel's visible ratio in `0.0..=1.0`.
pub trait SentinelSignal {
    fn on_sentinel_visible(&mut self, callback: SentinelCallback);
}

#[derive(Clone, Debug)]
pub struct ScrollSentinel {
    threshold: f64,
    triggered: bool,
}

impl Default for ScrollSentinel {
    fn default() -> Self {
        Self {
            threshold: FULL_VISIBILITY,
            triggered: false,
        }
    }
}

impl ScrollSentinel {
    pub fn new() -> Self {
        Self::default()
    }

    // fires at most once per visibility window, the guard holds until release()
    pub fn on_visible(&mut self, ratio: f64, loading: bool, exhausted: bool) -> bool {
        if ratio < self.threshold || loading || exhausted || self.triggered {
            return false;
        }
        self.triggered = true;
        true
    }

    pub fn release(&mut self) {
        self.triggered = false;
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered
    }
}

// a window of `height` rows over the rendered list, followed by a one row
// sentinel. rows map one to one to launch cards.
pub struct Viewport {
    height: usize,
    offset: usize,
    item_rows: usize,
    last_ratio: f64,
    callbacks: Vec<SentinelCallback>,
}

impl Viewport {
    pub fn new(height: usize) -> Self {
        let mut viewport = Self {
            height: height.max(1),
            offset: 0,
            item_rows: 0,
            last_ratio: 0.0,
            callbacks: Vec::new(),
        };
        viewport.last_ratio = viewport.sentinel_ratio();
        viewport
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn item_rows(&self) -> usize {
        self.item_rows
    }

    pub fn visible_range(&self) -> Range<usize> {
        let start = self.offset.min(self.item_rows);
        let end = (self.offset + self.height).min(self.item_rows);
        start..end
    }

    pub fn sentinel_ratio(&self) -> f64 {
        let top = self.item_rows;
        let bottom = top + SENTINEL_ROWS;
        let view_end = self.offset + self.height;
        let overlap = bottom.min(view_end).saturating_sub(top.max(self.offset));
        overlap as f64 / SENTINEL_ROWS as f64
    }

    pub fn is_sentinel_visible(&self) -> bool {
        self.sentinel_ratio() >= FULL_VISIBILITY
    }

    pub fn set_items(&mut self, rows: usize) {
        self.item_rows = rows;
        self.offset = self.offset.min(self.max_offset());
        self.notify();
    }

    pub fn scroll_to(&mut self, offset: usize) {
        self.offset = offset.min(self.max_offset());
        self.notify();
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let target = if delta < 0 {
            self.offset.saturating_sub(delta.unsigned_abs())
        } else {
            self.offset.saturating_add(delta as usize)
        };
        self.scroll_to(target);
    }

    pub fn page_down(&mut self) {
        self.scroll_by(self.height as isize);
    }

    pub fn page_up(&mut self) {
        self.scroll_by(-(self.height as isize));
    }

    // reports the current ratio even when nothing changed, the way a freshly
    // attached observer reports an already visible target
    pub fn reobserve(&mut self) {
        let ratio = self.sentinel_ratio();
        self.last_ratio = ratio;
        self.emit(ratio);
    }

    fn max_offset(&self) -> usize {
        (self.item_rows + SENTINEL_ROWS).saturating_sub(self.height)
    }

    fn notify(&mut self) {
        let ratio = self.sentinel_ratio();
        let was_visible = self.last_ratio >= FULL_VISIBILITY;
        let is_visible = ratio >= FULL_VISIBILITY;
        self.last_ratio = ratio;
        if was_visible != is_visible {
            self.emit(ratio);
        }
    }

    fn emit(&mut self, ratio: f64) {
        for callback in self.callbacks.iter_mut() {
            callback(ratio);
        }
    }
}

impl SentinelSignal for Viewport {
    fn on_sentinel_visible(&mut self, callback: SentinelCallback) {
        self.callbacks.push(callback);
    }
}
