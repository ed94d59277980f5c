use std::cell::Cell;
use std::rc::Rc;

use eframe::egui::{Pos2, Rect};

// ---------------------------------------------------------------------------
// Click-outside listener
// ---------------------------------------------------------------------------

/// Counts the click-outside listeners currently registered.
#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry(Rc<Cell<usize>>);

impl ListenerRegistry {
    pub fn live(&self) -> usize {
        self.0.get()
    }

    fn acquire(&self) -> ClickOutsideListener {
        self.0.set(self.0.get() + 1);
        ClickOutsideListener {
            registry: self.clone(),
            area: None,
        }
    }
}

/// Registered while a popup is open, released on drop.
#[derive(Debug)]
pub struct ClickOutsideListener {
    registry: ListenerRegistry,
    area: Option<Rect>,
}

impl ClickOutsideListener {
    /// Where clicks count as "inside" (popup plus its toggle button).
    pub fn set_area(&mut self, area: Rect) {
        self.area = Some(area);
    }

    pub fn is_outside(&self, click: Pos2) -> bool {
        self.area.is_some_and(|area| !area.contains(click))
    }
}

impl Drop for ClickOutsideListener {
    fn drop(&mut self) {
        self.registry.0.set(self.registry.0.get().saturating_sub(1));
    }
}

// ---------------------------------------------------------------------------
// Export menu
// ---------------------------------------------------------------------------

/// Open/closed state of the export dropdown.
#[derive(Debug, Default)]
pub struct ExportMenu {
    registry: ListenerRegistry,
    listener: Option<ClickOutsideListener>,
}

impl ExportMenu {
    pub fn new(registry: ListenerRegistry) -> Self {
        Self {
            registry,
            listener: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.listener.is_some()
    }

    pub fn open(&mut self) {
        if self.listener.is_none() {
            self.listener = Some(self.registry.acquire());
        }
    }

    pub fn close(&mut self) {
        self.listener = None;
    }

    pub fn toggle(&mut self) {
        if self.is_open() {
            self.close();
        } else {
            self.open();
        }
    }

    pub fn set_area(&mut self, area: Rect) {
        if let Some(listener) = &mut self.listener {
            listener.set_area(area);
        }
    }

    /// Close the menu when `click` landed outside it. Returns whether it closed.
    pub fn handle_click(&mut self, click: Pos2) -> bool {
        let outside = self
            .listener
            .as_ref()
            .is_some_and(|l| l.is_outside(click));
        if outside {
            self.close();
        }
        outside
    }
}
