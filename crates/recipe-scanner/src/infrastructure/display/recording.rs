//! In-memory display for tests.
//!
//! Every call is appended to `updates` as a [`DisplayUpdate`], in call
//! order.  The `last_*` helpers return the most recent value written to one
//! region, which is what a user would currently see there.

use std::sync::Mutex;

use crate::application::render_recipe::DisplaySurface;

/// One write to one display region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayUpdate {
    Scanned(String),
    Title(String),
    Ingredients(Vec<String>),
    Instructions(Vec<String>),
    Notice(String),
}

/// A display that records instead of drawing.
#[derive(Default)]
pub struct RecordingDisplay {
    updates: Mutex<Vec<DisplayUpdate>>,
}

impl RecordingDisplay {
    /// All updates so far, oldest first.
    pub fn updates(&self) -> Vec<DisplayUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn last_scanned(&self) -> Option<String> {
        self.find_last(|u| match u {
            DisplayUpdate::Scanned(s) => Some(s.clone()),
            _ => None,
        })
    }

    pub fn last_title(&self) -> Option<String> {
        self.find_last(|u| match u {
            DisplayUpdate::Title(t) => Some(t.clone()),
            _ => None,
        })
    }

    pub fn last_ingredients(&self) -> Option<Vec<String>> {
        self.find_last(|u| match u {
            DisplayUpdate::Ingredients(i) => Some(i.clone()),
            _ => None,
        })
    }

    pub fn last_instructions(&self) -> Option<Vec<String>> {
        self.find_last(|u| match u {
            DisplayUpdate::Instructions(i) => Some(i.clone()),
            _ => None,
        })
    }

    pub fn last_notice(&self) -> Option<String> {
        self.find_last(|u| match u {
            DisplayUpdate::Notice(n) => Some(n.clone()),
            _ => None,
        })
    }

    fn find_last<T>(&self, pick: impl Fn(&DisplayUpdate) -> Option<T>) -> Option<T> {
        self.updates.lock().unwrap().iter().rev().find_map(pick)
    }

    fn push(&self, update: DisplayUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}

impl DisplaySurface for RecordingDisplay {
    fn show_scanned(&self, subject: &str) {
        self.push(DisplayUpdate::Scanned(subject.to_string()));
    }

    fn show_title(&self, title: &str) {
        self.push(DisplayUpdate::Title(title.to_string()));
    }

    fn show_ingredients(&self, ingredients: &[String]) {
        self.push(DisplayUpdate::Ingredients(ingredients.to_vec()));
    }

    fn show_instructions(&self, instructions: &[String]) {
        self.push(DisplayUpdate::Instructions(instructions.to_vec()));
    }

    fn show_notice(&self, notice: &str) {
        self.push(DisplayUpdate::Notice(notice.to_string()));
    }
}
