// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Text surfaces that status output is rendered onto.

use tracing::warn;

use crate::device::{DeviceId, DeviceRegistry};

/// Something that accepts status text, such as an in-world display.
pub trait TextSurface {
    /// Write `text`, replacing the current contents unless `append` is set.
    fn write_text(&mut self, text: &str, append: bool);
}

/// Replace the surface contents with `lines`, one per row.
pub fn publish(surface: &mut dyn TextSurface, lines: &[String]) {
    let mut iter = lines.iter();
    match iter.next() {
        Some(first) => surface.write_text(&format!("{}\n", first), false),
        None => {
            surface.write_text("", false);
            return;
        }
    }
    for line in iter {
        surface.write_text(&format!("{}\n", line), true);
    }
}

/// In-memory surface, used as the host's fallback output.
#[derive(Debug, Clone, Default)]
pub struct BufferSurface {
    text: String,
}

impl BufferSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }
}

impl TextSurface for BufferSurface {
    fn write_text(&mut self, text: &str, append: bool) {
        if !append {
            self.text.clear();
        }
        self.text.push_str(text);
    }
}

/// A display device resolved through the registry.
pub struct DisplaySurface<'a> {
    registry: &'a mut dyn DeviceRegistry,
    display: DeviceId,
}

impl<'a> DisplaySurface<'a> {
    pub fn new(registry: &'a mut dyn DeviceRegistry, display: DeviceId) -> Self {
        Self { registry, display }
    }
}

impl TextSurface for DisplaySurface<'_> {
    fn write_text(&mut self, text: &str, append: bool) {
        if let Err(e) = self.registry.write_text(self.display, text, append) {
            warn!("Display {} rejected text: {}", self.display, e);
        }
    }
}

/// Publish to `display` when one was resolved, otherwise to `fallback`.
pub fn publish_to(
    registry: &mut dyn DeviceRegistry,
    display: Option<DeviceId>,
    fallback: &mut dyn TextSurface,
    lines: &[String],
) {
    match display {
        Some(id) => publish(&mut DisplaySurface::new(registry, id), lines),
        None => publish(fallback, lines),
    }
}
