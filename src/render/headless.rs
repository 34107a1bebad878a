//! In-process reference backend.
//!
//! No pixels are produced: images are ids tagged with the device epoch they were created in, and
//! draws are recorded. That is enough to drive the cache end to end and to observe what it did.

use std::cell::Cell;
use std::rc::Rc;

use crate::foundation::core::{Rect, RectI};
use crate::render::backend::FilterCanvas;

/// Shared "GPU context" of a canvas and the offscreen targets it spawns.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    next_image: Cell<u64>,
    epoch: Cell<u64>,
    snapshots: Cell<u64>,
    offscreens: Cell<u64>,
    fail_snapshots: Cell<bool>,
    fail_offscreen: Cell<bool>,
}

impl HeadlessDevice {
    /// Fresh device.
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Simulate a device loss: every image created so far becomes invalid.
    pub fn lose_context(&self) {
        self.epoch.set(self.epoch.get() + 1);
    }

    /// Make every capture fail, as if no surface were bound.
    pub fn set_fail_snapshots(&self, fail: bool) {
        self.fail_snapshots.set(fail);
    }

    /// Make every offscreen allocation fail.
    pub fn set_fail_offscreen(&self, fail: bool) {
        self.fail_offscreen.set(fail);
    }

    /// Successful captures so far, offscreen captures included.
    pub fn snapshot_count(&self) -> u64 {
        self.snapshots.get()
    }

    /// Offscreen targets created so far.
    pub fn offscreen_count(&self) -> u64 {
        self.offscreens.get()
    }

    fn make_image(&self, region: RectI) -> HeadlessImage {
        let id = self.next_image.get() + 1;
        self.next_image.set(id);
        self.snapshots.set(self.snapshots.get() + 1);
        HeadlessImage {
            id,
            epoch: self.epoch.get(),
            region,
        }
    }
}

/// Image handle of the headless backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeadlessImage {
    /// Unique id within the device.
    pub id: u64,
    /// Device epoch at creation.
    pub epoch: u64,
    /// Captured rect.
    pub region: RectI,
}

/// One recorded image draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawRecord {
    /// Id of the drawn image.
    pub image: u64,
    /// Source rect within the image.
    pub src: Rect,
    /// Destination rect in device coordinates.
    pub dst: Rect,
}

/// Recording canvas over a [`HeadlessDevice`].
#[derive(Debug)]
pub struct HeadlessCanvas {
    device: Rc<HeadlessDevice>,
    bounds: RectI,
    clip: RectI,
    clip_stack: Vec<RectI>,
    visible: Option<Rect>,
    alpha: f32,
    offscreen_layer: bool,
    draws: Vec<DrawRecord>,
    drawn: Vec<RectI>,
    discards: u32,
}

impl HeadlessCanvas {
    /// Canvas of `width` x `height` on a new device.
    pub fn new(width: i32, height: i32) -> Self {
        Self::with_device(HeadlessDevice::new(), width, height)
    }

    /// Canvas of `width` x `height` on `device`.
    pub fn with_device(device: Rc<HeadlessDevice>, width: i32, height: i32) -> Self {
        let bounds = RectI::new(0, 0, width, height);
        Self {
            device,
            bounds,
            clip: bounds,
            clip_stack: Vec::new(),
            visible: None,
            alpha: 1.0,
            offscreen_layer: false,
            draws: Vec::new(),
            drawn: Vec::new(),
            discards: 0,
        }
    }

    /// The backing device.
    pub fn device(&self) -> &Rc<HeadlessDevice> {
        &self.device
    }

    /// Forget recorded draws and reset the clip, ready for the next frame.
    pub fn begin_frame(&mut self) {
        self.draws.clear();
        self.drawn.clear();
        self.clip_stack.clear();
        self.clip = self.bounds;
        self.discards = 0;
    }

    /// Replace the clip.
    pub fn set_clip(&mut self, clip: RectI) {
        self.clip = clip.intersection(self.bounds).unwrap_or_default();
    }

    /// Set the visible rect used to restrict cached draws.
    pub fn set_visible_rect(&mut self, visible: Option<Rect>) {
        self.visible = visible;
    }

    /// Set the global alpha.
    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }

    /// Pretend draws go through an offscreen layer.
    pub fn set_offscreen_layer(&mut self, on: bool) {
        self.offscreen_layer = on;
    }

    /// Mark `rect` as already drawn this frame.
    pub fn mark_drawn(&mut self, rect: RectI) {
        if !rect.is_empty() {
            self.drawn.push(rect);
        }
    }

    /// Image draws recorded since the last [`HeadlessCanvas::begin_frame`].
    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    /// Discards since the last [`HeadlessCanvas::begin_frame`].
    pub fn discard_count(&self) -> u32 {
        self.discards
    }
}

impl FilterCanvas for HeadlessCanvas {
    type Image = HeadlessImage;

    fn try_snapshot(&mut self, region: RectI) -> Option<HeadlessImage> {
        if self.device.fail_snapshots.get() {
            return None;
        }
        let region = region.intersection(self.bounds)?;
        Some(self.device.make_image(region))
    }

    fn is_image_handle_valid(&self, image: &HeadlessImage) -> bool {
        image.epoch == self.device.epoch.get()
    }

    fn make_offscreen_target(&mut self, width: i32, height: i32) -> Option<Self> {
        if self.device.fail_offscreen.get() || width <= 0 || height <= 0 {
            return None;
        }
        let dev = &self.device;
        dev.offscreens.set(dev.offscreens.get() + 1);
        Some(Self::with_device(Rc::clone(dev), width, height))
    }

    fn device_bounds(&self) -> RectI {
        self.bounds
    }

    fn device_clip_bounds(&self) -> RectI {
        self.clip
    }

    fn visible_rect(&self) -> Option<Rect> {
        self.visible
    }

    fn draw_image_rect(&mut self, image: &HeadlessImage, src: Rect, dst: Rect) {
        self.draws.push(DrawRecord {
            image: image.id,
            src,
            dst,
        });
        if let Some(r) = RectI::from_rect_round(dst).intersection(self.clip) {
            self.drawn.push(r);
        }
    }

    fn save(&mut self) {
        self.clip_stack.push(self.clip);
    }

    fn restore(&mut self) {
        if let Some(clip) = self.clip_stack.pop() {
            self.clip = clip;
        }
    }

    fn clip_irect(&mut self, rect: RectI) {
        self.clip = self.clip.intersection(rect).unwrap_or_default();
    }

    fn is_clip_rect(&self) -> bool {
        true
    }

    fn alpha(&self) -> f32 {
        self.alpha
    }

    fn has_offscreen_layer(&self) -> bool {
        self.offscreen_layer
    }

    fn discard(&mut self) {
        self.discards += 1;
    }

    fn drawn_region(&self) -> Option<Vec<RectI>> {
        Some(self.drawn.clone())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/headless.rs"]
mod tests;
