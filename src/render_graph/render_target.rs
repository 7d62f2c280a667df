//! Offscreen render targets owned by a pipeline.

use std::fmt;

use crate::error::AllocationError;
use crate::render_graph::RenderBackend;

/// Stable name of a render target. Pass bindings refer to targets by id, never by buffer
/// handle, so they survive reallocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetId(pub &'static str);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Texture filtering used when a later pass samples a target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

/// What the colour buffer holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TargetUsage {
    /// Ordinary image data; filtering is up to the caller.
    #[default]
    Color,
    /// Non-colour data read back as a lookup table (masks, ids). Always nearest.
    Lookup,
}

/// Allocation options for a render target.
///
/// # Example
///
/// ```
/// use strata::{FilterMode, TargetOptions};
///
/// let options = TargetOptions::color(FilterMode::Linear).with_depth_stencil();
/// assert!(options.needs_depth && options.needs_stencil);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TargetOptions {
    pub needs_depth: bool,
    pub needs_stencil: bool,
    pub filter: FilterMode,
    pub usage: TargetUsage,
}

impl TargetOptions {
    pub fn color(filter: FilterMode) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn lookup() -> Self {
        Self {
            filter: FilterMode::Nearest,
            usage: TargetUsage::Lookup,
            ..Default::default()
        }
    }

    pub fn with_depth(mut self) -> Self {
        self.needs_depth = true;
        self
    }

    /// Depth buffer with an 8-bit stencil aspect.
    pub fn with_depth_stencil(mut self) -> Self {
        self.needs_depth = true;
        self.needs_stencil = true;
        self
    }

    /// Filter actually used when sampling the colour buffer.
    ///
    /// Lookup data is never interpolated, whatever the caller asked for.
    pub fn color_filter(&self) -> FilterMode {
        match self.usage {
            TargetUsage::Lookup => FilterMode::Nearest,
            TargetUsage::Color => self.filter,
        }
    }

    /// Depth is always read back unfiltered.
    pub fn depth_filter(&self) -> FilterMode {
        FilterMode::Nearest
    }
}

/// Everything a backend needs to allocate one target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetDescriptor {
    pub id: TargetId,
    pub width: u32,
    pub height: u32,
    pub options: TargetOptions,
}

/// A backend-allocated colour (+ optional depth/stencil) buffer pair.
///
/// Targets are never resized in place. [`RenderTarget::resize`] builds a brand-new
/// buffer and only then releases the old one, so prior contents are never preserved and
/// a failed reallocation leaves the existing target untouched.
pub struct RenderTarget<H> {
    id: TargetId,
    options: TargetOptions,
    width: u32,
    height: u32,
    handle: H,
}

impl<H> RenderTarget<H> {
    /// Allocates a target sized exactly to `width` x `height` pixels.
    pub fn create<B>(
        backend: &mut B,
        id: TargetId,
        width: u32,
        height: u32,
        options: TargetOptions,
    ) -> Result<Self, AllocationError>
    where
        B: RenderBackend<Target = H>,
    {
        let desc = TargetDescriptor {
            id,
            width,
            height,
            options,
        };
        let handle = backend.allocate_target(&desc)?;
        Ok(Self {
            id,
            options,
            width,
            height,
            handle,
        })
    }

    /// Replaces this target with a freshly allocated one of the same options.
    pub fn resize<B>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
    ) -> Result<(), AllocationError>
    where
        B: RenderBackend<Target = H>,
    {
        let fresh = Self::create(backend, self.id, width, height, self.options)?;
        let stale = std::mem::replace(self, fresh);
        stale.destroy(backend);
        Ok(())
    }

    /// Hands the GPU storage back to the backend.
    pub fn destroy<B>(self, backend: &mut B)
    where
        B: RenderBackend<Target = H>,
    {
        backend.release_target(self.handle);
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn options(&self) -> &TargetOptions {
        &self.options
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The current backend handle. Its identity changes after every reallocation.
    pub fn handle(&self) -> &H {
        &self.handle
    }
}

/// The pipeline's exclusively-owned targets, in declaration order.
///
/// Only the pipeline mutates the table; binding resolution reads current handles from it.
pub struct TargetTable<H> {
    targets: Vec<RenderTarget<H>>,
}

impl<H> TargetTable<H> {
    pub fn new() -> Self {
        Self {
            targets: Vec::new(),
        }
    }

    pub fn push(&mut self, target: RenderTarget<H>) {
        self.targets.push(target);
    }

    pub fn get(&self, id: TargetId) -> Option<&RenderTarget<H>> {
        self.targets.iter().find(|target| target.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderTarget<H>> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Swaps in a complete replacement table, returning the old one.
    pub fn replace(&mut self, targets: Vec<RenderTarget<H>>) -> Vec<RenderTarget<H>> {
        std::mem::replace(&mut self.targets, targets)
    }

    /// Empties the table, returning the targets so the caller can release them.
    pub fn drain(&mut self) -> Vec<RenderTarget<H>> {
        std::mem::take(&mut self.targets)
    }
}

impl<H> Default for TargetTable<H> {
    fn default() -> Self {
        Self::new()
    }
}
