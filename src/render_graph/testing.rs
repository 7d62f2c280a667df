//! Recording backend used by the pipeline tests.

use crate::error::{AllocationError, FrameError};
use crate::render_graph::backend::{Capabilities, DrawCall, DrawOutput, RenderBackend};
use crate::render_graph::bindings::UniformName;
use crate::render_graph::pass::{PassId, PassKind};
use crate::render_graph::render_target::{TargetDescriptor, TargetId, TargetOptions};

/// Stand-in for GPU storage. `serial` is unique per allocation, so a handle that
/// survives a resize is detectable.
#[derive(Clone, Debug, PartialEq)]
pub struct MockTarget {
    pub id: TargetId,
    pub serial: u64,
    pub width: u32,
    pub height: u32,
    pub options: TargetOptions,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    Allocate {
        target: TargetId,
        width: u32,
        height: u32,
    },
    Release {
        target: TargetId,
        serial: u64,
    },
    BeginFrame,
    Draw(DrawRecord),
    EndFrame,
}

/// What the backend saw for one draw.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawRecord {
    pub pass: PassId,
    pub kind: PassKind,
    /// `None` for the screen.
    pub output: Option<(TargetId, u64)>,
    pub textures: Vec<(UniformName, TargetId, u64)>,
    pub scalars: Vec<(UniformName, f32)>,
}

pub struct RecordingBackend {
    capabilities: Capabilities,
    ops: Vec<Op>,
    next_serial: u64,
    fail_all: bool,
    fail_targets: Vec<TargetId>,
    skip_frames: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            capabilities: Capabilities::ALL,
            ops: Vec::new(),
            next_serial: 1,
            fail_all: false,
            fail_targets: Vec::new(),
            skip_frames: false,
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn fail_allocations(&mut self, fail: bool) {
        self.fail_all = fail;
    }

    pub fn fail_target(&mut self, id: &'static str) {
        self.fail_targets.push(TargetId(id));
    }

    pub fn clear_failures(&mut self) {
        self.fail_all = false;
        self.fail_targets.clear();
    }

    pub fn skip_frames(&mut self, skip: bool) {
        self.skip_frames = skip;
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<Op> {
        std::mem::take(&mut self.ops)
    }

    pub fn draws(&self) -> Vec<&DrawRecord> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Draw(record) => Some(record),
                _ => None,
            })
            .collect()
    }

    pub fn allocations(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, Op::Allocate { .. }))
            .count()
    }

    pub fn releases(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, Op::Release { .. }))
            .count()
    }
}

impl RenderBackend for RecordingBackend {
    type Target = MockTarget;

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn allocate_target(&mut self, desc: &TargetDescriptor) -> Result<MockTarget, AllocationError> {
        if self.fail_all || self.fail_targets.contains(&desc.id) {
            return Err(AllocationError {
                target: desc.id,
                width: desc.width,
                height: desc.height,
                reason: "refused by test backend".to_string(),
            });
        }

        self.ops.push(Op::Allocate {
            target: desc.id,
            width: desc.width,
            height: desc.height,
        });
        let serial = self.next_serial;
        self.next_serial += 1;
        Ok(MockTarget {
            id: desc.id,
            serial,
            width: desc.width,
            height: desc.height,
            options: desc.options,
        })
    }

    fn release_target(&mut self, target: MockTarget) {
        self.ops.push(Op::Release {
            target: target.id,
            serial: target.serial,
        });
    }

    fn begin_frame(&mut self) -> Result<(), FrameError> {
        if self.skip_frames {
            return Err(FrameError::Timeout);
        }
        self.ops.push(Op::BeginFrame);
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall<'_, MockTarget>) {
        let output = match call.output {
            DrawOutput::Target(target) => Some((target.id, target.serial)),
            DrawOutput::Screen => None,
        };
        self.ops.push(Op::Draw(DrawRecord {
            pass: call.pass,
            kind: call.kind,
            output,
            textures: call
                .bindings
                .textures
                .iter()
                .map(|texture| (texture.uniform, texture.target, texture.handle.serial))
                .collect(),
            scalars: call
                .bindings
                .scalars
                .iter()
                .map(|scalar| (scalar.uniform, scalar.value))
                .collect(),
        }));
    }

    fn end_frame(&mut self) {
        self.ops.push(Op::EndFrame);
    }
}
