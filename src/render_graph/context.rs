//! Per-frame inputs handed to [`Pipeline::execute`](crate::Pipeline::execute).

use crate::camera::Camera;
use crate::clock::FrameTime;
use crate::settings::Settings;

/// Everything a frame reads that is owned outside the pipeline.
///
/// Created fresh each frame by the host loop and borrowed for the duration of one
/// `execute` call. The pipeline never writes through it.
#[derive(Clone, Copy, Debug)]
pub struct FrameContext<'a> {
    /// Scene camera shared by every `PassCamera::Scene` pass.
    pub camera: &'a Camera,
    /// Live tunables from the control panel.
    pub settings: &'a Settings,
    /// Clock snapshot for this frame.
    pub time: FrameTime,
}

impl<'a> FrameContext<'a> {
    pub fn new(camera: &'a Camera, settings: &'a Settings, time: FrameTime) -> Self {
        Self {
            camera,
            settings,
            time,
        }
    }
}
