use super::types::{AeMode, AfMode, SurfaceId};
use crate::orientation::Rotation;

/// Device-provided defaults a request starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestTemplate {
    Preview,
    StillCapture,
    Record,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    Off,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AfTrigger {
    #[default]
    Idle,
    Start,
    Cancel,
}

/// One immutable submission to a live session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub template: RequestTemplate,
    pub control_mode: Option<ControlMode>,
    pub af_mode: Option<AfMode>,
    pub ae_mode: Option<AeMode>,
    pub af_trigger: AfTrigger,
    pub target_rotation: Option<Rotation>,
    pub targets: Vec<SurfaceId>,
}

/// Accumulates settings for a transition; every `build` yields a fresh
/// request so submitted values are never mutated afterwards.
#[derive(Debug, Clone)]
pub struct CaptureRequestBuilder {
    request: CaptureRequest,
}

impl CaptureRequestBuilder {
    pub fn new(template: RequestTemplate) -> Self {
        Self {
            request: CaptureRequest {
                template,
                control_mode: None,
                af_mode: None,
                ae_mode: None,
                af_trigger: AfTrigger::Idle,
                target_rotation: None,
                targets: Vec::new(),
            },
        }
    }

    pub fn template(&self) -> RequestTemplate {
        self.request.template
    }

    pub fn add_target(&mut self, surface: SurfaceId) -> &mut Self {
        if !self.request.targets.contains(&surface) {
            self.request.targets.push(surface);
        }
        self
    }

    pub fn control_mode(&mut self, mode: ControlMode) -> &mut Self {
        self.request.control_mode = Some(mode);
        self
    }

    pub fn af_mode(&mut self, mode: AfMode) -> &mut Self {
        self.request.af_mode = Some(mode);
        self
    }

    pub fn ae_mode(&mut self, mode: AeMode) -> &mut Self {
        self.request.ae_mode = Some(mode);
        self
    }

    pub fn af_trigger(&mut self, trigger: AfTrigger) -> &mut Self {
        self.request.af_trigger = trigger;
        self
    }

    pub fn target_rotation(&mut self, rotation: Rotation) -> &mut Self {
        self.request.target_rotation = Some(rotation);
        self
    }

    pub fn build(&self) -> CaptureRequest {
        self.request.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_built_requests_are_snapshots() {
        let mut builder = CaptureRequestBuilder::new(RequestTemplate::StillCapture);
        builder
            .add_target(SurfaceId(7))
            .add_target(SurfaceId(7))
            .ae_mode(AeMode::OnAutoFlash)
            .af_trigger(AfTrigger::Start);

        let lock = builder.build();
        builder.af_trigger(AfTrigger::Cancel);
        let unlock = builder.build();

        assert_eq!(lock.targets, vec![SurfaceId(7)]);
        assert_eq!(lock.af_trigger, AfTrigger::Start);
        assert_eq!(unlock.af_trigger, AfTrigger::Cancel);
        assert_eq!(unlock.ae_mode, Some(AeMode::OnAutoFlash));
        assert_eq!(builder.template(), RequestTemplate::StillCapture);
    }
}
