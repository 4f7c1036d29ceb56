use super::interface::{CameraBackend, CameraDevice};
use super::request::CaptureRequest;
use super::types::{
    AeMode, CapturedImage, DeviceCharacteristics, ImageFormat, ImageReader, RequestId, SessionId,
    Size, StreamConfigurationMap, Surface, SurfaceId, SurfaceKind,
};
use crate::error::DeviceError;
use crate::events::{CameraEvent, DeviceErrorCode, EventSink};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Every call the simulated device stack received, in order
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    Open { camera_id: String },
    CreateSession {
        session: SessionId,
        outputs: Vec<SurfaceId>,
    },
    Capture {
        session: SessionId,
        request: CaptureRequest,
    },
    SetRepeating {
        session: SessionId,
        request: CaptureRequest,
    },
    StopRepeating { session: SessionId },
    CloseSession { session: SessionId },
    CloseDevice { camera_id: String },
    CreateImageReader { surface: SurfaceId },
    CloseImageReader { surface: SurfaceId },
}

/// Static description of one simulated camera
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedCamera {
    pub camera_id: String,
    pub characteristics: DeviceCharacteristics,
}

impl SimulatedCamera {
    /// Back camera of a typical phone: sensor mounted at 90 degrees,
    /// auto-exposure with flash, 16:9 JPEG output.
    pub fn phone() -> Self {
        Self {
            camera_id: "0".to_string(),
            characteristics: DeviceCharacteristics {
                sensor_orientation: 90,
                ae_available_modes: vec![AeMode::Off, AeMode::On, AeMode::OnAutoFlash],
                stream_configuration: Some(StreamConfigurationMap {
                    jpeg_sizes: vec![
                        Size::new(1280, 720),
                        Size::new(1920, 1080),
                        Size::new(640, 480),
                    ],
                    preview_sizes: vec![
                        Size::new(1920, 1080),
                        Size::new(1280, 720),
                        Size::new(960, 540),
                        Size::new(640, 480),
                    ],
                    video_sizes: vec![
                        Size::new(1920, 1080),
                        Size::new(1440, 1080),
                        Size::new(960, 720),
                        Size::new(720, 480),
                    ],
                }),
            },
        }
    }

    pub fn with_sensor_orientation(mut self, degrees: u32) -> Self {
        self.characteristics.sensor_orientation = degrees;
        self
    }

    pub fn with_ae_modes(mut self, modes: Vec<AeMode>) -> Self {
        self.characteristics.ae_available_modes = modes;
        self
    }

    pub fn with_stream_configuration(mut self, map: Option<StreamConfigurationMap>) -> Self {
        self.characteristics.stream_configuration = map;
        self
    }
}

#[derive(Default)]
struct SimState {
    calls: Vec<DeviceCall>,
    next_session: u64,
    next_request: u64,
    next_frame: u64,
    live_sessions: HashMap<SessionId, Vec<Surface>>,
    max_live_sessions: usize,
    readers: HashMap<SurfaceId, Size>,
    sink: Option<EventSink>,
    open_camera: Option<String>,
    fail_sessions_with: Option<SurfaceKind>,
    fail_captures: bool,
    deny_access: bool,
}

impl SimState {
    fn ensure_live(&self, session: SessionId) -> Result<(), DeviceError> {
        if self.live_sessions.contains_key(&session) {
            Ok(())
        } else {
            Err(DeviceError::StaleSession { session })
        }
    }

    fn next_request(&mut self) -> RequestId {
        self.next_request += 1;
        RequestId(self.next_request)
    }

    fn next_frame(&mut self) -> u64 {
        self.next_frame += 1;
        self.next_frame
    }
}

/// In-process camera stack.
///
/// Events are emitted synchronously from inside the call that caused them,
/// in the order a real device would report them.
#[derive(Clone)]
pub struct SimulatedBackend {
    cameras: Arc<Vec<SimulatedCamera>>,
    state: Arc<Mutex<SimState>>,
}

impl SimulatedBackend {
    pub fn new(cameras: Vec<SimulatedCamera>) -> Self {
        Self {
            cameras: Arc::new(cameras),
            state: Arc::new(Mutex::new(SimState::default())),
        }
    }

    pub fn single(camera: SimulatedCamera) -> Self {
        Self::new(vec![camera])
    }

    pub fn calls(&self) -> Vec<DeviceCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn live_sessions(&self) -> Vec<SessionId> {
        let mut live: Vec<_> = self.state.lock().live_sessions.keys().copied().collect();
        live.sort();
        live
    }

    /// Highest number of simultaneously live sessions ever observed
    pub fn max_live_sessions(&self) -> usize {
        self.state.lock().max_live_sessions
    }

    pub fn open_readers(&self) -> usize {
        self.state.lock().readers.len()
    }

    pub fn is_device_open(&self) -> bool {
        self.state.lock().open_camera.is_some()
    }

    /// Reject every session that routes to a surface of `kind`
    pub fn fail_sessions_with(&self, kind: Option<SurfaceKind>) {
        self.state.lock().fail_sessions_with = kind;
    }

    pub fn fail_captures(&self, fail: bool) {
        self.state.lock().fail_captures = fail;
    }

    pub fn deny_access(&self, deny: bool) {
        self.state.lock().deny_access = deny;
    }

    /// Report the open device as disconnected
    pub fn disconnect(&self) {
        let (sink, camera_id) = {
            let state = self.state.lock();
            (state.sink.clone(), state.open_camera.clone())
        };
        if let (Some(sink), Some(camera_id)) = (sink, camera_id) {
            warn!("Simulating disconnect of camera {}", camera_id);
            sink.emit(CameraEvent::DeviceDisconnected { camera_id });
        }
    }

    /// Report a fatal error on the open device
    pub fn raise_error(&self, code: DeviceErrorCode) {
        let (sink, camera_id) = {
            let state = self.state.lock();
            (state.sink.clone(), state.open_camera.clone())
        };
        if let (Some(sink), Some(camera_id)) = (sink, camera_id) {
            warn!("Simulating {:?} on camera {}", code, camera_id);
            sink.emit(CameraEvent::DeviceError { camera_id, code });
        }
    }

    fn camera(&self, camera_id: &str) -> Result<&SimulatedCamera, DeviceError> {
        self.cameras
            .iter()
            .find(|camera| camera.camera_id == camera_id)
            .ok_or_else(|| DeviceError::access_failure(format!("unknown camera {}", camera_id)))
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::single(SimulatedCamera::phone())
    }
}

impl CameraBackend for SimulatedBackend {
    fn camera_ids(&self) -> Result<Vec<String>, DeviceError> {
        Ok(self
            .cameras
            .iter()
            .map(|camera| camera.camera_id.clone())
            .collect())
    }

    fn characteristics(&self, camera_id: &str) -> Result<DeviceCharacteristics, DeviceError> {
        Ok(self.camera(camera_id)?.characteristics.clone())
    }

    fn open(
        &self,
        camera_id: &str,
        events: EventSink,
    ) -> Result<Box<dyn CameraDevice>, DeviceError> {
        self.camera(camera_id)?;

        {
            let mut state = self.state.lock();
            if state.deny_access {
                return Err(DeviceError::AccessDenied);
            }
            if let Some(open) = &state.open_camera {
                return Err(DeviceError::access_failure(format!(
                    "camera {} is already open",
                    open
                )));
            }
            state.calls.push(DeviceCall::Open {
                camera_id: camera_id.to_string(),
            });
            state.open_camera = Some(camera_id.to_string());
            state.sink = Some(events.clone());
        }

        info!("Simulated camera {} opened", camera_id);
        events.emit(CameraEvent::DeviceOpened {
            camera_id: camera_id.to_string(),
        });

        Ok(Box::new(SimulatedDevice {
            camera_id: camera_id.to_string(),
            state: Arc::clone(&self.state),
            events,
            closed: false,
        }))
    }

    fn create_image_reader(
        &self,
        size: Size,
        format: ImageFormat,
        max_images: u32,
    ) -> Result<ImageReader, DeviceError> {
        let surface = Surface {
            id: SurfaceId::allocate(),
            kind: SurfaceKind::ImageReader,
            size,
        };

        let mut state = self.state.lock();
        state.readers.insert(surface.id, size);
        state.calls.push(DeviceCall::CreateImageReader {
            surface: surface.id,
        });

        Ok(ImageReader {
            surface,
            format,
            max_images,
        })
    }

    fn close_image_reader(&self, reader: &ImageReader) {
        let mut state = self.state.lock();
        state.readers.remove(&reader.surface.id);
        state.calls.push(DeviceCall::CloseImageReader {
            surface: reader.surface.id,
        });
    }
}

/// Handle returned by [`SimulatedBackend::open`]
pub struct SimulatedDevice {
    camera_id: String,
    state: Arc<Mutex<SimState>>,
    events: EventSink,
    closed: bool,
}

impl SimulatedDevice {
    fn ensure_open(&self) -> Result<(), DeviceError> {
        if self.closed {
            Err(DeviceError::Disconnected {
                camera_id: self.camera_id.clone(),
            })
        } else {
            Ok(())
        }
    }

    fn emit_all(&self, events: Vec<CameraEvent>) {
        for event in events {
            self.events.emit(event);
        }
    }

    fn jpeg_for(size: Size) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
        data.extend_from_slice(&size.width.to_be_bytes());
        data.extend_from_slice(&size.height.to_be_bytes());
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }
}

impl CameraDevice for SimulatedDevice {
    fn id(&self) -> &str {
        &self.camera_id
    }

    fn create_capture_session(&mut self, outputs: &[Surface]) -> Result<SessionId, DeviceError> {
        self.ensure_open()?;

        let (session, event) = {
            let mut state = self.state.lock();
            state.next_session += 1;
            let session = SessionId(state.next_session);
            state.calls.push(DeviceCall::CreateSession {
                session,
                outputs: outputs.iter().map(|surface| surface.id).collect(),
            });

            let rejected = state
                .fail_sessions_with
                .map(|kind| outputs.iter().any(|surface| surface.kind == kind))
                .unwrap_or(false);

            if rejected {
                (session, CameraEvent::SessionConfigFailed { session })
            } else {
                state.live_sessions.insert(session, outputs.to_vec());
                state.max_live_sessions = state.max_live_sessions.max(state.live_sessions.len());
                (session, CameraEvent::SessionConfigured { session })
            }
        };

        debug!("Simulated {} created for {} outputs", session, outputs.len());
        self.events.emit(event);
        Ok(session)
    }

    fn capture(
        &mut self,
        session: SessionId,
        request: &CaptureRequest,
    ) -> Result<RequestId, DeviceError> {
        self.ensure_open()?;

        let (request_id, events) = {
            let mut state = self.state.lock();
            state.ensure_live(session)?;
            state.calls.push(DeviceCall::Capture {
                session,
                request: request.clone(),
            });

            let request_id = state.next_request();
            let frame_number = state.next_frame();
            let mut events = vec![CameraEvent::CaptureStarted {
                session,
                request: request_id,
                frame_number,
            }];

            if state.fail_captures {
                events.push(CameraEvent::CaptureFailed {
                    session,
                    request: request_id,
                    reason: "simulated capture failure".to_string(),
                });
            } else {
                for target in &request.targets {
                    if let Some(size) = state.readers.get(target) {
                        events.push(CameraEvent::ImageAvailable {
                            reader: *target,
                            image: CapturedImage::new(
                                Self::jpeg_for(*size),
                                *size,
                                ImageFormat::Jpeg,
                            ),
                        });
                    }
                }
                events.push(CameraEvent::CaptureCompleted {
                    session,
                    request: request_id,
                    frame_number,
                });
            }

            (request_id, events)
        };

        self.emit_all(events);
        Ok(request_id)
    }

    fn set_repeating_request(
        &mut self,
        session: SessionId,
        request: &CaptureRequest,
    ) -> Result<RequestId, DeviceError> {
        self.ensure_open()?;

        // One streamed frame stands in for the endless repetition
        let (request_id, events) = {
            let mut state = self.state.lock();
            state.ensure_live(session)?;
            state.calls.push(DeviceCall::SetRepeating {
                session,
                request: request.clone(),
            });

            let request_id = state.next_request();
            let frame_number = state.next_frame();
            (
                request_id,
                vec![
                    CameraEvent::CaptureStarted {
                        session,
                        request: request_id,
                        frame_number,
                    },
                    CameraEvent::CaptureCompleted {
                        session,
                        request: request_id,
                        frame_number,
                    },
                ],
            )
        };

        self.emit_all(events);
        Ok(request_id)
    }

    fn stop_repeating(&mut self, session: SessionId) -> Result<(), DeviceError> {
        self.ensure_open()?;

        let mut state = self.state.lock();
        state.ensure_live(session)?;
        state.calls.push(DeviceCall::StopRepeating { session });
        Ok(())
    }

    fn close_session(&mut self, session: SessionId) {
        let mut state = self.state.lock();
        state.live_sessions.remove(&session);
        state.calls.push(DeviceCall::CloseSession { session });
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let mut state = self.state.lock();
        state.live_sessions.clear();
        state.open_camera = None;
        state.sink = None;
        state.calls.push(DeviceCall::CloseDevice {
            camera_id: self.camera_id.clone(),
        });
        info!("Simulated camera {} closed", self.camera_id);
    }
}

impl Drop for SimulatedDevice {
    fn drop(&mut self) {
        self.close();
    }
}
