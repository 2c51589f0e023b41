/// Stereo render session running on its own thread
///
/// The session owns independent actor copies (see
/// [`populate_vr`](crate::render::populate_vr)); it never touches the part
/// tree, so the tree needs no locking. Frames are side-by-side left/right
/// eye images handed to a [`FrameSink`].
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actor::Actor;
use crate::camera::{Camera, Orbit};
use crate::raster::{Framebuffer, CELL_ASPECT};
use crate::render::combined_bounds;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VrConfig {
    /// Distance between the eyes, as a fraction of the scene radius
    pub eye_separation: f32,
    pub fps: u32,
    /// Width of the combined side-by-side frame, in cells
    pub width: usize,
    pub height: usize,
    /// Turntable speed in radians per second
    pub spin: f32,
}

impl Default for VrConfig {
    fn default() -> Self {
        Self {
            eye_separation: 0.06,
            fps: 30,
            width: 120,
            height: 40,
            spin: 0.5,
        }
    }
}

impl VrConfig {
    /// Reject settings the render thread cannot draw with. Each eye needs at
    /// least one column, so the side-by-side frame needs two.
    pub fn validate(&self) -> Result<(), VrError> {
        let reason = if self.width < 2 {
            format!("width must be at least 2 columns, got {}", self.width)
        } else if self.height == 0 {
            "height must be at least 1 row".to_string()
        } else if self.fps == 0 {
            "fps must be at least 1".to_string()
        } else if !self.eye_separation.is_finite() || !self.spin.is_finite() {
            "eye_separation and spin must be finite".to_string()
        } else {
            return Ok(());
        };
        Err(VrError::InvalidConfig(reason))
    }
}

#[derive(Debug, Error)]
pub enum VrError {
    #[error("invalid VR settings: {0}")]
    InvalidConfig(String),
    #[error("failed to spawn VR render thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Destination for rendered stereo frames
pub trait FrameSink: Send {
    fn present(&mut self, frame: &Framebuffer);
}

impl<F> FrameSink for F
where
    F: FnMut(&Framebuffer) + Send,
{
    fn present(&mut self, frame: &Framebuffer) {
        self(frame)
    }
}

/// Keeps the most recent frame so another thread can preview it
#[derive(Debug, Clone, Default)]
pub struct SharedFrame(Arc<Mutex<Option<Framebuffer>>>);

impl SharedFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<Framebuffer> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl FrameSink for SharedFrame {
    fn present(&mut self, frame: &Framebuffer) {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        match &mut *slot {
            Some(existing)
                if existing.width() == frame.width() && existing.height() == frame.height() =>
            {
                existing.clone_from(frame)
            }
            other => *other = Some(frame.clone()),
        }
    }
}

/// Handle to a running VR render thread. Dropping it stops the thread.
#[derive(Debug)]
pub struct VrSession {
    running: Arc<AtomicBool>,
    frames: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl VrSession {
    pub fn start(
        actors: Vec<Actor>,
        config: VrConfig,
        sink: impl FrameSink + 'static,
    ) -> Result<VrSession, VrError> {
        config.validate()?;
        if actors.is_empty() {
            warn!("starting VR session without any renderable parts");
        }
        let running = Arc::new(AtomicBool::new(true));
        let frames = Arc::new(AtomicU64::new(0));

        let mut render_loop = RenderLoop {
            actors,
            config,
            sink,
            running: running.clone(),
            frames: frames.clone(),
        };
        let handle = thread::Builder::new()
            .name("vr-render".into())
            .spawn(move || render_loop.run())?;

        info!("VR session started");
        Ok(VrSession {
            running,
            frames,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
            && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Frames rendered so far
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Signal the thread and wait for it to exit
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("VR render thread panicked");
            }
            info!("VR session stopped after {} frames", self.frames());
        }
    }
}

impl Drop for VrSession {
    fn drop(&mut self) {
        self.stop();
    }
}

struct RenderLoop<S> {
    actors: Vec<Actor>,
    config: VrConfig,
    sink: S,
    running: Arc<AtomicBool>,
    frames: Arc<AtomicU64>,
}

impl<S: FrameSink> RenderLoop<S> {
    fn run(&mut self) {
        let fps = self.config.fps;
        let frame_time = Duration::from_secs_f32(1.0 / fps as f32);
        let eye_width = self.config.width / 2;
        let height = self.config.height;

        let bounds = combined_bounds(&self.actors);
        let mut head = Camera::new(eye_width as u32, height as u32).with_cell_aspect(CELL_ASPECT);
        let (pivot, radius) = match &bounds {
            Some(b) => {
                head.reset_to(b);
                (b.center(), b.radius().max(f32::EPSILON))
            }
            None => (Point3::origin(), 1.0),
        };
        let offset = self.config.eye_separation * radius / 2.0;
        let eyes = [head.with_eye_offset(-offset), head.with_eye_offset(offset)];
        debug!("VR eyes {eye_width}x{height}, separation {}", offset * 2.0);

        let mut orbit = Orbit::default();
        let mut eye = Framebuffer::new(eye_width, height);
        let mut frame = Framebuffer::new(eye_width * 2, height);

        while self.running.load(Ordering::Acquire) {
            let frame_start = Instant::now();

            orbit.rotate(0.0, self.config.spin / fps as f32, 0.0);
            let model = orbit.matrix_about(&pivot);

            for (i, camera) in eyes.iter().enumerate() {
                eye.clear();
                eye.render_actors(&self.actors, &model, camera);
                frame.blit(&eye, i * eye_width);
            }
            self.sink.present(&frame);
            self.frames.fetch_add(1, Ordering::Relaxed);

            let elapsed = frame_start.elapsed();
            if elapsed < frame_time {
                thread::sleep(frame_time - elapsed);
            }
        }
    }
}
