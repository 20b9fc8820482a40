//! Render dispatch: a pool of worker threads fed over channels, a token per
//! render generation, and a frame assembler that only accepts strips from
//! the newest generation.

use crate::perturbation::ReferenceOrbit;
use crate::worker::run_worker;
use dashu::integer::IBig;
use deepbrot_core::fixed::to_f64;
use deepbrot_core::{
    max_iterations, partition_rows, strip_height, CoreError, OrbitPublish, RenderMode,
    RenderRequest, StripResult, WorkerJob,
};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::JoinHandle;
use thiserror::Error;

/// Monotonically increasing render generation. A new token supersedes every
/// older one; superseded work finishes but its strips are discarded.
pub type RenderToken = u64;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("no render in flight")]
    NoActiveRender,
    #[error("worker pool unavailable")]
    WorkersUnavailable,
}

/// Leave one core for the embedder, never more than eight workers.
pub fn default_worker_count() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    cores.saturating_sub(1).clamp(1, 8)
}

/// A completed RGBA8 frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Accumulates strips of one render generation into a frame buffer.
pub struct FrameAssembler {
    token: RenderToken,
    width: u32,
    height: u32,
    remaining_rows: u32,
    pixels: Vec<u8>,
}

impl FrameAssembler {
    pub fn new(token: RenderToken, width: u32, height: u32) -> Self {
        Self {
            token,
            width,
            height,
            remaining_rows: height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn token(&self) -> RenderToken {
        self.token
    }

    /// Apply one strip. Strips from a superseded generation, or whose buffer
    /// disagrees with the declared dimensions, are dropped.
    pub fn apply(&mut self, result: &StripResult) -> bool {
        if result.token != self.token {
            log::debug!(
                "dropping strip at row {} from superseded render {}",
                result.origin_row,
                result.token
            );
            return false;
        }
        let expected = self.width as usize * result.row_count as usize * 4;
        if result.pixels.len() != expected
            || result.origin_row + result.row_count > self.height
        {
            log::debug!("dropping malformed strip at row {}", result.origin_row);
            return false;
        }

        let start = result.origin_row as usize * self.width as usize * 4;
        self.pixels[start..start + expected].copy_from_slice(&result.pixels);
        self.remaining_rows = self.remaining_rows.saturating_sub(result.row_count);
        true
    }

    pub fn is_complete(&self) -> bool {
        self.remaining_rows == 0
    }

    pub fn into_frame(self) -> Frame {
        Frame {
            width: self.width,
            height: self.height,
            pixels: self.pixels,
        }
    }
}

pub struct Dispatcher {
    job_senders: Vec<Sender<WorkerJob>>,
    handles: Vec<JoinHandle<()>>,
    results: Receiver<StripResult>,
    next_token: RenderToken,
    active: Option<FrameAssembler>,
}

impl Dispatcher {
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (result_tx, result_rx) = channel();
        let mut job_senders = Vec::with_capacity(worker_count);
        let mut handles = Vec::with_capacity(worker_count);

        for index in 0..worker_count {
            let (job_tx, job_rx) = channel();
            let results = result_tx.clone();
            let spawned = std::thread::Builder::new()
                .name(format!("deepbrot-worker-{index}"))
                .spawn(move || run_worker(job_rx, results));
            match spawned {
                Ok(handle) => {
                    job_senders.push(job_tx);
                    handles.push(handle);
                }
                Err(err) => log::error!("failed to spawn worker {index}: {err}"),
            }
        }

        Self {
            job_senders,
            handles,
            results: result_rx,
            next_token: 0,
            active: None,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.job_senders.len()
    }

    /// Start a render, superseding any in-flight one. For perturbation the
    /// reference orbit is computed here (once, at the camera center) and
    /// broadcast before any strip job goes out.
    pub fn begin_render(&mut self, request: &RenderRequest) -> Result<RenderToken, DispatchError> {
        if self.job_senders.is_empty() {
            return Err(DispatchError::WorkersUnavailable);
        }

        let camera = &request.camera;
        let width = camera.canvas_width();
        let height = camera.canvas_height();
        let iterations = max_iterations(camera.magnification_log2(), request.max_iterations_cap);
        let pixel_step = request.pixel_step.clamp(1, 16);
        let frame = camera.fixed_snapshot()?;

        self.next_token += 1;
        let token = self.next_token;

        let reference = match request.mode {
            RenderMode::DirectFixedPoint => None,
            RenderMode::Perturbation => {
                let center_x = &frame.origin_x + IBig::from(width / 2) * &frame.scale;
                let center_y = &frame.origin_y + IBig::from(height / 2) * &frame.scale;
                let orbit = ReferenceOrbit::compute(&center_x, &center_y, frame.bits, iterations);
                for sender in &self.job_senders {
                    let publish = OrbitPublish {
                        token,
                        max_iterations: iterations,
                        orbit: orbit.orbit.clone(),
                    };
                    if sender.send(WorkerJob::PublishOrbit { publish }).is_err() {
                        log::error!("worker exited before orbit publish");
                    }
                }
                Some(orbit)
            }
        };

        let strips = partition_rows(height, strip_height(height, self.job_senders.len()));
        for (index, strip) in strips.iter().enumerate() {
            let job = match (&request.mode, &reference) {
                (RenderMode::DirectFixedPoint, _) => WorkerJob::FixedStrip {
                    token,
                    canvas_width: width,
                    origin_row: strip.origin_row,
                    row_count: strip.row_count,
                    pixel_step,
                    max_iterations: iterations,
                    precision_bits: frame.bits,
                    world_origin_x: frame.origin_x.clone(),
                    world_origin_y: frame.origin_y.clone(),
                    world_scale: frame.scale.clone(),
                },
                (RenderMode::Perturbation, Some(orbit)) => WorkerJob::PerturbationStrip {
                    token,
                    canvas_width: width,
                    origin_row: strip.origin_row,
                    row_count: strip.row_count,
                    pixel_step,
                    max_iterations: iterations,
                    world_origin_x: to_f64(&frame.origin_x, frame.bits),
                    world_origin_y: to_f64(&frame.origin_y, frame.bits),
                    world_scale: to_f64(&frame.scale, frame.bits),
                    reference_x: orbit.reference.0,
                    reference_y: orbit.reference.1,
                },
                (RenderMode::Perturbation, None) => unreachable!("orbit computed above"),
            };
            let sender = &self.job_senders[index % self.job_senders.len()];
            if sender.send(job).is_err() {
                log::error!("worker exited, strip at row {} lost", strip.origin_row);
            }
        }

        self.active = Some(FrameAssembler::new(token, width, height));
        Ok(token)
    }

    /// Block until every strip of the newest render has landed, discarding
    /// strips of superseded generations along the way.
    pub fn collect_frame(&mut self) -> Result<Frame, DispatchError> {
        let mut assembler = self.active.take().ok_or(DispatchError::NoActiveRender)?;
        while !assembler.is_complete() {
            match self.results.recv() {
                Ok(result) => {
                    assembler.apply(&result);
                }
                Err(_) => {
                    log::error!("worker pool disconnected mid-render");
                    return Err(DispatchError::WorkersUnavailable);
                }
            }
        }
        Ok(assembler.into_frame())
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        for sender in &self.job_senders {
            let _ = sender.send(WorkerJob::Shutdown);
        }
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                log::error!("worker thread panicked");
            }
        }
    }
}
