//! Worker loop: receives strip jobs, renders them, sends colored strips back.

use crate::colorize::colorize;
use crate::fixed_kernel::escape_time_fixed;
use crate::perturbation::escape_time_perturbation;
use dashu::integer::IBig;
use deepbrot_core::{OrbitPublish, StripResult, WorkerJob};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

/// Token-keyed cache of published reference orbits. Two entries cover one
/// in-flight render plus its successor; older orbits are evicted.
pub struct OrbitStore {
    entries: Vec<(u64, Arc<OrbitPublish>)>,
}

impl OrbitStore {
    const CAPACITY: usize = 2;

    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, publish: OrbitPublish) {
        self.entries.retain(|(token, _)| *token != publish.token);
        if self.entries.len() == Self::CAPACITY {
            self.entries.remove(0);
        }
        self.entries.push((publish.token, Arc::new(publish)));
    }

    pub fn get(&self, token: u64) -> Option<&Arc<OrbitPublish>> {
        self.entries
            .iter()
            .find(|(entry_token, _)| *entry_token == token)
            .map(|(_, orbit)| orbit)
    }
}

impl Default for OrbitStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Process jobs until `Shutdown` arrives or either channel closes.
pub fn run_worker(jobs: Receiver<WorkerJob>, results: Sender<StripResult>) {
    let mut orbits = OrbitStore::new();

    while let Ok(job) = jobs.recv() {
        match job {
            WorkerJob::Shutdown => break,
            WorkerJob::PublishOrbit { publish } => orbits.insert(publish),
            WorkerJob::FixedStrip {
                token,
                canvas_width,
                origin_row,
                row_count,
                pixel_step,
                max_iterations,
                precision_bits,
                world_origin_x,
                world_origin_y,
                world_scale,
            } => {
                let pixels = render_fixed_strip(
                    canvas_width,
                    origin_row,
                    row_count,
                    pixel_step,
                    max_iterations,
                    precision_bits,
                    &world_origin_x,
                    &world_origin_y,
                    &world_scale,
                );
                let result = StripResult {
                    token,
                    origin_row,
                    row_count,
                    pixels,
                };
                if results.send(result).is_err() {
                    break;
                }
            }
            WorkerJob::PerturbationStrip {
                token,
                canvas_width,
                origin_row,
                row_count,
                pixel_step,
                max_iterations,
                world_origin_x,
                world_origin_y,
                world_scale,
                reference_x,
                reference_y,
            } => {
                let Some(orbit) = orbits.get(token) else {
                    log::debug!("no orbit for render {token}, dropping strip at row {origin_row}");
                    continue;
                };
                let pixels = render_perturbation_strip(
                    canvas_width,
                    origin_row,
                    row_count,
                    pixel_step,
                    max_iterations,
                    world_origin_x,
                    world_origin_y,
                    world_scale,
                    reference_x,
                    reference_y,
                    &orbit.orbit,
                );
                let result = StripResult {
                    token,
                    origin_row,
                    row_count,
                    pixels,
                };
                if results.send(result).is_err() {
                    break;
                }
            }
        }
    }
}

/// Render a strip with the fixed-point kernel. Rows are absolute canvas
/// rows; world coordinates are fixed-point at `bits`.
#[allow(clippy::too_many_arguments)]
pub fn render_fixed_strip(
    canvas_width: u32,
    origin_row: u32,
    row_count: u32,
    pixel_step: u32,
    max_iterations: u32,
    bits: usize,
    origin_x: &IBig,
    origin_y: &IBig,
    scale: &IBig,
) -> Vec<u8> {
    let step = pixel_step.max(1);
    let mut out = vec![0u8; strip_bytes(canvas_width, row_count)];

    let mut yy = 0;
    while yy < row_count {
        let row = origin_row + yy;
        let cy = origin_y + IBig::from(row) * scale;
        let mut xx = 0;
        while xx < canvas_width {
            let cx = origin_x + IBig::from(xx) * scale;
            let data = escape_time_fixed(&cx, &cy, bits, max_iterations);
            fill_block(&mut out, canvas_width, row_count, xx, yy, step, colorize(&data));
            xx += step;
        }
        yy += step;
    }
    out
}

/// Render a strip with the perturbation kernel against an f64 orbit.
#[allow(clippy::too_many_arguments)]
pub fn render_perturbation_strip(
    canvas_width: u32,
    origin_row: u32,
    row_count: u32,
    pixel_step: u32,
    max_iterations: u32,
    origin_x: f64,
    origin_y: f64,
    scale: f64,
    reference_x: f64,
    reference_y: f64,
    orbit: &[(f64, f64)],
) -> Vec<u8> {
    let step = pixel_step.max(1);
    let mut out = vec![0u8; strip_bytes(canvas_width, row_count)];

    let mut yy = 0;
    while yy < row_count {
        let row = origin_row + yy;
        let cy = origin_y + f64::from(row) * scale;
        let mut xx = 0;
        while xx < canvas_width {
            let cx = origin_x + f64::from(xx) * scale;
            let dc_re = cx - reference_x;
            let dc_im = cy - reference_y;
            let data = escape_time_perturbation(dc_re, dc_im, orbit, max_iterations);
            fill_block(&mut out, canvas_width, row_count, xx, yy, step, colorize(&data));
            xx += step;
        }
        yy += step;
    }
    out
}

fn strip_bytes(canvas_width: u32, row_count: u32) -> usize {
    canvas_width as usize * row_count as usize * 4
}

/// Paint a `step`-sized block with one color, clipped to the strip.
fn fill_block(
    out: &mut [u8],
    canvas_width: u32,
    row_count: u32,
    x0: u32,
    y0: u32,
    step: u32,
    color: [u8; 4],
) {
    let x_max = canvas_width.min(x0 + step);
    let y_max = row_count.min(y0 + step);
    for by in y0..y_max {
        for bx in x0..x_max {
            let idx = (by as usize * canvas_width as usize + bx as usize) * 4;
            out[idx..idx + 4].copy_from_slice(&color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepbrot_core::fixed::from_f64;
    use std::sync::mpsc::channel;

    fn publish(token: u64) -> OrbitPublish {
        OrbitPublish {
            token,
            max_iterations: 100,
            orbit: vec![(0.0, 0.0)],
        }
    }

    #[test]
    fn orbit_store_keeps_two_most_recent() {
        let mut store = OrbitStore::new();
        store.insert(publish(1));
        store.insert(publish(2));
        store.insert(publish(3));
        assert!(store.get(1).is_none());
        assert!(store.get(2).is_some());
        assert!(store.get(3).is_some());
    }

    #[test]
    fn orbit_store_replaces_same_token() {
        let mut store = OrbitStore::new();
        store.insert(publish(1));
        store.insert(OrbitPublish {
            token: 1,
            max_iterations: 200,
            orbit: vec![(0.0, 0.0), (1.0, 0.0)],
        });
        assert_eq!(store.get(1).unwrap().orbit.len(), 2);
    }

    #[test]
    fn fixed_strip_has_one_pixel_per_cell() {
        let origin_x = from_f64(-2.0, 64).unwrap();
        let origin_y = from_f64(-1.0, 64).unwrap();
        let scale = from_f64(4.0 / 16.0, 64).unwrap();
        let pixels = render_fixed_strip(16, 0, 8, 1, 50, 64, &origin_x, &origin_y, &scale);
        assert_eq!(pixels.len(), 16 * 8 * 4);
        // Every pixel is written, so every alpha byte is opaque.
        assert!(pixels.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn pixel_step_fills_uniform_blocks() {
        let origin_x = from_f64(-2.0, 64).unwrap();
        let origin_y = from_f64(-1.0, 64).unwrap();
        let scale = from_f64(4.0 / 16.0, 64).unwrap();
        let pixels = render_fixed_strip(16, 0, 8, 4, 50, 64, &origin_x, &origin_y, &scale);
        for block_y in (0..8).step_by(4) {
            for block_x in (0..16).step_by(4) {
                let anchor = pixel_at(&pixels, 16, block_x, block_y);
                for dy in 0..4 {
                    for dx in 0..4 {
                        assert_eq!(pixel_at(&pixels, 16, block_x + dx, block_y + dy), anchor);
                    }
                }
            }
        }
    }

    fn pixel_at(pixels: &[u8], width: usize, x: usize, y: usize) -> [u8; 4] {
        let idx = (y * width + x) * 4;
        [pixels[idx], pixels[idx + 1], pixels[idx + 2], pixels[idx + 3]]
    }

    #[test]
    fn worker_renders_fixed_strips_and_shuts_down() {
        let (job_tx, job_rx) = channel();
        let (result_tx, result_rx) = channel();
        let handle = std::thread::spawn(move || run_worker(job_rx, result_tx));

        job_tx
            .send(WorkerJob::FixedStrip {
                token: 1,
                canvas_width: 8,
                origin_row: 4,
                row_count: 2,
                pixel_step: 1,
                max_iterations: 30,
                precision_bits: 64,
                world_origin_x: from_f64(-2.0, 64).unwrap(),
                world_origin_y: from_f64(-1.0, 64).unwrap(),
                world_scale: from_f64(0.25, 64).unwrap(),
            })
            .unwrap();

        let result = result_rx.recv().unwrap();
        assert_eq!(result.token, 1);
        assert_eq!(result.origin_row, 4);
        assert_eq!(result.pixels.len(), 8 * 2 * 4);

        job_tx.send(WorkerJob::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn perturbation_strip_without_orbit_is_skipped() {
        let (job_tx, job_rx) = channel();
        let (result_tx, result_rx) = channel();
        let handle = std::thread::spawn(move || run_worker(job_rx, result_tx));

        job_tx
            .send(WorkerJob::PerturbationStrip {
                token: 99,
                canvas_width: 8,
                origin_row: 0,
                row_count: 2,
                pixel_step: 1,
                max_iterations: 30,
                world_origin_x: -2.0,
                world_origin_y: -1.0,
                world_scale: 0.25,
                reference_x: 0.0,
                reference_y: 0.0,
            })
            .unwrap();
        // A fixed strip after it proves the orbitless job produced nothing.
        job_tx
            .send(WorkerJob::FixedStrip {
                token: 100,
                canvas_width: 4,
                origin_row: 0,
                row_count: 1,
                pixel_step: 1,
                max_iterations: 10,
                precision_bits: 64,
                world_origin_x: from_f64(-2.0, 64).unwrap(),
                world_origin_y: from_f64(-1.0, 64).unwrap(),
                world_scale: from_f64(1.0, 64).unwrap(),
            })
            .unwrap();

        let result = result_rx.recv().unwrap();
        assert_eq!(result.token, 100);

        job_tx.send(WorkerJob::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn perturbation_strip_renders_after_publish() {
        let (job_tx, job_rx) = channel();
        let (result_tx, result_rx) = channel();
        let handle = std::thread::spawn(move || run_worker(job_rx, result_tx));

        let reference =
            crate::perturbation::ReferenceOrbit::compute(&IBig::ZERO, &IBig::ZERO, 64, 50);
        job_tx
            .send(WorkerJob::PublishOrbit {
                publish: OrbitPublish {
                    token: 5,
                    max_iterations: 50,
                    orbit: reference.orbit,
                },
            })
            .unwrap();
        job_tx
            .send(WorkerJob::PerturbationStrip {
                token: 5,
                canvas_width: 8,
                origin_row: 0,
                row_count: 4,
                pixel_step: 1,
                max_iterations: 50,
                world_origin_x: -2.0,
                world_origin_y: -1.0,
                world_scale: 0.5,
                reference_x: 0.0,
                reference_y: 0.0,
            })
            .unwrap();

        let result = result_rx.recv().unwrap();
        assert_eq!(result.token, 5);
        assert_eq!(result.pixels.len(), 8 * 4 * 4);

        job_tx.send(WorkerJob::Shutdown).unwrap();
        handle.join().unwrap();
    }
}
