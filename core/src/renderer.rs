//! Tile-parallel render scheduler.

use crate::camera::Camera;
use crate::common::{min, Float};
use crate::error::{Error, Result};
use crate::film::RenderBuffer;
use crate::integrator::Integrator;
use crate::rng::RNG;
use crate::scene::Scene;
use crate::spectrum::RGBSpectrum;
use indicatif::{ProgressBar, ProgressStyle};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: usize = 16;

/// Lifecycle of a `Renderer`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RenderState {
    /// No render has been started since construction or the last `reset()`.
    Idle = 0,

    /// Worker pool is active.
    Rendering = 1,

    /// The last render ran to completion (possibly reporting a worker
    /// failure).
    Completed = 2,

    /// The last render was cancelled cooperatively.
    Cancelled = 3,
}

impl RenderState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Rendering,
            2 => Self::Completed,
            3 => Self::Cancelled,
            _ => Self::Idle,
        }
    }
}

/// Drives the configured integrator across every pixel using a fixed pool of
/// worker threads.
///
/// The image is partitioned into square tiles dispatched in row-major order
/// over a bounded channel. Each tile accumulates into worker-private channel
/// arrays and commits them to the shared `RenderBuffer` in one short lock
/// window. Progress is a monotonically non-decreasing completed-pixel
/// fraction readable from any thread; cancellation is cooperative at sample
/// granularity.
pub struct Renderer {
    integrator: Box<dyn Integrator>,
    samples_per_pixel: usize,
    tile_size: usize,
    n_threads: usize,
    progress_bar: bool,
    state: AtomicU8,
    cancelled: AtomicBool,
    pixels_done: AtomicUsize,
    pixels_total: AtomicUsize,
}

impl Renderer {
    /// Creates a renderer with the given integrator, one sample per pixel
    /// and a worker per available hardware thread.
    ///
    /// * `integrator` - The light-transport strategy.
    pub fn new(integrator: Box<dyn Integrator>) -> Self {
        let n_threads = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self {
            integrator,
            samples_per_pixel: 1,
            tile_size: DEFAULT_TILE_SIZE,
            n_threads,
            progress_bar: true,
            state: AtomicU8::new(RenderState::Idle as u8),
            cancelled: AtomicBool::new(false),
            pixels_done: AtomicUsize::new(0),
            pixels_total: AtomicUsize::new(0),
        }
    }

    /// Replaces the integrator. Only valid between render runs.
    ///
    /// * `integrator` - The light-transport strategy.
    pub fn set_integrator(&mut self, integrator: Box<dyn Integrator>) {
        self.integrator = integrator;
    }

    /// Sets the number of samples per pixel (clamped to at least 1).
    ///
    /// * `samples` - Samples per pixel.
    pub fn set_samples(&mut self, samples: usize) {
        self.samples_per_pixel = samples.max(1);
    }

    /// Forwards the maximum bounce depth to the integrator.
    ///
    /// * `depth` - Maximum number of bounces.
    pub fn set_max_depth(&mut self, depth: usize) {
        self.integrator.set_max_depth(depth);
    }

    /// Sets the tile edge length (clamped to at least 1).
    ///
    /// * `tile_size` - Tile edge length in pixels.
    pub fn set_tile_size(&mut self, tile_size: usize) {
        self.tile_size = tile_size.max(1);
    }

    /// Sets the worker pool size (clamped to at least 1).
    ///
    /// * `n_threads` - Number of worker threads.
    pub fn set_threads(&mut self, n_threads: usize) {
        self.n_threads = n_threads.max(1);
    }

    /// Enables or disables the terminal progress bar. The numeric progress
    /// fraction is tracked either way.
    ///
    /// * `enabled` - Whether to draw the bar.
    pub fn set_progress_bar(&mut self, enabled: bool) {
        self.progress_bar = enabled;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RenderState {
        RenderState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Requests cooperative cancellation. Workers observe the flag between
    /// samples, so cancellation latency is bounded by one sample's cost per
    /// tile; in-flight tiles are abandoned without committing.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns true when the current or last render was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Completed fraction of the current render in `[0, 1]`, monotonically
    /// non-decreasing while rendering. Returns the last known value before
    /// any render has started.
    pub fn progress(&self) -> Float {
        let total = self.pixels_total.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        self.pixels_done.load(Ordering::Relaxed) as Float / total as Float
    }

    /// Returns to `Idle` from a terminal state, clearing the cancellation
    /// flag and progress counters.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
        self.pixels_done.store(0, Ordering::Relaxed);
        self.pixels_total.store(0, Ordering::Relaxed);
        self.state.store(RenderState::Idle as u8, Ordering::Release);
    }

    /// Renders the scene into the buffer, blocking until completion,
    /// cancellation or failure.
    ///
    /// A failing tile never corrupts the shared buffer: its contribution is
    /// simply not committed and the first failure is reported after the pool
    /// drains. Cancellation is not an error; check `is_cancelled()`.
    ///
    /// * `scene`      - Surface-intersection provider; read-only for the
    ///                  duration of the render.
    /// * `camera`     - Primary ray generator.
    /// * `background` - Environment radiance for escaped rays.
    /// * `buffer`     - Shared accumulation target.
    pub fn render(
        &self,
        scene: &dyn Scene,
        camera: &dyn Camera,
        background: &RGBSpectrum,
        buffer: &RenderBuffer,
    ) -> Result<()> {
        self.begin()?;

        let (width, height) = (buffer.width(), buffer.height());
        self.pixels_done.store(0, Ordering::Relaxed);
        self.pixels_total.store(width * height, Ordering::Relaxed);

        // Partition the image into row-major tiles.
        let tiles = self.partition(width, height);
        info!(
            "Rendering {}x{} as {} tiles of {}px on {} threads",
            width,
            height,
            tiles.len(),
            self.tile_size,
            self.n_threads
        );

        let progress = if self.progress_bar {
            ProgressBar::new(tiles.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        progress.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tiles")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let failure: Mutex<Option<String>> = Mutex::new(None);

        thread::scope(|scope| {
            let (tx, rx) = crossbeam_channel::bounded::<usize>(self.n_threads);

            // Spawn worker threads.
            for _ in 0..self.n_threads {
                let rxc = rx.clone();
                let tiles = &tiles;
                let failure = &failure;
                let progress = &progress;
                scope.spawn(move || {
                    for tile_idx in rxc.iter() {
                        if self.cancelled.load(Ordering::Acquire) {
                            continue; // Drain the queue without rendering.
                        }
                        let (x0, y0, x1, y1) = tiles[tile_idx];
                        let result = catch_unwind(AssertUnwindSafe(|| {
                            self.render_tile(tile_idx, (x0, y0, x1, y1), scene, camera, background, buffer)
                        }));
                        match result {
                            Ok(Some(committed)) => {
                                self.pixels_done.fetch_add(committed, Ordering::Relaxed);
                                progress.inc(1);
                            }
                            Ok(None) => {} // Cancelled mid-tile; nothing committed.
                            Err(panic) => {
                                let msg = panic_message(panic);
                                warn!("Tile ({x0},{y0})..({x1},{y1}) failed: {msg}");
                                let mut failure = failure.lock().unwrap();
                                if failure.is_none() {
                                    *failure = Some(msg);
                                }
                            }
                        }
                    }
                });
            }
            drop(rx); // Each worker holds its own clone.

            // Send work; stop feeding once cancellation is observed.
            for tile_idx in 0..tiles.len() {
                if self.cancelled.load(Ordering::Acquire) {
                    break;
                }
                if tx.send(tile_idx).is_err() {
                    break;
                }
            }
        });

        // Classify the outcome now that every worker has joined.
        if self.is_cancelled() {
            progress.abandon_with_message("cancelled");
            info!("Render cancelled");
            self.state.store(RenderState::Cancelled as u8, Ordering::Release);
            return Ok(());
        }

        self.state.store(RenderState::Completed as u8, Ordering::Release);
        match failure.into_inner().unwrap() {
            Some(msg) => {
                progress.abandon_with_message("failed");
                Err(Error::WorkerFailure(msg))
            }
            None => {
                progress.finish_with_message("done");
                info!("Render finished");
                Ok(())
            }
        }
    }

    /// Transitions to `Rendering`, failing if a render is already in flight.
    fn begin(&self) -> Result<()> {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current == RenderState::Rendering as u8 {
                return Err(Error::RenderInProgress);
            }
            match self.state.compare_exchange_weak(
                current,
                RenderState::Rendering as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.cancelled.store(false, Ordering::Release);
                    return Ok(());
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Computes the row-major tile rectangles covering `width` x `height`.
    fn partition(&self, width: usize, height: usize) -> Vec<(usize, usize, usize, usize)> {
        let mut tiles = Vec::new();
        let mut y0 = 0;
        while y0 < height {
            let y1 = min(y0 + self.tile_size, height);
            let mut x0 = 0;
            while x0 < width {
                let x1 = min(x0 + self.tile_size, width);
                tiles.push((x0, y0, x1, y1));
                x0 = x1;
            }
            y0 = y1;
        }
        tiles
    }

    /// Renders one tile into worker-private channel arrays and commits it.
    /// Returns the number of committed pixels, or `None` when cancellation
    /// was observed mid-tile (nothing committed).
    fn render_tile(
        &self,
        tile_idx: usize,
        (x0, y0, x1, y1): (usize, usize, usize, usize),
        scene: &dyn Scene,
        camera: &dyn Camera,
        background: &RGBSpectrum,
        buffer: &RenderBuffer,
    ) -> Option<usize> {
        let (width, height) = (buffer.width(), buffer.height());
        let (tile_w, tile_h) = (x1 - x0, y1 - y0);
        let mut tile_r = vec![0.0f32; tile_w * tile_h];
        let mut tile_g = vec![0.0f32; tile_w * tile_h];
        let mut tile_b = vec![0.0f32; tile_w * tile_h];

        // One RNG stream per tile keeps renders reproducible regardless of
        // which worker picks the tile up.
        let mut rng = RNG::new(tile_idx as u64);
        let inv_spp = 1.0 / self.samples_per_pixel as Float;

        for y in y0..y1 {
            for x in x0..x1 {
                let mut c = RGBSpectrum::ZERO;
                for _ in 0..self.samples_per_pixel {
                    if self.cancelled.load(Ordering::Acquire) {
                        return None;
                    }
                    let u = (x as Float + rng.uniform_float()) / width as Float;
                    let v = (y as Float + rng.uniform_float()) / height as Float;
                    let lens_uv = rng.uniform_2d();
                    let time_u = rng.uniform_float();
                    let ray = camera.generate_ray(u, v, lens_uv, time_u);

                    let mut l = self.integrator.li(&ray, scene, background, &mut rng);
                    if l.has_nans() {
                        warn!("NaN radiance at pixel ({x},{y}); setting sample to black");
                        l = RGBSpectrum::ZERO;
                    }
                    c += l;
                }
                c *= inv_spp;
                let idx = (y - y0) * tile_w + (x - x0);
                let rgb = c.to_rgb();
                tile_r[idx] = rgb[0];
                tile_g[idx] = rgb[1];
                tile_b[idx] = rgb[2];
            }
        }

        buffer.commit_tile(x0, y0, x1, y1, &tile_r, &tile_g, &tile_b);
        Some(tile_w * tile_h)
    }
}

/// Extracts a readable message from a worker panic payload.
fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "worker panicked".to_string()
    }
}
