#![forbid(unsafe_code)]

// Native-only tool; keep a wasm32 stub so `--target wasm32-unknown-unknown --workspace` builds.
#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::io::{self, BufWriter, Write};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use aero_vsync::{ShutdownPolicy, Vsync, VsyncConfig, WakeMode};
    use anyhow::{anyhow, bail, Context, Result};
    use clap::{Parser, ValueEnum};

    #[derive(Debug, Clone, Copy, ValueEnum)]
    enum WakeModeArg {
        Single,
        Broadcast,
    }

    impl From<WakeModeArg> for WakeMode {
        fn from(arg: WakeModeArg) -> Self {
            match arg {
                WakeModeArg::Single => WakeMode::SingleWaiter,
                WakeModeArg::Broadcast => WakeMode::Broadcast,
            }
        }
    }

    #[derive(Debug, Parser)]
    #[command(about = "Drive an aero_vsync::Vsync generator and report frame pacing")]
    pub struct Args {
        /// Refresh rate in Hz (overrides AERO_VSYNC_HZ).
        #[arg(long)]
        hz: Option<u32>,

        /// Number of vsync waits each waiter thread performs.
        #[arg(long, default_value_t = 60)]
        frames: u64,

        /// Number of threads waiting on the generator concurrently.
        #[arg(long, default_value_t = 1)]
        waiters: usize,

        /// How a tick wakes waiters (overrides AERO_VSYNC_WAKE_MODE).
        ///
        /// With `single` and more than one waiter, waiters compete for ticks and some frames take
        /// several intervals.
        #[arg(long, value_enum)]
        wake_mode: Option<WakeModeArg>,

        /// Release blocked waiters when the generator stops (overrides AERO_VSYNC_SHUTDOWN).
        #[arg(long)]
        release_waiters_on_stop: bool,

        /// Busy time spent in the tick callback, in microseconds.
        ///
        /// Useful to observe drift: the ticker does not compensate for callback time.
        #[arg(long, default_value_t = 0)]
        callback_work_us: u64,

        /// Only print the summary, not every frame.
        #[arg(long)]
        quiet: bool,

        /// Print generator metrics in Prometheus text format after stopping.
        #[arg(long)]
        metrics: bool,
    }

    struct FrameStats {
        count: u64,
        total: Duration,
        min: Duration,
        max: Duration,
    }

    impl FrameStats {
        fn from_frames(frames: &[Duration]) -> Option<Self> {
            let min = *frames.iter().min()?;
            let max = *frames.iter().max()?;
            Some(Self {
                count: frames.len() as u64,
                total: frames.iter().sum(),
                min,
                max,
            })
        }

        fn mean(&self) -> Duration {
            Duration::from_secs_f64(self.total.as_secs_f64() / self.count as f64)
        }
    }

    fn ms(d: Duration) -> f64 {
        d.as_secs_f64() * 1000.0
    }

    fn build_config(args: &Args) -> Result<VsyncConfig> {
        let mut config = VsyncConfig::from_env().context("invalid AERO_VSYNC_* environment")?;
        if let Some(hz) = args.hz {
            config = config.with_refresh_hz(hz)?;
        }
        if let Some(mode) = args.wake_mode {
            config = config.with_wake_mode(mode.into());
        }
        if args.release_waiters_on_stop {
            config = config.with_shutdown_policy(ShutdownPolicy::ReleaseWaiters);
        }
        Ok(config)
    }

    /// Frame-time slots reserved up front; longer runs grow the buffer as they go.
    const MAX_PREALLOCATED_FRAMES: usize = 4096;

    fn frame_capacity(frames: u64) -> usize {
        usize::try_from(frames)
            .unwrap_or(usize::MAX)
            .min(MAX_PREALLOCATED_FRAMES)
    }

    fn run_waiter(vsync: &Vsync, frames: u64) -> Vec<Duration> {
        let mut times = Vec::with_capacity(frame_capacity(frames));
        for _ in 0..frames {
            let start = Instant::now();
            vsync.wait_until_next_vsync();
            times.push(start.elapsed());
        }
        times
    }

    pub fn main() -> Result<()> {
        let args = Args::parse();
        if args.waiters == 0 {
            bail!("--waiters must be at least 1");
        }

        let config = build_config(&args)?;
        tracing::info!(
            refresh_hz = config.refresh_hz.get(),
            wake_mode = config.wake_mode.as_str(),
            shutdown = config.shutdown.as_str(),
            "starting vsync generator"
        );

        let callbacks = Arc::new(AtomicU64::new(0));
        let work = Duration::from_micros(args.callback_work_us);
        let vsync = {
            let callbacks = Arc::clone(&callbacks);
            Vsync::with_config(
                move || {
                    callbacks.fetch_add(1, Ordering::Relaxed);
                    if !work.is_zero() {
                        let start = Instant::now();
                        while start.elapsed() < work {
                            std::hint::spin_loop();
                        }
                    }
                },
                config,
            )
            .context("failed to start vsync generator")?
        };
        let vsync = Arc::new(vsync);

        let started = Instant::now();
        let handles = (0..args.waiters)
            .map(|i| {
                let vsync = Arc::clone(&vsync);
                let frames = args.frames;
                thread::Builder::new()
                    .name(format!("vsync-waiter-{i}"))
                    .spawn(move || run_waiter(&vsync, frames))
                    .with_context(|| format!("failed to spawn waiter {i}"))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut per_waiter = Vec::with_capacity(handles.len());
        for handle in handles {
            per_waiter.push(
                handle
                    .join()
                    .map_err(|_| anyhow!("waiter thread panicked"))?,
            );
        }
        let wall = started.elapsed();

        vsync.join();

        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());

        writeln!(
            out,
            "refresh_hz={} interval_us={} wake_mode={} waiters={}",
            vsync.refresh_rate(),
            vsync.interval().as_micros(),
            vsync.wake_mode().as_str(),
            args.waiters
        )?;

        for (waiter, frames) in per_waiter.iter().enumerate() {
            if !args.quiet {
                for (frame, time) in frames.iter().enumerate() {
                    writeln!(out, "waiter {waiter} frame {frame}: {:.3} ms", ms(*time))?;
                }
            }
            match FrameStats::from_frames(frames) {
                Some(stats) => writeln!(
                    out,
                    "summary: waiter={waiter} frames={} mean_ms={:.3} min_ms={:.3} max_ms={:.3}",
                    stats.count,
                    ms(stats.mean()),
                    ms(stats.min),
                    ms(stats.max)
                )?,
                None => writeln!(out, "summary: waiter={waiter} frames=0")?,
            }
        }

        writeln!(
            out,
            "ticks={} callbacks={} wall_ms={:.3}",
            vsync.tick_count(),
            callbacks.load(Ordering::Relaxed),
            ms(wall)
        )?;

        if args.metrics {
            write!(out, "{}", vsync.metrics().render_prometheus())?;
        }

        out.flush()?;
        Ok(())
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    native::main()
}
