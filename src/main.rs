//! cv_timelapse - capture a timestamped picture at a fixed interval and make a movie of each day
//!
//! Runs until interrupted (Ctrl-C), finalizing the day in progress before exiting.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

use cv_timelapse::config::{
    DEFAULT_DEVICE, DEFAULT_DIRECTORY, DEFAULT_RESOLUTION, DEFAULT_SECONDS
};
use cv_timelapse::encoder::DEFAULT_ENCODER;
use cv_timelapse::{
    CaptureDevice, CommandEncoder, Config, DayReport, FinalizeOutcome, Resolution, Shutdown,
    SimulatedCamera, StorageLayout, Timelapse
};

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "cv_timelapse", about = "Capture a timestamped picture every few seconds")]
struct Args {
    /// Directory to store files
    #[arg(short, long, default_value = DEFAULT_DIRECTORY)]
    directory: PathBuf,

    /// Seconds between two shots
    #[arg(short, long, default_value_t = DEFAULT_SECONDS)]
    seconds: u64,

    /// Resolution of camera, WIDTHxHEIGHT
    #[arg(short, long, default_value = DEFAULT_RESOLUTION)]
    resolution: String,

    /// V4L2 device node
    #[arg(long, default_value = DEFAULT_DEVICE)]
    device: PathBuf,

    /// Encoder used to make the daily movie
    #[arg(long, default_value = DEFAULT_ENCODER)]
    encoder: String,

    /// Use a synthetic camera instead of a V4L2 device
    #[arg(long)]
    simulate: bool
}

// -----------------------------------------------------------------------------------------------
// MAIN
// -----------------------------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    // Bad resolution fails here, before the camera is touched
    let config = Config {
        directory: args.directory,
        seconds: args.seconds,
        resolution: Resolution::parse(&args.resolution)?,
        device: args.device,
        encoder: args.encoder
    };
    log::info!(
        "storing in {}, one {} frame every {}s",
        config.directory.display(),
        config.resolution,
        config.seconds
    );

    let layout = StorageLayout::new(&config.directory);
    layout.ensure_root()?;

    let shutdown = Shutdown::from_ctrlc()?;

    if args.simulate {
        return run(SimulatedCamera::default(), layout, &config, shutdown);
    }

    open_camera(&config)
        .and_then(|camera| run(camera, layout, &config, shutdown))
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

#[cfg(feature = "v4l2")]
fn open_camera(config: &Config) -> Result<cv_timelapse::V4l2Camera, Box<dyn Error>> {
    let camera = cv_timelapse::V4l2CameraBuilder::new()
        .path(&config.device)?
        .resolution(config.resolution)
        .format(b"MJPG")?
        .build()?;

    log::info!("opened camera {}", config.device.display());
    Ok(camera)
}

#[cfg(not(feature = "v4l2"))]
fn open_camera(_config: &Config) -> Result<SimulatedCamera, Box<dyn Error>> {
    Err("built without the v4l2 feature, use --simulate".into())
}

fn run<C: CaptureDevice>(
    mut camera: C,
    layout: StorageLayout,
    config: &Config,
    shutdown: Shutdown
) -> Result<(), Box<dyn Error>> {
    camera.set_resolution(config.resolution)?;

    let mut timelapse = Timelapse::new(
        camera,
        CommandEncoder::new(&config.encoder),
        layout,
        config.interval(),
        shutdown
    );

    timelapse.run(log_day)?;

    Ok(())
}

fn log_day(day: &DayReport) {
    match &day.finalize {
        FinalizeOutcome::Encoded { movie, frames } => {
            log::info!("{}: {} frames in {}", day.date, frames, movie.display())
        },
        FinalizeOutcome::EncoderFailed { frames_kept: true } => {
            log::warn!("{}: movie not made, frames kept", day.date)
        },
        FinalizeOutcome::EncoderFailed { frames_kept: false } => {
            log::warn!("{}: movie not made", day.date)
        },
        FinalizeOutcome::Empty => log::info!("{}: no frames", day.date)
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
