use std::ops::ControlFlow;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use opencv::highgui;
use snailtrack::{
    backend::{self, Camera},
    config::{SourceConfig, TrackingConfig},
    pipeline,
    recorder::{PointSink, TrajectoryRecorder},
    render::{self, Overlay},
};

#[derive(Parser, Debug)]
#[command(name = "track", about = "Follow one object picked on the first frame")]
struct Args {
    #[command(flatten)]
    source: SourceConfig,

    #[command(flatten)]
    tracking: TrackingConfig,

    /// Write `Frame,X,Y` rows for every tracked frame
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,

    #[arg(long, default_value = "snail tracking")]
    window: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();
    let args = Args::parse();

    let mut camera = Camera::open(&args.source)?;
    let tracker = backend::create_tracker(args.tracking.tracker)?;

    let roi = args.tracking.roi;
    let window = args.window.as_str();
    let (mut session, _) = pipeline::seed(&mut camera, tracker, |frame| match roi {
        Some(region) => Ok(region),
        None => render::select_region(window, frame),
    })
    .context("failed to start tracking")?;

    let mut recorder = match &args.log {
        Some(path) => Some(
            TrajectoryRecorder::open(path)
                .with_context(|| format!("cannot create {}", path.display()))?,
        ),
        None => None,
    };

    highgui::named_window(window, highgui::WINDOW_AUTOSIZE)?;
    let overlay = Overlay::interactive();
    let mut display_err = None;

    let summary = pipeline::run(
        &mut camera,
        &mut session,
        recorder.as_mut().map(|r| r as &mut dyn PointSink),
        |frame, obs| {
            let shown = backend::frame_to_mat(frame)
                .map_err(anyhow::Error::from)
                .and_then(|mut mat| {
                    overlay.draw(&mut mat, obs.result, obs.trajectory)?;
                    highgui::imshow(window, &mat)?;
                    Ok(highgui::wait_key(1)?)
                });

            match shown {
                Ok(key) if key & 0xFF == 'q' as i32 => ControlFlow::Break(()),
                Ok(_) => ControlFlow::Continue(()),
                Err(err) => {
                    display_err = Some(err);
                    ControlFlow::Break(())
                }
            }
        },
    )?;

    highgui::destroy_all_windows()?;

    if let Some(err) = display_err {
        return Err(err.context("display failed"));
    }

    println!(
        "{} frames, {} tracked, {} lost, path {:.1}px, displacement {:.1}px",
        summary.frames,
        summary.found,
        summary.lost,
        session.current_trajectory().path_length(),
        session.current_trajectory().displacement(),
    );

    if let Some(err) = summary.recorder_error {
        eprintln!("trajectory log incomplete: {}", err);
    }

    Ok(())
}
