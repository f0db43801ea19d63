use anyhow::{bail, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use winit::{
    event::{ElementState, Event, MouseButton, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

use lounge_visualizer::audio::PlaybackController;
use lounge_visualizer::config::VisualizerConfig;
use lounge_visualizer::graphics::GraphicsEngine;
use lounge_visualizer::hud::Hud;
use lounge_visualizer::render::{CANVAS_HEIGHT, CANVAS_WIDTH};
use lounge_visualizer::scheduler::FrameScheduler;

#[derive(Parser, Debug)]
#[command(name = "lounge-visualizer", about = "Circular bar-graph audio visualizer")]
struct Args {
    /// Audio file to visualize
    audio: Option<PathBuf>,

    /// JSON preset with construction parameters; CLI flags override it
    #[arg(long)]
    preset: Option<PathBuf>,

    /// Track title shown above the ring
    #[arg(long)]
    title: Option<String>,

    /// Track author shown below the title
    #[arg(long)]
    author: Option<String>,

    /// Start playback without waiting for a click
    #[arg(long)]
    autoplay: bool,

    /// Loop playback instead of stopping at the end of the track
    #[arg(long = "loop")]
    loop_playback: bool,

    /// Visualization style tag
    #[arg(long)]
    style: Option<String>,

    #[arg(long)]
    bar_width: Option<f32>,

    #[arg(long)]
    bar_height: Option<f32>,

    #[arg(long)]
    bar_spacing: Option<f32>,

    /// Bar color as #rrggbb
    #[arg(long)]
    bar_color: Option<String>,

    #[arg(long)]
    shadow_blur: Option<f32>,

    /// Shadow color as #rrggbb
    #[arg(long)]
    shadow_color: Option<String>,
}

fn build_config(args: &Args) -> Result<VisualizerConfig> {
    let mut config = match &args.preset {
        Some(path) => VisualizerConfig::from_preset(path)?,
        None => VisualizerConfig::default(),
    };

    if let Some(audio) = &args.audio {
        config.audio_src = audio.clone();
    }
    if let Some(title) = &args.title {
        config.title = title.clone();
    }
    if let Some(author) = &args.author {
        config.author = author.clone();
    }
    if let Some(style) = &args.style {
        config.style = style.clone();
    }
    if let Some(width) = args.bar_width {
        config.bar_width = width;
    }
    if let Some(height) = args.bar_height {
        config.bar_height = height;
    }
    if let Some(spacing) = args.bar_spacing {
        config.bar_spacing = spacing;
    }
    if let Some(color) = &args.bar_color {
        config.bar_color = color.clone();
    }
    if let Some(blur) = args.shadow_blur {
        config.shadow_blur = blur;
    }
    if let Some(color) = &args.shadow_color {
        config.shadow_color = color.clone();
    }
    if args.autoplay {
        config.autoplay = true;
    }
    if args.loop_playback {
        config.loop_playback = true;
    }

    if config.audio_src.as_os_str().is_empty() {
        bail!("no audio source configured (pass a file path, or a preset with \"audio_src\")");
    }

    Ok(config)
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = build_config(&args)?;
    let (style, layout) = config.resolve()?;

    info!("Starting lounge visualizer for {:?}", config.audio_src);

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(if config.title.is_empty() {
                "Lounge Visualizer".to_string()
            } else {
                config.title.clone()
            })
            .with_inner_size(winit::dpi::LogicalSize::new(CANVAS_WIDTH, CANVAS_HEIGHT))
            .build(&event_loop)?,
    );

    let mut engine = pollster::block_on(GraphicsEngine::new(Arc::clone(&window)))?;
    let mut hud = Hud::new(&window, &engine.device, engine.config.format);
    let mut controller = PlaybackController::new(config.audio_src.clone(), config.loop_playback)?;
    let mut scheduler = FrameScheduler::new(style, layout, config.title, config.author);

    if config.autoplay {
        controller.begin_load();
    }

    let window_clone = Arc::clone(&window);
    event_loop.run(move |event, elwt| {
        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    info!("Close requested");
                    elwt.exit();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                        && event.state == ElementState::Pressed
                    {
                        info!("Escape pressed");
                        elwt.exit();
                    }
                }
                WindowEvent::MouseInput {
                    state: ElementState::Pressed,
                    button: MouseButton::Left,
                    ..
                } => {
                    // the whole canvas is the play/pause target
                    controller.toggle();
                }
                WindowEvent::Resized(physical_size) => {
                    engine.resize(physical_size);
                }
                WindowEvent::RedrawRequested => {
                    if let Err(e) =
                        scheduler.tick(&mut controller, &mut engine, &mut hud, &window_clone)
                    {
                        log::error!("Render error: {}", e);
                    }
                }
                _ => {
                    hud.handle_event(&window_clone, &event);
                }
            },
            Event::AboutToWait => {
                window_clone.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
