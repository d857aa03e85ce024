//! Highway Lights - a night drive down a road that will not stay straight
//!
//! The road is a flat grid bent in the vertex shader by the selected
//! distortion profile; the camera leans into the bends using the same curve
//! evaluated on the host.

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use highway_lights::cli::Args;
use highway_lights::gpu_probe::GpuProbe;
use highway_lights::params::SceneConfig;
use highway_lights::parity;
use highway_lights::profile::ProfileRegistry;
use highway_lights::rendering::RenderSystem;
use highway_lights::scene::RoadScene;
use highway_lights::shader::road_program;
use highway_lights::{DistortionError, Result};

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    registry: ProfileRegistry,
    scene: RoadScene,
    config: SceneConfig,

    // Time tracking
    last_frame: Instant,
}

impl App {
    fn new(registry: ProfileRegistry, config: SceneConfig) -> Result<Self> {
        let profile = registry.select(&config.distortion)?;
        let scene = RoadScene::new(profile, config.camera.clone(), config.render.clone());

        Ok(Self {
            window: None,
            render_system: None,
            registry,
            scene,
            config,
            last_frame: Instant::now(),
        })
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title("Highway Lights")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.render.window_width,
                self.config.render.window_height,
            ));

        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .map_err(|e| DistortionError::Platform(format!("failed to create window: {}", e)))?,
        );

        let render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            self.scene.profile(),
            &self.config.road,
        ))?;

        let size = window.inner_size();
        self.scene.resize(size.width, size.height);

        info!(
            "driving '{}'; SPACE speeds up, LEFT/RIGHT switch distortion, ESC quits",
            self.scene.profile().id()
        );

        self.window = Some(window);
        self.render_system = Some(render_system);
        self.last_frame = Instant::now();
        Ok(())
    }

    /// Step through the catalogue by `step` entries
    fn cycle_profile(&mut self, step: isize) {
        let ids: Vec<&str> = self.registry.ids().collect();
        let current = self.scene.profile().id();
        let index = ids.iter().position(|id| *id == current).unwrap_or(0) as isize;
        let next = (index + step).rem_euclid(ids.len().max(1) as isize) as usize;

        let profile = match ids.get(next).map(|id| self.registry.select(id)) {
            Some(Ok(profile)) => profile,
            Some(Err(e)) => {
                warn!("{}", e);
                return;
            }
            None => return,
        };

        if let Some(render_system) = self.render_system.as_mut() {
            render_system.set_profile(&profile);
        }
        self.scene.set_profile(profile);
    }

    /// Render a single frame
    fn render_frame(&mut self) {
        let Some(render_system) = self.render_system.as_mut() else {
            return;
        };

        let now = Instant::now();
        let dt_s = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        let frame = {
            let mut target = render_system.uniform_target();
            self.scene.advance(dt_s, &mut target)
        };
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                error!("frame update failed: {}", e);
                return;
            }
        };

        render_system.update_view_proj(frame.view_proj);

        match render_system.render() {
            Ok(()) => {}
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                warn!("surface {:?}, reconfiguring", e);
                let config = self.scene.render_config();
                render_system.resize(config.window_width, config.window_height);
            }
            Err(e) => error!("render error: {:?}", e),
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        if let Err(e) = self.init_window(event_loop) {
            error!("{}", e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::Space => self.scene.toggle_boost(),
                KeyCode::ArrowRight => self.cycle_profile(1),
                KeyCode::ArrowLeft => self.cycle_profile(-1),
                _ => {}
            },
            WindowEvent::Resized(size) => {
                self.scene.resize(size.width, size.height);
                if let Some(render_system) = self.render_system.as_mut() {
                    render_system.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.render_frame();
            }
            _ => {}
        }
    }
}

fn list_profiles(registry: &ProfileRegistry) {
    for profile in registry.iter() {
        let kind = if profile.is_animated() {
            "animated"
        } else {
            "still"
        };
        let uniforms: Vec<String> = profile
            .uniforms()
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value.wgsl_type()))
            .collect();
        println!("{:<16} {:<9} {}", profile.id(), kind, uniforms.join(", "));
    }
}

fn verify(registry: &ProfileRegistry, args: &Args) -> Result<()> {
    let reports = parity::check_all(registry.iter().map(|p| p.as_ref()), &args.parity_grid())?;
    println!("{} profiles match their generated shaders", reports.len());

    if args.gpu {
        let grid = args.gpu_parity_grid();
        let probe = pollster::block_on(GpuProbe::new())?;
        for profile in registry.iter() {
            let report = pollster::block_on(probe.check_profile(profile, &grid))?;
            info!(
                "{}: GPU agrees on {} samples (max error {:e})",
                report.id, report.samples, report.max_error
            );
        }
        println!("{} profiles match on the GPU", registry.len());
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let registry = ProfileRegistry::builtin()?;

    if args.list {
        list_profiles(&registry);
        return Ok(());
    }

    if args.verify {
        return verify(&registry, &args);
    }

    let config = args.scene_config();
    if args.dump_shader {
        let profile = registry.select(&config.distortion)?;
        print!("{}", road_program(&profile));
        return Ok(());
    }

    let mut app = App::new(registry, config)?;
    let event_loop = EventLoop::new()
        .map_err(|e| DistortionError::Platform(format!("failed to create event loop: {}", e)))?;
    event_loop
        .run_app(&mut app)
        .map_err(|e| DistortionError::Platform(format!("event loop failed: {}", e)))
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    run(Args::parse())?;
    Ok(())
}
