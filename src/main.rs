mod core;
mod editor;
mod media;
mod playback;
mod session;
mod settings;
mod storage;
mod ui;

use anyhow::{Context as _, Result};
use imgui::{Context, FontConfig, FontSource};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use media::RodioMediaSource;
use session::{Command, Session};
use settings::AppSettings;
use storage::{JsonFileStore, KeyValueStore, MemoryStore};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use ui::{FileDialogs, ShortcutAction, ShortcutManager, TranscriptEditorWindow, TransportWindow};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{EventLoop, EventLoopWindowTarget};
use winit::keyboard::ModifiersState;
use winit::window::WindowBuilder;

use glutin::prelude::*;
use glutin::display::GetGlDisplay;
use glutin_winit::{DisplayBuilder, GlWindow};
use raw_window_handle::HasRawWindowHandle;
use glow::HasContext;

use std::ffi::CString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct AppState {
    session: Session<RodioMediaSource>,
    settings: AppSettings,
    shortcut_manager: ShortcutManager,
    transport: TransportWindow,
    editor: TranscriptEditorWindow,
    modifiers: ModifiersState,
    show_shortcuts: bool,
    show_file_open_pending: bool,
    status_message: Option<String>,
}

impl AppState {
    fn new(media: RodioMediaSource, runtime: tokio::runtime::Handle) -> Self {
        // Load persisted settings
        let settings = AppSettings::load();

        let (store, status_message) = open_store(&settings);
        let session = Session::new(media, store, settings.session_config(), runtime);

        let editor = TranscriptEditorWindow::new();
        editor.attach(session.autosave());

        Self {
            session,
            shortcut_manager: ShortcutManager::new(),
            transport: TransportWindow::new(),
            editor,
            modifiers: ModifiersState::empty(),
            show_shortcuts: settings.show_shortcuts,
            show_file_open_pending: false,
            status_message,
            settings,
        }
    }

    fn save_settings(&mut self) {
        self.settings.show_shortcuts = self.show_shortcuts;
        self.settings.slow_playback = self.session.player().slow_playback();
        self.settings.last_media = self.session.media_path().map(Path::to_path_buf);
        if let Err(e) = self.settings.save() {
            warn!("Failed to save settings: {:#}", e);
        }
    }

    fn open_media(&mut self, path: &Path) {
        match self.session.open(path) {
            Ok(()) => {
                self.editor.sync_from(self.session.autosave());
                self.status_message = Some(format!("Opened {}", path.display()));
                self.save_settings();
            }
            Err(e) => {
                error!("{:#}", e);
                self.editor.sync_from(self.session.autosave());
                self.status_message = Some(format!("{:#}", e));
            }
        }
    }

    fn run_command(&mut self, command: Command) {
        if let Err(e) = self.session.handle(command) {
            error!("{:?} failed: {:#}", command, e);
            self.status_message = Some(format!("{:#}", e));
        } else if command == Command::Save {
            self.status_message = Some("Saved".to_string());
        }
    }

    fn run_action(&mut self, action: ShortcutAction, window_target: &EventLoopWindowTarget<()>) {
        match action {
            ShortcutAction::OpenFile => self.show_file_open_pending = true,
            ShortcutAction::Quit => {
                self.shutdown();
                window_target.exit();
            }
            other => {
                if let Some(command) = other.command() {
                    self.run_command(command);
                }
            }
        }
    }

    fn process_file_dialogs(&mut self) {
        if self.show_file_open_pending {
            if let Some(path) = FileDialogs::open_audio_file() {
                self.open_media(&path);
            }
            self.show_file_open_pending = false;
        }
    }

    /// Flush unsaved work before exit
    fn shutdown(&mut self) {
        self.session.player().stop();
        if self.session.autosave().is_dirty() {
            if let Err(e) = self.session.autosave().save() {
                error!("Failed to save transcript on exit: {}", e);
            }
        }
        self.save_settings();
    }
}

/// Open the transcript store, falling back to memory if it is unusable
fn open_store(settings: &AppSettings) -> (Arc<dyn KeyValueStore>, Option<String>) {
    let Some(path) = settings.store_path.clone().or_else(JsonFileStore::default_path) else {
        warn!("No data directory; transcripts will not persist");
        return (
            Arc::new(MemoryStore::new()),
            Some("No data directory; transcripts will not be saved".to_string()),
        );
    };

    match JsonFileStore::open(&path) {
        Ok(store) => {
            info!("Transcript store: {:?}", store.path());
            (Arc::new(store), None)
        }
        Err(e) => {
            error!("Failed to open transcript store: {}", e);
            (
                Arc::new(MemoryStore::new()),
                Some(format!("Transcript store unavailable ({}); changes will not be saved", e)),
            )
        }
    }
}

/// File to open at start-up: the first argument, else the last one used
fn startup_media(settings: &AppSettings) -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| settings.last_media.clone().filter(|p| p.exists()))
}

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Timers for segment playback and autosave run here
    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;

    // The output stream must outlive every sink created from its handle
    let (_stream, stream_handle) =
        rodio::OutputStream::try_default().context("Failed to open audio output")?;

    let mut state = AppState::new(RodioMediaSource::new(stream_handle), rt.handle().clone());
    if let Some(path) = startup_media(&state.settings) {
        state.open_media(&path);
    }

    // Create event loop
    let event_loop = EventLoop::new().context("Failed to create EventLoop")?;

    // Build the window and GL display using glutin-winit
    let (window, gl_config) = DisplayBuilder::new()
        .with_window_builder(Some(
            WindowBuilder::new()
                .with_title("segscribe")
                .with_inner_size(winit::dpi::LogicalSize::new(700.0, 700.0)),
        ))
        .build(&event_loop, glutin::config::ConfigTemplateBuilder::new(), |mut iter| {
            iter.next().expect("No GL config available")
        })
        .map_err(|e| anyhow::anyhow!("Failed to create window and display: {}", e))?;

    let window = window.context("Failed to create window")?;
    let gl_display = gl_config.display();

    let context = unsafe {
        gl_display.create_context(
            &gl_config,
            &glutin::context::ContextAttributesBuilder::new()
                .build(Some(window.raw_window_handle())),
        )
    }
    .context("Failed to create GL context")?;

    let attrs = window.build_surface_attributes(
        glutin::surface::SurfaceAttributesBuilder::<glutin::surface::WindowSurface>::new(),
    );
    let surface = unsafe { gl_display.create_window_surface(&gl_config, &attrs) }
        .context("Failed to create surface")?;
    let context = context
        .make_current(&surface)
        .context("Failed to make context current")?;

    let load_gl = |ptr: &str| match CString::new(ptr) {
        Ok(name) => gl_display.get_proc_address(&name) as *const _,
        Err(_) => std::ptr::null(),
    };
    let gl = unsafe { glow::Context::from_loader_function(load_gl) };
    // A second glow context for clearing (both reference the same GL context)
    let gl_clear = unsafe { glow::Context::from_loader_function(load_gl) };

    // Set up imgui
    let mut imgui = Context::create();
    imgui.set_log_filename(None::<PathBuf>);

    let ini_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("segscribe")
        .join("layout.ini");
    if let Some(parent) = ini_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    imgui.set_ini_filename(Some(ini_path));

    let hidpi_factor = window.scale_factor();
    let font_size = (15.0 * hidpi_factor) as f32;
    imgui.fonts().add_font(&[FontSource::DefaultFontData {
        config: Some(FontConfig {
            size_pixels: font_size,
            ..FontConfig::default()
        }),
    }]);
    imgui.io_mut().font_global_scale = (1.0 / hidpi_factor) as f32;

    let mut platform = WinitPlatform::init(&mut imgui);
    platform.attach_window(imgui.io_mut(), &window, HiDpiMode::Default);

    let mut renderer = imgui_glow_renderer::AutoRenderer::initialize(gl, &mut imgui)
        .map_err(|e| anyhow::anyhow!("Failed to initialize renderer: {}", e))?;

    let mut last_frame_time = Instant::now();
    let mut frame_delta = Duration::ZERO;

    // Main loop
    event_loop
        .run(move |event, window_target| {
            match &event {
                Event::NewEvents(_) => {
                    let now = Instant::now();
                    frame_delta = now - last_frame_time;
                    imgui.io_mut().update_delta_time(frame_delta);
                    last_frame_time = now;
                }
                Event::AboutToWait => {
                    state.process_file_dialogs();

                    if let Err(e) = platform.prepare_frame(imgui.io_mut(), &window) {
                        error!("Failed to prepare frame: {}", e);
                    }
                    window.request_redraw();
                }
                Event::WindowEvent { event: WindowEvent::ModifiersChanged(modifiers), .. } => {
                    state.modifiers = modifiers.state();
                }
                Event::WindowEvent { event: WindowEvent::KeyboardInput { event: key_event, .. }, .. } => {
                    let mods = state.modifiers;
                    if let Some(action) = state.shortcut_manager.process_event(
                        key_event,
                        mods.control_key(),
                        mods.shift_key(),
                        mods.alt_key(),
                    ) {
                        state.run_action(action, window_target);
                    }
                }
                Event::WindowEvent { event: WindowEvent::RedrawRequested, .. } => {
                    let ui = imgui.new_frame();
                    let mut pending_action = None;

                    // Menu bar
                    ui.main_menu_bar(|| {
                        ui.menu("File", || {
                            if ui.menu_item_config("Open Audio...").shortcut("Alt+O").build() {
                                pending_action = Some(ShortcutAction::OpenFile);
                            }
                            if ui.menu_item_config("Save").shortcut("Alt+S").build() {
                                pending_action = Some(ShortcutAction::Save);
                            }
                            ui.separator();
                            if ui.menu_item("Exit") {
                                pending_action = Some(ShortcutAction::Quit);
                            }
                        });

                        ui.menu("Help", || {
                            if ui.menu_item("Keyboard Shortcuts") {
                                state.show_shortcuts = true;
                            }
                        });
                    });

                    if let Some(command) = state.transport.render(ui, state.session.player()) {
                        state.run_command(command);
                    }

                    state.editor.render(ui, state.session.autosave(), frame_delta);

                    if state.show_shortcuts {
                        state.shortcut_manager.render_help(ui, &mut state.show_shortcuts);
                    }

                    // Status bar
                    let window_size = window.inner_size();
                    ui.set_cursor_pos([0.0, window_size.height as f32 / hidpi_factor as f32 - 25.0]);
                    ui.child_window("Status")
                        .size([window_size.width as f32 / hidpi_factor as f32, 25.0])
                        .build(|| match &state.status_message {
                            Some(msg) => ui.text(msg),
                            None => ui.text("Open an audio file to begin (File > Open Audio...)"),
                        });

                    platform.prepare_render(ui, &window);
                    let draw_data = imgui.render();

                    unsafe {
                        gl_clear.clear_color(0.1, 0.1, 0.1, 1.0);
                        gl_clear.clear(glow::COLOR_BUFFER_BIT);
                    }

                    if let Err(e) = renderer.render(draw_data) {
                        error!("Rendering failed: {}", e);
                    }
                    if let Err(e) = surface.swap_buffers(&context) {
                        error!("Failed to swap buffers: {}", e);
                    }

                    if let Some(action) = pending_action {
                        state.run_action(action, window_target);
                    }
                }
                Event::WindowEvent { event: WindowEvent::CloseRequested, .. } => {
                    state.shutdown();
                    window_target.exit();
                }
                _ => {}
            }

            platform.handle_event(imgui.io_mut(), &window, &event);
        })
        .context("EventLoop error")?;

    Ok(())
}
