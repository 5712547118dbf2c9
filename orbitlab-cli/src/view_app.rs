//! Interactive viewer
//!
//! Hosts the simulation driver inside an egui frame loop: keyboard input
//! drives reset and warp, every emitted snapshot extends the per-slot
//! trails, and the scene file is reloaded when it changes on disk.

use eframe::egui;
use log::{info, warn};
use notify::{Event, RecommendedWatcher, Watcher};
use orbitlab_core::{Color, GravityField, Scene, SimulationDriver, Snapshot, SnapshotSink};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc;

/// Trail points kept per slot
const TRAIL_LEN: usize = 2000;

pub fn run(scene_path: Option<PathBuf>, warp: i32) -> Result<(), Box<dyn std::error::Error>> {
    let scene = crate::load_scene(scene_path.as_deref())?;
    let mut driver = SimulationDriver::new(scene.gravity, scene.config, scene.slots)?;
    driver.set_warp(warp);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1000.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "orbitlab",
        options,
        Box::new(move |_cc| Ok(Box::new(ViewApp::new(scene_path, driver)))),
    )?;
    Ok(())
}

/// Per-slot position history fed by driver snapshots
#[derive(Default)]
struct Trails {
    points: Vec<VecDeque<egui::Vec2>>,
}

impl Trails {
    fn clear(&mut self) {
        self.points.clear();
    }
}

impl SnapshotSink<Color> for Trails {
    fn accept(&mut self, snapshot: Snapshot<Color>) {
        self.points.resize_with(snapshot.len(), VecDeque::new);
        for (trail, entry) in self.points.iter_mut().zip(snapshot.entries) {
            if trail.len() == TRAIL_LEN {
                trail.pop_front();
            }
            trail.push_back(egui::vec2(entry.position.x, entry.position.y));
        }
    }
}

pub struct ViewApp {
    scene_path: Option<PathBuf>,
    driver: SimulationDriver<GravityField, Color>,
    trails: Trails,
    last_load_error: Option<String>,
    #[allow(dead_code)] // Kept alive to maintain file watching
    file_watcher: Option<RecommendedWatcher>,
    file_receiver: mpsc::Receiver<notify::Result<Event>>,
}

impl ViewApp {
    fn new(scene_path: Option<PathBuf>, driver: SimulationDriver<GravityField, Color>) -> Self {
        // Watcher events carry absolute paths
        let scene_path = scene_path.map(|p| p.canonicalize().unwrap_or(p));

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })
        .ok();

        if let (Some(w), Some(path)) = (watcher.as_mut(), scene_path.as_ref()) {
            if let Err(e) = w.watch(path, notify::RecursiveMode::NonRecursive) {
                warn!("not watching {}: {}", path.display(), e);
            }
        }

        Self {
            scene_path,
            driver,
            trails: Trails::default(),
            last_load_error: None,
            file_watcher: watcher,
            file_receiver: rx,
        }
    }

    fn check_file_changes(&mut self) {
        let mut needs_reload = false;
        while let Ok(event) = self.file_receiver.try_recv() {
            match event {
                Ok(Event {
                    kind: notify::EventKind::Modify(_),
                    paths,
                    ..
                }) => {
                    if self.scene_path.as_ref().is_some_and(|p| paths.contains(p)) {
                        needs_reload = true;
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("file watcher error: {}", e),
            }
        }

        if needs_reload {
            self.reload_scene();
        }
    }

    fn reload_scene(&mut self) {
        match crate::load_scene(self.scene_path.as_deref()).and_then(|s| self.apply_scene(s)) {
            Ok(()) => {
                info!("scene reloaded");
                self.trails.clear();
                self.last_load_error = None;
            }
            Err(e) => {
                warn!("reload failed: {}", e);
                self.last_load_error = Some(e.to_string());
            }
        }
    }

    fn apply_scene(&mut self, scene: Scene) -> Result<(), Box<dyn std::error::Error>> {
        if scene.gravity == *self.driver.field() {
            self.driver.reconfigure(scene.config, scene.slots)?;
        } else {
            // A different field means a new driver; carry the warp over
            let warp = self.driver.warp();
            self.driver = SimulationDriver::new(scene.gravity, scene.config, scene.slots)?;
            self.driver.set_warp(i32::try_from(warp).unwrap_or(i32::MAX));
        }
        Ok(())
    }

    fn handle_input(&mut self, ctx: &egui::Context) {
        let (reset, faster, slower, stop) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Enter),
                i.key_pressed(egui::Key::ArrowRight),
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowDown),
            )
        });

        if reset {
            self.driver.reset();
            self.trails.clear();
        }
        if faster {
            self.driver.set_warp(1);
        }
        if slower {
            self.driver.set_warp(-1);
        }
        if stop {
            self.driver.stop();
        }
    }
}

fn to_color32(c: Color, alpha: f32) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, (c.a as f32 * alpha) as u8)
}

impl eframe::App for ViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_file_changes();
        self.handle_input(ctx);

        self.driver.advance_frame(&mut self.trails);

        // Bottom panel for reload errors
        if let Some(ref error) = self.last_load_error {
            egui::TopBottomPanel::bottom("errors").show(ctx, |ui| {
                ui.set_max_height(100.0);
                ui.label(
                    egui::RichText::new(format!("Error: {}", error)).color(egui::Color32::RED),
                );
            });
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let painter = ui.painter();

                // World origin at the center of the canvas, one unit per point
                let center = rect.center();
                let to_screen = |p: egui::Vec2| center + p;

                let tags: Vec<Color> = self.driver.slots().iter().map(|s| s.tag).collect();

                for (trail, &tag) in self.trails.points.iter().zip(&tags) {
                    let n = trail.len();
                    for (k, (a, b)) in trail.iter().zip(trail.iter().skip(1)).enumerate() {
                        let fade = (k + 1) as f32 / n as f32;
                        painter.line_segment(
                            [to_screen(*a), to_screen(*b)],
                            egui::Stroke::new(2.0, to_color32(tag, fade * 0.6)),
                        );
                    }
                }

                painter.circle_filled(center, 10.0, egui::Color32::WHITE);

                for (i, entry) in self.driver.snapshot().entries.into_iter().enumerate() {
                    let pos = egui::vec2(entry.position.x, entry.position.y);
                    let screen = to_screen(pos);
                    let color = to_color32(entry.tag, 1.0);

                    painter.circle_filled(screen, 10.0, color);
                    painter.text(
                        screen + egui::vec2(12.0, 12.0),
                        egui::Align2::LEFT_TOP,
                        i.to_string(),
                        egui::FontId::proportional(10.0),
                        color,
                    );
                }

                let dt = ui.input(|i| i.stable_dt).max(1e-6);
                painter.text(
                    rect.left_top() + egui::vec2(10.0, 10.0),
                    egui::Align2::LEFT_TOP,
                    format!("{:.0} FPS", 1.0 / dt),
                    egui::FontId::monospace(16.0),
                    egui::Color32::GREEN,
                );
                painter.text(
                    rect.left_top() + egui::vec2(10.0, 50.0),
                    egui::Align2::LEFT_TOP,
                    format!("timewarp: {}", self.driver.warp()),
                    egui::FontId::proportional(20.0),
                    egui::Color32::WHITE,
                );
            });

        ctx.request_repaint();
    }
}
