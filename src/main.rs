//! Movie Finder - Rust Edition
//! A desktop movie discovery client for the TMDB catalog

// Hide console window on Windows release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use eframe::egui;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

mod api;
mod config;
mod debounce;
mod detail;
mod display;
mod logging;
mod models;
mod search;
mod trending;

#[cfg(test)]
mod test_support;

use api::{Catalog, TmdbClient};
use config::*;
use detail::DetailController;
use logging::ConsoleLog;
use models::*;
use search::SearchController;
use trending::{spawn_subscriber, TrendRecorder, TrendingPanel};

/// Repaint cadence while a request is in flight
const LOADING_REPAINT: Duration = Duration::from_millis(100);

/// Load application icon - film frame on the purple gradient
fn load_icon() -> egui::IconData {
    let size: usize = 64;
    let mut rgba = vec![0u8; size * size * 4];

    for y in 0..size {
        for x in 0..size {
            let idx = (y * size + x) * 4;
            let nx = x as f32 / size as f32;
            let ny = y as f32 / size as f32;

            // Rounded rectangle background
            let corner_radius = 0.125;
            let in_rounded_rect = {
                let dx = if nx < corner_radius { corner_radius - nx }
                         else if nx > 1.0 - corner_radius { nx - (1.0 - corner_radius) }
                         else { 0.0 };
                let dy = if ny < corner_radius { corner_radius - ny }
                         else if ny > 1.0 - corner_radius { ny - (1.0 - corner_radius) }
                         else { 0.0 };
                dx * dx + dy * dy <= corner_radius * corner_radius
            };

            if !in_rounded_rect {
                continue; // stays transparent
            }

            // Purple gradient background (#667eea to #764ba2)
            let t = nx * 0.5 + ny * 0.5;
            let mut pixel = [
                (102.0 + (118.0 - 102.0) * t) as u8,
                (126.0 + (75.0 - 126.0) * t) as u8,
                (234.0 + (162.0 - 234.0) * t) as u8,
                255,
            ];

            // Film strip with sprocket holes along both edges
            let in_strip = (0.16..=0.84).contains(&nx) && (0.14..=0.86).contains(&ny);
            let in_frame = (0.30..=0.70).contains(&nx) && (0.26..=0.74).contains(&ny);
            let in_hole = ((0.19..=0.25).contains(&nx) || (0.75..=0.81).contains(&nx))
                && ((ny - 0.14) / 0.12).fract() > 0.45;

            if in_strip && in_frame {
                pixel = [255, 255, 255, 255];
            } else if in_strip && in_hole {
                pixel = [102, 126, 234, 255];
            } else if in_strip {
                pixel = [26, 26, 46, 255];
            }

            rgba[idx..idx + 4].copy_from_slice(&pixel);
        }
    }

    egui::IconData {
        rgba,
        width: size as u32,
        height: size as u32,
    }
}

fn main() -> Result<(), eframe::Error> {
    let console = logging::init();
    log::info!("Movie Finder started");

    let icon = load_icon();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([720.0, 480.0])
            .with_icon(icon),
        vsync: true,
        hardware_acceleration: eframe::HardwareAcceleration::Preferred,
        ..Default::default()
    };

    eframe::run_native(
        "Movie Finder",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Ok(Box::new(MovieFinderApp::new(console)))
        }),
    )
}

struct MovieFinderApp {
    config: AppConfig,
    console: ConsoleLog,

    current_tab: Tab,
    route: Route,
    history: Vec<Route>,

    image_base_url: String,
    search: SearchController,
    detail: DetailController,
    trending: TrendingPanel,
    recorder: Option<Arc<TrendRecorder>>,
    subscriber: Option<JoinHandle<usize>>,

    // Settings dialog works on a copy until saved
    show_settings: bool,
    settings_draft: AppConfig,
}

impl MovieFinderApp {
    fn new(console: ConsoleLog) -> Self {
        let config = AppConfig::load();
        let catalog = Self::build_catalog(&config);
        if config.resolve_api_key().is_empty() {
            log::warn!("No TMDB API key configured - set {} or add one in Settings", API_KEY_ENV);
        }

        let mut app = Self {
            image_base_url: config.image_base_url.clone(),
            search: SearchController::with_quiet_period(catalog.clone(), config.debounce()),
            detail: DetailController::new(catalog),
            trending: TrendingPanel::new(),
            recorder: None,
            subscriber: None,
            current_tab: Tab::Browse,
            route: Route::Home,
            history: Vec::new(),
            show_settings: false,
            settings_draft: config.clone(),
            config,
            console,
        };

        app.start_trending();
        app.search.mount();
        app
    }

    fn build_catalog(config: &AppConfig) -> Arc<dyn Catalog> {
        Arc::new(TmdbClient::new(config.catalog_config()))
    }

    /// Connect the recorder to search events and load the trending strip.
    fn start_trending(&mut self) {
        self.search.unsubscribe_all();
        self.trending = TrendingPanel::new();

        match self.config.trend_store() {
            Ok(store) => {
                log::info!("Trending searches stored in: {}", self.config.trend_backend.label());
                let recorder = Arc::new(TrendRecorder::new(store, &self.config.image_base_url));
                self.subscriber = Some(spawn_subscriber(recorder.clone(), self.search.subscribe()));
                self.trending.load(recorder.clone(), self.config.trending_limit);
                self.recorder = Some(recorder);
            }
            Err(e) => {
                log::warn!("Trending searches disabled: {}", e);
                self.recorder = None;
                self.subscriber = None;
            }
        }
    }

    fn apply_settings(&mut self) {
        let previous = std::mem::replace(&mut self.config, self.settings_draft.clone());
        self.config.save();
        log::info!("Settings saved");

        self.search.set_quiet_period(self.config.debounce());

        if previous.catalog_differs(&self.config) {
            log::info!("Catalog settings changed, reloading");
            let catalog = Self::build_catalog(&self.config);
            self.image_base_url = self.config.image_base_url.clone();
            self.search.set_catalog(catalog.clone());
            self.detail.set_catalog(catalog);
            self.search.refresh();
            if let Route::Movie(id) = self.route {
                self.detail.open(id);
            }
        }

        if previous.trending_differs(&self.config) {
            self.start_trending();
        }
    }

    fn navigate(&mut self, route: Route) {
        if route == self.route {
            return;
        }
        log::debug!("Navigate {} -> {}", self.route.path(), route.path());
        self.history.push(self.route);
        self.enter(route);
    }

    fn go_back(&mut self) {
        let previous = self.history.pop().unwrap_or(Route::Home);
        self.enter(previous);
    }

    fn enter(&mut self, route: Route) {
        self.route = route;
        self.current_tab = Tab::Browse;
        if let Route::Movie(id) = route {
            self.detail.open(id);
        }
    }

    fn status_text(&self) -> String {
        match self.route {
            Route::Home => {
                let state = self.search.state();
                if state.is_loading {
                    "Loading movies...".to_string()
                } else if !state.error_message.is_empty() {
                    state.error_message.clone()
                } else if state.debounced_term.is_empty() {
                    format!("{} popular movies", state.results.len())
                } else {
                    format!("{} results for '{}'", state.results.len(), state.debounced_term)
                }
            }
            Route::Movie(id) => {
                if self.detail.state().is_loading {
                    format!("Loading movie {}...", id)
                } else {
                    Route::Movie(id).path()
                }
            }
        }
    }

    fn show_home(&mut self, ui: &mut egui::Ui) {
        let mut open_movie: Option<u64> = None;

        ui.vertical_centered(|ui| {
            ui.add_space(10.0);
            ui.heading(egui::RichText::new("Find Movies You'll Enjoy Without the Hassle").size(26.0).strong());
            ui.add_space(10.0);
        });

        if self.config.resolve_api_key().is_empty() {
            ui.label(egui::RichText::new(format!(
                "⚠ No TMDB API key. Set {} or open ⚙ Settings.", API_KEY_ENV
            )).color(egui::Color32::YELLOW));
        }

        // Search box
        ui.horizontal(|ui| {
            ui.label("🔍");
            let mut term = self.search.state().raw_term.clone();
            let response = ui.add(
                egui::TextEdit::singleline(&mut term)
                    .hint_text("Search through thousands of movies")
                    .desired_width(f32::INFINITY),
            );
            if response.changed() {
                self.search.on_input_change(&term);
            }
        });
        ui.add_space(12.0);

        // Trending
        if self.recorder.is_some() {
            let trending = self.trending.state();
            ui.heading("Trending Movies");
            if trending.is_loading {
                ui.spinner();
            } else if !trending.error_message.is_empty() {
                ui.colored_label(egui::Color32::RED, &trending.error_message);
            } else if trending.entries.is_empty() {
                ui.label(egui::RichText::new("No searches recorded yet").italics().color(egui::Color32::GRAY));
            } else {
                ui.horizontal_wrapped(|ui| {
                    for (rank, entry) in trending.entries.iter().enumerate() {
                        let text = format!("{}. {}", rank + 1, entry.title);
                        let button = ui.button(egui::RichText::new(text).strong()).on_hover_text(format!(
                            "Searched \"{}\" {} time{}",
                            entry.search_term,
                            entry.count,
                            if entry.count == 1 { "" } else { "s" }
                        ));
                        if button.clicked() {
                            if let Some(id) = entry.movie_id {
                                open_movie = Some(id);
                            }
                        }
                    }
                });
            }
            ui.add_space(12.0);
            ui.separator();
        }

        // Results
        let state = self.search.state();
        ui.heading("All Movies");
        ui.add_space(6.0);

        if state.is_loading {
            ui.spinner();
        } else if !state.error_message.is_empty() {
            ui.colored_label(egui::Color32::RED, &state.error_message);
        }

        egui::ScrollArea::vertical()
            .id_salt("results_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.set_min_width(ui.available_width());
                for movie in &state.results {
                    ui.horizontal(|ui| {
                        let poster = display::poster_or_placeholder(&self.image_base_url, movie);
                        if poster == display::PLACEHOLDER_IMAGE {
                            ui.label(egui::RichText::new("🎞").size(20.0).color(egui::Color32::GRAY));
                        } else {
                            ui.hyperlink_to(egui::RichText::new("🖼").size(20.0), poster);
                        }

                        ui.vertical(|ui| {
                            if ui.link(egui::RichText::new(&movie.title).strong().size(16.0)).clicked() {
                                open_movie = Some(movie.id);
                            }
                            ui.horizontal(|ui| {
                                ui.label(egui::RichText::new("⭐").color(egui::Color32::GOLD));
                                ui.label(display::format_rating(movie.vote_average));
                                ui.label("•");
                                ui.label(display::language_label(movie));
                                ui.label("•");
                                ui.label(display::release_year(movie));
                            });
                        });
                    });
                    ui.separator();
                }
            });

        if let Some(id) = open_movie {
            self.navigate(Route::Movie(id));
        }
    }

    fn show_detail(&mut self, ui: &mut egui::Ui) {
        let mut back = false;
        if ui.button("← Back to Movies").clicked() {
            back = true;
        }
        ui.add_space(6.0);

        let scroll_to_top = self.detail.take_scroll_to_top();
        let state = self.detail.state();

        if state.is_loading {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.spinner();
            });
        } else if let Some(message) = state.failure_message() {
            ui.colored_label(egui::Color32::RED, message);
        } else if let Some(movie) = &state.movie {
            let mut scroll_area = egui::ScrollArea::vertical()
                .id_salt("detail_scroll")
                .auto_shrink([false, false]);
            if scroll_to_top {
                scroll_area = scroll_area.vertical_scroll_offset(0.0);
            }

            scroll_area.show(ui, |ui| {
                ui.set_min_width(ui.available_width());
                ui.heading(egui::RichText::new(&movie.title).size(28.0).strong());

                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new("⭐").color(egui::Color32::GOLD));
                    ui.label(format!("{}/10", display::format_rating(movie.vote_average)));
                    ui.label("•");
                    ui.label(display::release_year(movie));
                    ui.label("•");
                    ui.label(display::language_label(movie));
                    if let Some(runtime) = display::format_runtime(movie.runtime) {
                        ui.label("•");
                        ui.label(runtime);
                    }
                });

                ui.horizontal(|ui| {
                    for (label, url) in [
                        ("Poster", display::poster_or_placeholder(&self.image_base_url, movie)),
                        ("Backdrop", display::backdrop_or_placeholder(&self.image_base_url, movie)),
                    ] {
                        if url == display::PLACEHOLDER_IMAGE {
                            ui.label(egui::RichText::new(format!("No {}", label.to_lowercase())).color(egui::Color32::GRAY));
                        } else {
                            ui.hyperlink_to(label, url);
                        }
                    }
                });

                if !movie.genres.is_empty() {
                    ui.add_space(6.0);
                    ui.horizontal_wrapped(|ui| {
                        for genre in &movie.genres {
                            ui.label(egui::RichText::new(&genre.name)
                                .background_color(egui::Color32::from_rgb(60, 50, 110))
                                .color(egui::Color32::WHITE));
                        }
                    });
                }

                if !movie.overview.is_empty() {
                    ui.add_space(10.0);
                    ui.label(egui::RichText::new("Overview").size(18.0).strong());
                    ui.label(&movie.overview);
                }

                if let Some(tagline) = &movie.tagline {
                    ui.add_space(6.0);
                    ui.label(egui::RichText::new(format!("\"{}\"", tagline)).italics());
                }

                ui.add_space(10.0);
                egui::Grid::new("detail_stats").num_columns(2).spacing([24.0, 4.0]).show(ui, |ui| {
                    if movie.budget > 0 {
                        ui.label(egui::RichText::new("Budget").strong());
                        ui.label(display::format_millions(movie.budget));
                        ui.end_row();
                    }
                    if movie.revenue > 0 {
                        ui.label(egui::RichText::new("Revenue").strong());
                        ui.label(display::format_millions(movie.revenue));
                        ui.end_row();
                    }
                    ui.label(egui::RichText::new("Vote Count").strong());
                    ui.label(movie.vote_count.to_string());
                    ui.end_row();
                    ui.label(egui::RichText::new("Popularity").strong());
                    ui.label(display::format_popularity(movie.popularity));
                    ui.end_row();
                });

                if !movie.production_companies.is_empty() {
                    ui.add_space(10.0);
                    ui.label(egui::RichText::new("Production Companies").size(16.0).strong());
                    for company in &movie.production_companies {
                        ui.label(&company.name);
                    }
                }

                let cast = display::top_cast(state.credits.as_ref(), display::CAST_LIMIT);
                if !cast.is_empty() {
                    ui.add_space(10.0);
                    ui.label(egui::RichText::new("Cast").size(18.0).strong());
                    egui::Grid::new("detail_cast").num_columns(2).striped(true).show(ui, |ui| {
                        for member in cast {
                            let profile = display::profile_or_placeholder(&self.image_base_url, member);
                            if profile == display::PLACEHOLDER_IMAGE {
                                ui.label(egui::RichText::new(&member.name).strong());
                            } else {
                                ui.hyperlink_to(egui::RichText::new(&member.name).strong(), profile);
                            }
                            ui.label(egui::RichText::new(format!("as {}", member.character)).color(egui::Color32::GRAY));
                            ui.end_row();
                        }
                    });
                }
            });
        }

        if back {
            self.go_back();
        }
    }

    fn show_console_tab(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Console Log");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("🗑 Clear").clicked() {
                    self.console.clear();
                    log::info!("Console cleared");
                }
            });
        });
        ui.separator();

        egui::ScrollArea::vertical()
            .id_salt("console_scroll")
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for line in self.console.lines() {
                    let color = if line.contains("[ERROR]") {
                        egui::Color32::RED
                    } else if line.contains("[WARN]") {
                        egui::Color32::YELLOW
                    } else if line.contains("[INFO]") {
                        egui::Color32::LIGHT_BLUE
                    } else {
                        egui::Color32::GRAY
                    };
                    ui.label(egui::RichText::new(line).monospace().color(color));
                }
            });
    }

    fn show_settings_window(&mut self, ctx: &egui::Context) {
        let mut open = self.show_settings;
        let mut save = false;

        egui::Window::new("⚙ Settings")
            .open(&mut open)
            .collapsible(false)
            .resizable(true)
            .min_width(460.0)
            .show(ctx, |ui| {
                let draft = &mut self.settings_draft;

                ui.label(egui::RichText::new("Movie catalog").strong());
                egui::Grid::new("settings_catalog").num_columns(2).show(ui, |ui| {
                    ui.label("API read token:");
                    ui.add(egui::TextEdit::singleline(&mut draft.api_key).password(true));
                    ui.end_row();
                    ui.label("API base URL:");
                    ui.text_edit_singleline(&mut draft.api_base_url);
                    ui.end_row();
                    ui.label("Image base URL:");
                    ui.text_edit_singleline(&mut draft.image_base_url);
                    ui.end_row();
                    ui.label("Timeout:");
                    ui.add(egui::DragValue::new(&mut draft.request_timeout_secs).range(1..=120).suffix("s"));
                    ui.end_row();
                    ui.label("Search delay:");
                    ui.add(egui::DragValue::new(&mut draft.debounce_ms).range(100..=5000).suffix("ms"));
                    ui.end_row();
                });
                if std::env::var(API_KEY_ENV).is_ok() {
                    ui.label(egui::RichText::new(format!("{} is set and takes precedence", API_KEY_ENV))
                        .small()
                        .color(egui::Color32::GRAY));
                }

                ui.separator();
                ui.label(egui::RichText::new("Trending searches").strong());
                egui::ComboBox::from_label("Storage")
                    .selected_text(draft.trend_backend.label())
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut draft.trend_backend, TrendBackend::Local, TrendBackend::Local.label());
                        ui.selectable_value(&mut draft.trend_backend, TrendBackend::Remote, TrendBackend::Remote.label());
                    });
                ui.add(egui::DragValue::new(&mut draft.trending_limit).range(1..=20).prefix("Show top "));

                if draft.trend_backend == TrendBackend::Remote {
                    egui::Grid::new("settings_remote").num_columns(2).show(ui, |ui| {
                        ui.label("Endpoint:");
                        ui.text_edit_singleline(&mut draft.remote_endpoint);
                        ui.end_row();
                        ui.label("Project ID:");
                        ui.text_edit_singleline(&mut draft.remote_project_id);
                        ui.end_row();
                        ui.label("Database ID:");
                        ui.text_edit_singleline(&mut draft.remote_database_id);
                        ui.end_row();
                        ui.label("Collection ID:");
                        ui.text_edit_singleline(&mut draft.remote_collection_id);
                        ui.end_row();
                        ui.label("API key:");
                        ui.add(egui::TextEdit::singleline(&mut draft.remote_api_key).password(true));
                        ui.end_row();
                    });
                }

                ui.separator();
                ui.horizontal(|ui| {
                    ui.checkbox(&mut draft.dark_mode, "Dark mode");
                    ui.add(egui::DragValue::new(&mut draft.font_size).range(10..=24).prefix("Font "));
                });

                ui.add_space(6.0);
                if ui.button("💾 Save").clicked() {
                    save = true;
                }
            });

        if save {
            self.apply_settings();
            open = false;
        }
        self.show_settings = open;
    }

    fn apply_style(&self, ctx: &egui::Context) {
        if self.config.dark_mode {
            ctx.set_visuals(egui::Visuals::dark());
        } else {
            ctx.set_visuals(egui::Visuals::light());
        }
        let size = self.config.font_size as f32;
        ctx.style_mut(|style| {
            if let Some(body) = style.text_styles.get_mut(&egui::TextStyle::Body) {
                body.size = size;
            }
            if let Some(button) = style.text_styles.get_mut(&egui::TextStyle::Button) {
                button.size = size;
            }
        });
    }
}

impl eframe::App for MovieFinderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Process background results (non-blocking)
        self.search.poll();
        self.detail.poll();
        self.trending.poll();

        let now = Instant::now();
        self.search.tick_at(now);

        // Keep frames coming while something is pending
        if self.search.state().is_loading || self.detail.state().is_loading || self.trending.state().is_loading {
            ctx.request_repaint_after(LOADING_REPAINT);
        }
        if let Some(wait) = self.search.time_until_debounce(now) {
            ctx.request_repaint_after(wait);
        }

        self.apply_style(ctx);

        // Top panel - navigation
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.add_space(5.0);
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("🎬 Movie Finder").strong().size(18.0));
                ui.separator();
                ui.selectable_value(&mut self.current_tab, Tab::Browse, "🏠 Browse");
                ui.selectable_value(&mut self.current_tab, Tab::Console, "📜 Console");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("⚙ Settings").clicked() {
                        self.settings_draft = self.config.clone();
                        self.show_settings = true;
                    }
                });
            });
            ui.add_space(5.0);
        });

        // Bottom panel - status
        let status = self.status_text();
        let busy = self.search.state().is_loading || self.detail.state().is_loading;
        egui::TopBottomPanel::bottom("bottom_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if busy {
                    ui.spinner();
                }
                ui.label(status);
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| match (self.current_tab, self.route) {
            (Tab::Console, _) => self.show_console_tab(ui),
            (Tab::Browse, Route::Home) => self.show_home(ui),
            (Tab::Browse, Route::Movie(_)) => self.show_detail(ui),
        });

        if self.show_settings {
            self.show_settings_window(ctx);
        }
    }
}
