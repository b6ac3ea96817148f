//! keysim - Terminal keyboard simulator
//!
//! Shows a keyboard-layout-editor layout in the terminal and lights up the
//! keys you press on your real keyboard.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{
    self, Event, KeyCode as TermKey, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Clear};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use keysim::{
    config::Config,
    input::{is_available as os_keyboard_available, terminal_key_code, HoldTimer, OsKeyEvent, OsKeyboardListener},
    keyboard::{Change, KeySimulator},
    layout::GridCoord,
    legend::{LegendMap, LegendTable},
    presets::{case_position, layout_position, CASE_PRESETS, LAYOUT_PRESETS},
    ui::{enter_terminal, hit_test, keys_area, leave_terminal, place_keys, render_keyboard, Tui},
    Rgb,
};

#[derive(Parser)]
#[command(name = "keysim")]
#[command(author, version, about = "Terminal keyboard simulator for keyboard-layout-editor layouts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path (default: ~/.config/keysim/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bundled layout to start with (see `keysim layouts`)
    #[arg(short, long)]
    layout: Option<String>,

    /// Layout file in keyboard-layout-editor format
    #[arg(short = 'f', long)]
    layout_file: Option<PathBuf>,

    /// Bundled case color to start with
    #[arg(long)]
    case: Option<String>,

    /// Custom case color (#rgb or #rrggbb)
    #[arg(long)]
    case_color: Option<Rgb>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a default configuration file
    Init,
    /// Show the configuration file path
    ConfigPath,
    /// List bundled layouts and case colors
    Layouts,
    /// Parse a layout file and report the result
    Check {
        /// Layout file to check
        file: PathBuf,
    },
    /// Parse a layout file and print its grid and location index as JSON
    Dump {
        /// Layout file to dump
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Init) => {
            let path = Config::create_default_config_file()?;
            println!("Created default config at: {}", path.display());
            return Ok(());
        }
        Some(Commands::ConfigPath) => {
            let path = Config::config_path()?;
            println!("{}", path.display());
            return Ok(());
        }
        Some(Commands::Layouts) => {
            println!("Layouts:");
            for preset in LAYOUT_PRESETS {
                println!("  {:<8} {}", preset.key, preset.caption);
            }
            println!("Case colors:");
            for preset in CASE_PRESETS {
                println!("  {:<8} {} ({})", preset.key, preset.caption, preset.color);
            }
            return Ok(());
        }
        _ => {}
    }

    // Load config
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_or_default(),
    };

    // Apply CLI overrides
    if let Some(layout) = cli.layout {
        config.layout.preset = layout;
        config.layout.file = None;
    }
    if let Some(file) = cli.layout_file {
        config.layout.file = Some(file);
    }
    if let Some(case) = cli.case {
        config.case.preset = case;
        config.case.color = None;
    }
    if let Some(color) = cli.case_color {
        config.case.color = Some(color);
    }

    match cli.command {
        Some(Commands::Check { file }) => check_layout(&config, &file),
        Some(Commands::Dump { file }) => dump_layout(&config, &file),
        _ => run_tui(config),
    }
}

fn load_simulator(config: &Config, text: &str) -> Result<KeySimulator> {
    let mut sim = KeySimulator::new(config.legend_table()?);
    sim.set_case_color(config.case_color()?);
    sim.load_layout(text)?;
    Ok(sim)
}

fn check_layout(config: &Config, file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let sim = load_simulator(config, &text)
        .with_context(|| format!("{} is not a valid layout", file.display()))?;

    let (width, height) = sim.grid().extent();
    println!("{}", sim.meta().name.as_deref().unwrap_or("(unnamed layout)"));
    println!("  rows:     {}", sim.grid().rows().len());
    println!("  keys:     {}", sim.grid().len());
    println!("  legends:  {}", sim.index().len());
    println!("  size:     {} x {} units", width, height);

    let unmapped: Vec<&str> = sim
        .index()
        .sorted()
        .into_keys()
        .filter(|legend| sim.legends().code_for(legend).is_none())
        .collect();
    if !unmapped.is_empty() {
        println!("  no key code: {}", unmapped.join(" "));
    }
    Ok(())
}

fn dump_layout(config: &Config, file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let sim = load_simulator(config, &text)
        .with_context(|| format!("{} is not a valid layout", file.display()))?;

    let dump = serde_json::json!({
        "meta": sim.meta(),
        "grid": sim.grid(),
        "index": sim.index().sorted(),
    });
    println!("{}", serde_json::to_string_pretty(&dump)?);
    Ok(())
}

/// Selection state cycled with Tab and F2
struct Selection {
    layout: usize,
    case: usize,
}

fn run_tui(config: Config) -> Result<()> {
    let text = config.layout_text()?;
    let mut sim = load_simulator(&config, &text)?;

    let mut selection = Selection {
        layout: layout_position(&config.layout.preset).unwrap_or(0),
        case: case_position(&config.case.preset).unwrap_or(0),
    };

    // Create OS keyboard listener
    let os_keyboard = if os_keyboard_available() {
        OsKeyboardListener::new()
    } else {
        None
    };
    if os_keyboard.is_none() {
        log::info!("OS keyboard listener unavailable, using terminal key events");
    }

    let mut terminal = enter_terminal()?;

    // Main loop
    let result = run_event_loop(&mut terminal, &mut sim, &config, &mut selection, os_keyboard.as_ref());

    // Cleanup
    leave_terminal(&mut terminal)?;

    result
}

fn run_event_loop(
    terminal: &mut Tui,
    sim: &mut KeySimulator<LegendMap>,
    config: &Config,
    selection: &mut Selection,
    os_keyboard: Option<&OsKeyboardListener>,
) -> Result<()> {
    let settings = &config.ui;
    let mut hold_timer = HoldTimer::new(config.hold_release());
    let mut has_focus = true;
    let mut placed: Vec<(GridCoord, Rect)> = Vec::new();
    // Legend held with the mouse, released on button up
    let mut mouse_legend: Option<String> = None;

    loop {
        // Draw
        terminal.draw(|frame| {
            let area = frame.area();

            frame.render_widget(Clear, area);
            let bg_block = Block::default().style(Style::default().bg(Color::Rgb(20, 20, 30)));
            frame.render_widget(bg_block, area);

            render_keyboard(frame, area, &*sim, settings, os_keyboard.is_some() && has_focus);

            let inner = Block::bordered().inner(area);
            placed = place_keys(sim.grid(), keys_area(inner, settings), settings.unit_width, settings.unit_height);
        })?;

        // Process OS keyboard events only when focused
        if let Some(os_kb) = os_keyboard {
            while let Some(event) = os_kb.try_recv() {
                if !has_focus {
                    continue;
                }
                match event {
                    OsKeyEvent::Press(code) => {
                        sim.key_down(code);
                    }
                    OsKeyEvent::Release(code) => {
                        sim.key_up(code);
                    }
                }
            }
        } else {
            for code in hold_timer.expired(Instant::now()) {
                sim.key_up(code);
            }
        }

        // Poll for terminal events
        if !event::poll(Duration::from_millis(16))? {
            continue;
        }

        match event::read()? {
            Event::FocusGained => {
                has_focus = true;
            }
            Event::FocusLost => {
                has_focus = false;
                let released = sim.release_all();
                hold_timer.clear();
                mouse_legend = None;
                log::debug!("Focus lost, released {} keys", released.len());
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => {
                    if let Some(coord) = hit_test(&placed, mouse.column, mouse.row) {
                        if let Some(key) = sim.grid().get(coord) {
                            let legend = key.legend.clone();
                            sim.press_legend(&legend);
                            mouse_legend = Some(legend);
                        }
                    }
                }
                MouseEventKind::Up(MouseButton::Left) => {
                    if let Some(legend) = mouse_legend.take() {
                        sim.release_legend(&legend);
                    }
                }
                _ => {}
            },
            Event::Key(key) => {
                has_focus = true;

                match key.kind {
                    KeyEventKind::Press => {}
                    // Only terminals with the keyboard enhancement protocol report these
                    KeyEventKind::Repeat if os_keyboard.is_none() => {
                        if let Some(code) = terminal_key_code(key.code) {
                            hold_timer.touch(code, Instant::now());
                        }
                        continue;
                    }
                    KeyEventKind::Release if os_keyboard.is_none() => {
                        if let Some(code) = terminal_key_code(key.code) {
                            hold_timer.forget(code);
                            sim.key_up(code);
                        }
                        continue;
                    }
                    _ => continue,
                }

                match key.code {
                    TermKey::Esc => {
                        sim.release_all();
                        return Ok(());
                    }
                    TermKey::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        sim.release_all();
                        return Ok(());
                    }
                    TermKey::Tab => {
                        selection.layout = (selection.layout + 1) % LAYOUT_PRESETS.len();
                        let preset = &LAYOUT_PRESETS[selection.layout];
                        if let Err(e) = sim.load_layout(preset.data) {
                            log::warn!("Preset {} failed to load: {}", preset.key, e);
                        }
                    }
                    TermKey::F(2) => {
                        selection.case = (selection.case + 1) % CASE_PRESETS.len();
                        sim.set_case_color(CASE_PRESETS[selection.case].color);
                    }
                    code if os_keyboard.is_none() => {
                        if let Some(code) = terminal_key_code(code) {
                            hold_timer.touch(code, Instant::now());
                            if let Change::Pressed { coords, .. } = sim.key_down(code) {
                                log::trace!("{} lit {} keys", code, coords.len());
                            }
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
}
