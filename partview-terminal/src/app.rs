/// Interactive terminal front end
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute, terminal,
};
use log::{debug, info};
use partview_core::{ModelIndex, Rgb};
use std::io::{self, stdout, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::controller::Controller;
use crate::presenter::{self, Layout};
use crate::tree_view::TreeView;

const HELP: &str = "j/k select  wasd/er rotate  o open  n rename  c colour  space show/hide  + add  z reset  v/x VR  p preview  q quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    Open,
    Rename,
    Colour,
}

impl PromptKind {
    fn label(self) -> &'static str {
        match self {
            PromptKind::Open => "Open STL files",
            PromptKind::Rename => "Rename",
            PromptKind::Colour => "Colour (name or #rrggbb)",
        }
    }
}

#[derive(Debug)]
struct Prompt {
    kind: PromptKind,
    buffer: String,
}

pub struct TerminalApp {
    controller: Controller,
    view: TreeView,
    layout: Layout,
    prompt: Option<Prompt>,
    show_vr: bool,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(config: Config) -> io::Result<Self> {
        let (columns, rows) = terminal::size()?;
        Ok(Self::with_size(config, columns, rows))
    }

    /// App for a terminal of the given size, without touching the terminal
    pub fn with_size(config: Config, columns: u16, rows: u16) -> Self {
        let layout = Layout::new(columns, rows, config.tree_width);
        let controller = Controller::new(
            config,
            usize::from(layout.viewport.width),
            usize::from(layout.viewport.height),
        );
        let mut view = TreeView::new();
        view.rebuild(controller.parts());

        Self {
            controller,
            view,
            layout,
            prompt: None,
            show_vr: false,
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Open files as top-level parts
    pub fn open(&mut self, files: &[PathBuf]) {
        if files.is_empty() {
            return;
        }
        self.controller.open_files(files, None);
        self.view.rebuild(self.controller.parts());
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture
        )?;

        let result = self.main_loop();

        self.controller.stop_vr();
        terminal::disable_raw_mode()?;
        execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_secs_f32(1.0 / self.controller.config().fps.max(1) as f32);
        let mut previous = Instant::now();

        while self.running {
            let frame_start = Instant::now();

            while event::poll(Duration::ZERO)? {
                let event = event::read()?;
                self.handle_event(event);
            }

            self.controller.tick(frame_start - previous);
            previous = frame_start;
            self.controller.redraw();

            self.render()?;

            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(columns, rows) => {
                self.layout = Layout::new(columns, rows, self.controller.config().tree_width);
                self.controller.resize(
                    usize::from(self.layout.viewport.width),
                    usize::from(self.layout.viewport.height),
                );
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let hit = self
            .layout
            .tree_line(mouse.column, mouse.row)
            .and_then(|line| self.view.part_at(line));
        if let Some(index) = hit {
            self.view.select(index.id);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return;
        }

        let step = self.controller.config().rotation_step;
        let selected = self.view.selected();
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Down | KeyCode::Char('j') => self.view.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.view.select_previous(),
            KeyCode::Char('w') => self.controller.rotate(step, 0.0, 0.0),
            KeyCode::Char('s') => self.controller.rotate(-step, 0.0, 0.0),
            KeyCode::Char('a') => self.controller.rotate(0.0, -step, 0.0),
            KeyCode::Char('d') => self.controller.rotate(0.0, step, 0.0),
            KeyCode::Char('e') => self.controller.rotate(0.0, 0.0, step),
            KeyCode::Char('r') => self.controller.rotate(0.0, 0.0, -step),
            KeyCode::Char('o') => self.open_prompt(PromptKind::Open, String::new()),
            KeyCode::Char('n') => {
                if let Some(index) = selected {
                    let name = self
                        .controller
                        .parts()
                        .part(&index)
                        .map(|p| p.name().to_string())
                        .unwrap_or_default();
                    self.open_prompt(PromptKind::Rename, name);
                }
            }
            KeyCode::Char('c') => {
                if selected.is_some() {
                    self.open_prompt(PromptKind::Colour, String::new());
                }
            }
            KeyCode::Char(' ') => {
                if let Some(index) = selected {
                    self.controller.toggle_visibility(&index);
                    self.view.rebuild(self.controller.parts());
                }
            }
            KeyCode::Char('+') => {
                if let Some(added) = self.controller.add_new_item(selected.as_ref()) {
                    self.view.rebuild(self.controller.parts());
                    self.view.select(added.id);
                }
            }
            KeyCode::Char('z') => self.controller.update_render(),
            KeyCode::Char('v') => {
                self.controller.start_vr();
            }
            KeyCode::Char('x') => {
                self.controller.stop_vr();
                self.show_vr = false;
            }
            KeyCode::Char('p') => self.show_vr = !self.show_vr,
            _ => {}
        }
    }

    fn open_prompt(&mut self, kind: PromptKind, buffer: String) {
        debug!("prompt: {kind:?}");
        self.prompt = Some(Prompt { kind, buffer });
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.prompt = None,
            KeyCode::Backspace => {
                prompt.buffer.pop();
            }
            KeyCode::Char(c) => prompt.buffer.push(c),
            KeyCode::Enter => {
                if let Some(prompt) = self.prompt.take() {
                    self.submit(prompt);
                }
            }
            _ => {}
        }
    }

    fn submit(&mut self, prompt: Prompt) {
        let selected = self.view.selected();
        match prompt.kind {
            PromptKind::Open => {
                let files: Vec<PathBuf> = prompt.buffer.split_whitespace().map(PathBuf::from).collect();
                if files.is_empty() {
                    return;
                }
                let added = self.controller.open_files(&files, selected.as_ref());
                self.view.rebuild(self.controller.parts());
                if let Some(last) = added.last() {
                    info!("opened {} of {} files", added.len(), files.len());
                    self.view.select(last.id);
                }
            }
            PromptKind::Rename => {
                if let Some(index) = selected {
                    if self.controller.rename(&index, &prompt.buffer) {
                        self.view.rebuild(self.controller.parts());
                    } else {
                        self.controller.set_status("Name cannot be empty");
                    }
                }
            }
            PromptKind::Colour => {
                let Some(index) = selected else {
                    return;
                };
                match prompt.buffer.parse::<Rgb>() {
                    Ok(colour) => {
                        self.controller.set_colour(&index, colour);
                        self.view.rebuild(self.controller.parts());
                    }
                    Err(err) => {
                        let names: Vec<&str> = Rgb::names().collect();
                        self.controller.set_status(format!("{err}; names: {}", names.join(", ")));
                    }
                }
            }
        }
    }

    pub fn selected(&self) -> Option<ModelIndex> {
        self.view.selected()
    }

    /// Text for the bottom line
    fn status_line(&self) -> String {
        if let Some(prompt) = &self.prompt {
            return format!("{}: {}_", prompt.kind.label(), prompt.buffer);
        }
        if let Some(message) = self.controller.status() {
            return message.to_string();
        }
        let vr = if self.controller.vr_running() { " | VR on" } else { "" };
        format!("FPS {:.1}{vr} | {HELP}", self.fps)
    }

    fn render(&mut self) -> io::Result<()> {
        let mut stdout = stdout();

        presenter::draw_tree(&mut stdout, &mut self.view, self.controller.parts(), self.layout.tree)?;

        let preview = if self.show_vr {
            self.controller.vr_preview()
        } else {
            None
        };
        let frame = preview.as_ref().unwrap_or(self.controller.viewport());
        presenter::draw_framebuffer(&mut stdout, frame, self.layout.viewport)?;

        presenter::draw_status(&mut stdout, &self.status_line(), self.layout.status_row, self.layout.columns)?;

        stdout.flush()
    }
}

/// Render the given files once, without a terminal
pub fn snapshot(config: Config, files: &[PathBuf], width: usize, height: usize) -> anyhow::Result<String> {
    let mut controller = Controller::new(config, width, height);
    let added = controller.open_files(files, None);
    if added.is_empty() && !files.is_empty() {
        anyhow::bail!(
            "no parts could be loaded: {}",
            controller.status().unwrap_or("unknown error")
        );
    }
    Ok(presenter::snapshot_text(controller.viewport()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use partview_core::stl::write_binary_stl;
    use partview_core::Mesh;
    use std::fs;

    fn app() -> TerminalApp {
        TerminalApp::with_size(Config::default(), 100, 30)
    }

    fn press(app: &mut TerminalApp, code: KeyCode) {
        app.handle_event(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn type_text(app: &mut TerminalApp, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn selected_name(app: &TerminalApp) -> String {
        let index = app.selected().unwrap();
        app.controller().parts().part(&index).unwrap().name().to_string()
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.is_running());

        let mut app = self::app();
        press(&mut app, KeyCode::Esc);
        assert!(!app.is_running());
    }

    #[test]
    fn test_add_and_rename() {
        let mut app = app();
        press(&mut app, KeyCode::Char('+'));
        assert_eq!(selected_name(&app), "New");

        press(&mut app, KeyCode::Char('n'));
        for _ in 0.."New".len() {
            press(&mut app, KeyCode::Backspace);
        }
        // Keys go to the prompt, not the app
        type_text(&mut app, "q Hub");
        assert!(app.is_running());
        press(&mut app, KeyCode::Enter);
        assert_eq!(selected_name(&app), "q Hub");

        let parent = app.controller().parts().parent(&app.selected().unwrap()).unwrap();
        assert_eq!(parent.row, 0);
    }

    #[test]
    fn test_escape_cancels_prompt() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "Other");
        press(&mut app, KeyCode::Esc);
        assert!(app.is_running());
        assert_eq!(selected_name(&app), "TopLevel 0");
    }

    #[test]
    fn test_colour_prompt() {
        let mut app = app();
        press(&mut app, KeyCode::Char('c'));
        type_text(&mut app, "teal-ish");
        press(&mut app, KeyCode::Enter);
        assert!(app.controller().status().is_some());

        press(&mut app, KeyCode::Char('c'));
        type_text(&mut app, "#00ff00");
        press(&mut app, KeyCode::Enter);
        let index = app.selected().unwrap();
        assert_eq!(
            app.controller().parts().part(&index).unwrap().colour(),
            Rgb::new(0, 255, 0)
        );
    }

    #[test]
    fn test_open_prompt_loads_under_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gear.stl");
        fs::write(&path, write_binary_stl(&Mesh::cube(1.0))).unwrap();

        let mut app = app();
        press(&mut app, KeyCode::Char('o'));
        type_text(&mut app, &path.display().to_string());
        press(&mut app, KeyCode::Enter);

        assert_eq!(selected_name(&app), "gear");
        assert!(app.controller().viewport().covered() > 0);

        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.controller().viewport().covered(), 0);
        assert!(app.status_line().starts_with("Loaded 1 file"));
    }

    #[test]
    fn test_mouse_selects_row() {
        let mut app = app();
        press(&mut app, KeyCode::Char('+'));
        press(&mut app, KeyCode::Up);
        assert_eq!(selected_name(&app), "TopLevel 0");

        let click = |row| {
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column: 3,
                row,
                modifiers: KeyModifiers::NONE,
            })
        };
        app.handle_event(click(2));
        assert_eq!(selected_name(&app), "New");
        // Header row selects nothing
        app.handle_event(click(0));
        assert_eq!(selected_name(&app), "New");
    }

    #[test]
    fn test_resize_updates_viewport() {
        let mut app = app();
        app.handle_event(Event::Resize(60, 20));
        assert_eq!(app.controller().viewport().height(), 19);
        assert_eq!(app.controller().viewport().width(), 60 - 31);
    }

    #[test]
    fn test_resize_to_one_column_keeps_running() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.stl");
        fs::write(&path, write_binary_stl(&Mesh::cube(2.0))).unwrap();

        let mut app = app();
        app.open(&[path]);
        assert!(app.controller().viewport().covered() > 0);

        app.handle_event(Event::Resize(1, 30));
        assert_eq!(app.controller().viewport().width(), 0);
        assert_eq!(app.controller().viewport().covered(), 0);

        app.handle_event(Event::Resize(100, 30));
        assert!(app.controller().viewport().covered() > 0);
    }

    #[test]
    fn test_snapshot_of_zero_width_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.stl");
        fs::write(&path, write_binary_stl(&Mesh::cube(2.0))).unwrap();

        assert_eq!(snapshot(Config::default(), &[path.clone()], 0, 20).unwrap(), "");
        assert_eq!(snapshot(Config::default(), &[path], 40, 0).unwrap(), "");
    }

    #[test]
    fn test_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.stl");
        fs::write(&path, write_binary_stl(&Mesh::cube(2.0))).unwrap();

        let text = snapshot(Config::default(), &[path], 40, 20).unwrap();
        assert_eq!(text.lines().count(), 20);
        assert!(!text.trim().is_empty());

        let missing = dir.path().join("missing.stl");
        assert!(snapshot(Config::default(), &[missing], 40, 20).is_err());
        assert_eq!(snapshot(Config::default(), &[], 4, 2).unwrap(), "\n\n");
    }
}
