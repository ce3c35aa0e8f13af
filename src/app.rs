use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::Backend};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

use crate::bridge;
use crate::config::Config;
use crate::git::{self, RepoStatus};
use crate::ui;

/// How long one loop tick waits for a keystroke. Short enough to feel
/// responsive, long enough not to spin while idle.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Overview,
    Detail,
}

pub struct App {
    pub config: Config,
    /// Discovered once at startup; refreshes re-collect status, not paths.
    repo_paths: Vec<PathBuf>,
    /// Replaced wholesale by every refresh, never mutated field-by-field.
    pub repos: Vec<RepoStatus>,
    pub selected: usize,
    pub view: View,
    pub last_message: Option<String>,
    pub should_quit: bool,
    last_refresh: Instant,
    last_fetch: Instant,
}

impl App {
    pub fn new(config: Config, repo_paths: Vec<PathBuf>, repos: Vec<RepoStatus>) -> App {
        // A single repository goes straight to its detail screen; Escape
        // then quits instead of backing out to a one-line overview.
        let view = if repos.len() == 1 {
            View::Detail
        } else {
            View::Overview
        };
        App {
            config,
            repo_paths,
            repos,
            selected: 0,
            view,
            last_message: None,
            should_quit: false,
            last_refresh: Instant::now(),
            last_fetch: Instant::now(),
        }
    }

    pub fn selected_repo(&self) -> Option<&RepoStatus> {
        self.repos.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if !self.repos.is_empty() {
            self.selected = (self.selected + 1) % self.repos.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.repos.is_empty() {
            self.selected = (self.selected + self.repos.len() - 1) % self.repos.len();
        }
    }

    /// Re-collect every repository and swap the snapshot in.
    pub fn refresh(&mut self, do_fetch: bool) {
        self.repos = git::aggregate(&self.repo_paths, &self.config, do_fetch);
        if self.selected >= self.repos.len() {
            self.selected = 0;
        }
        self.last_refresh = Instant::now();
        if do_fetch {
            self.last_fetch = Instant::now();
        }
    }

    fn refresh_due(&self) -> bool {
        self.config.refresh_interval_secs > 0
            && self.last_refresh.elapsed() > Duration::from_secs(self.config.refresh_interval_secs)
    }

    fn fetch_due(&self) -> bool {
        self.config.fetch_interval_secs > 0
            && self.last_fetch.elapsed() > Duration::from_secs(self.config.fetch_interval_secs)
    }

    /// Fire whichever background timer has elapsed. The fetch timer wins
    /// when both are due since it performs a full refresh as a side effect.
    fn tick_timers(&mut self) {
        if self.fetch_due() {
            info!("auto-fetch timer elapsed");
            self.refresh(true);
            self.last_message = Some("Auto-fetched.".to_string());
        } else if self.refresh_due() {
            self.refresh(false);
        }
    }

    /// Apply one keystroke. Returns true when a fetch was requested: the
    /// caller must redraw first so the user sees the in-progress message
    /// instead of a frozen screen, then call `refresh(true)`.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        // A new keypress always retires the previous transient message.
        self.last_message = None;

        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => {
                if self.view == View::Detail && self.repos.len() > 1 {
                    self.view = View::Overview;
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Enter => {
                if self.view == View::Overview && !self.repos.is_empty() {
                    self.view = View::Detail;
                }
            }
            KeyCode::Char('r') => {
                self.refresh(false);
                self.last_message = Some("Refreshed.".to_string());
            }
            KeyCode::Char('f') => {
                self.last_message = Some("Fetching remotes…".to_string());
                return true;
            }
            KeyCode::Char('g') => {
                self.last_message = Some(match self.selected_repo() {
                    Some(repo) => {
                        let (ok, msg) = bridge::open_in_github_desktop(&repo.path);
                        if ok { msg } else { format!("Could not open: {msg}") }
                    }
                    None => "No repository selected.".to_string(),
                });
            }
            KeyCode::Char('j') | KeyCode::Down => {
                if self.view == View::Overview {
                    self.select_next();
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if self.view == View::Overview {
                    self.select_prev();
                }
            }
            _ => {
                self.last_message = Some("Keys: q r f g j/k Enter Esc".to_string());
            }
        }
        false
    }

    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            terminal.draw(|f| ui::draw(f, self))?;

            let key = if event::poll(POLL_INTERVAL)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => Some(key),
                    _ => None,
                }
            } else {
                None
            };

            self.tick_timers();

            if let Some(key) = key {
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    info!("Ctrl+C pressed, quitting");
                    break;
                }
                let fetch_requested = self.handle_key(key.code);
                if fetch_requested {
                    // Intermediate frame: a multi-repo fetch can block for
                    // seconds and the screen must say so before it starts.
                    terminal.draw(|f| ui::draw(f, self))?;
                    self.refresh(true);
                    self.last_message = Some("Fetched + refreshed.".to_string());
                }
            }

            if self.should_quit {
                info!("Quit requested by user");
                break;
            }
        }
        Ok(())
    }
}
