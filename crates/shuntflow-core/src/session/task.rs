//! Cooperative frame task.
//!
//! One tick polls and processes at most one frame, then hands back a token
//! for the next tick. The host (render loop, CLI) calls `tick` with that
//! token whenever it is ready. Stop and reset bump the generation, so a
//! token scheduled before them is rejected instead of touching the new state.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cloud::Viewport;
use crate::config::SessionConfig;
use crate::error::{Result, ShuntError};
use crate::io::{FrameSource, SourcePoll};

use super::context::{AnalysisSession, ViewCommand, ViewEffect};
use super::types::{AnalysisStage, FrameOutput, NoOpReporter, ProgressReporter, SessionReport};

/// Handle for one scheduled tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickToken {
    generation: u64,
    sequence: u64,
}

impl TickToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Work queued for the task and applied before the next frame.
#[derive(Clone, Debug, PartialEq)]
pub enum TaskCommand {
    View(ViewCommand),
    UpdateConfig(SessionConfig),
    Stop,
}

#[derive(Clone, Debug)]
pub enum TickOutcome {
    /// A frame was processed; call `tick` again with the token.
    Continue(TickToken, Box<FrameOutput>),
    /// Source paused; `start` again to resume.
    Paused,
    Finished(Box<SessionReport>),
    /// Stopped by command or detached source.
    Stopped,
    /// Processing failed; the session is in `Error` and will not reschedule.
    Failed(String),
    /// Token from an earlier schedule; nothing was done.
    Stale,
}

pub struct AnalysisTask<S: FrameSource> {
    source: S,
    session: AnalysisSession,
    reporter: Arc<dyn ProgressReporter>,
    viewport: Viewport,
    commands: VecDeque<TaskCommand>,
    generation: u64,
    sequence: u64,
    pending: Option<TickToken>,
}

impl<S: FrameSource> AnalysisTask<S> {
    pub fn new(source: S, session: AnalysisSession) -> Self {
        Self::with_reporter(source, session, Arc::new(NoOpReporter))
    }

    pub fn with_reporter(
        source: S,
        mut session: AnalysisSession,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        session.set_duration(source.duration_sec());
        let info = source.info();
        Self {
            source,
            session,
            reporter,
            viewport: Viewport::new(info.width as f64, info.height as f64),
            commands: VecDeque::new(),
            generation: 0,
            sequence: 0,
            pending: None,
        }
    }

    pub fn session(&self) -> &AnalysisSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut AnalysisSession {
        &mut self.session
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Viewport used for selection deletion in queued view commands.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn schedule(&mut self) -> TickToken {
        self.sequence += 1;
        let token = TickToken {
            generation: self.generation,
            sequence: self.sequence,
        };
        self.pending = Some(token);
        token
    }

    /// Schedule the first tick. `None` when the session is closed.
    pub fn start(&mut self) -> Option<TickToken> {
        if self.session.status().is_closed() {
            return None;
        }
        if let Some(token) = self.pending {
            return Some(token);
        }
        if self.session.frames_processed() == 0 {
            self.reporter
                .begin_stage(AnalysisStage::Analyzing, self.source.frame_count_hint());
        }
        Some(self.schedule())
    }

    pub fn is_scheduled(&self) -> bool {
        self.pending.is_some()
    }

    /// Cancel the pending tick and freeze the session.
    pub fn stop(&mut self) {
        self.generation += 1;
        self.pending = None;
        self.session.stop();
    }

    /// Cancel the pending tick and discard all session state.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.pending = None;
        self.commands.clear();
        self.session.reset();
        self.session.set_duration(self.source.duration_sec());
    }

    pub fn enqueue(&mut self, command: TaskCommand) {
        self.commands.push_back(command);
    }

    /// Apply queued commands in order. Returns the effects of view commands.
    pub fn apply_commands(&mut self) -> Vec<ViewEffect> {
        let mut effects = Vec::new();
        while let Some(command) = self.commands.pop_front() {
            match command {
                TaskCommand::View(view) => {
                    effects.push(self.session.apply_view_command(view, self.viewport));
                }
                TaskCommand::UpdateConfig(config) => {
                    if let Err(e) = self.session.update_config(config) {
                        warn!(error = %e, "Rejected configuration update");
                    }
                }
                TaskCommand::Stop => {
                    self.stop();
                    self.commands.clear();
                    break;
                }
            }
        }
        effects
    }

    /// Run one scheduled tick.
    pub fn tick(&mut self, token: TickToken) -> TickOutcome {
        if self.pending != Some(token) {
            debug!(
                generation = token.generation,
                current = self.generation,
                "Ignoring stale tick"
            );
            return TickOutcome::Stale;
        }
        self.pending = None;

        self.apply_commands();
        if self.session.status().is_closed() {
            return TickOutcome::Stopped;
        }

        match self.step() {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = e.to_string();
                self.session.fail(message.clone());
                self.reporter.finish_stage();
                TickOutcome::Failed(message)
            }
        }
    }

    fn step(&mut self) -> Result<TickOutcome> {
        match self.source.poll_frame()? {
            SourcePoll::Frame(frame) => {
                let output = self.session.process_frame(&frame)?;
                self.reporter.advance(output.frame_count as usize);
                let next = self.schedule();
                Ok(TickOutcome::Continue(next, Box::new(output)))
            }
            SourcePoll::Paused => {
                self.session.pause();
                Ok(TickOutcome::Paused)
            }
            SourcePoll::Ended => {
                self.reporter.finish_stage();
                self.reporter
                    .begin_stage(AnalysisStage::Summarizing, None);
                let report = self.session.finalize();
                self.reporter.finish_stage();
                Ok(TickOutcome::Finished(Box::new(report)))
            }
            SourcePoll::Detached => {
                self.session.stop();
                self.reporter.finish_stage();
                Ok(TickOutcome::Stopped)
            }
        }
    }

    /// Drive ticks until the stream terminates. Returns the report when the
    /// source ended, `None` when it paused or was stopped.
    pub fn run_to_end(&mut self) -> Result<Option<SessionReport>> {
        let mut token = self
            .start()
            .ok_or_else(|| ShuntError::SessionClosed(self.session.status().to_string()))?;
        loop {
            match self.tick(token) {
                TickOutcome::Continue(next, _) => token = next,
                TickOutcome::Finished(report) => return Ok(Some(*report)),
                TickOutcome::Paused | TickOutcome::Stopped => return Ok(None),
                TickOutcome::Failed(message) => return Err(ShuntError::FrameTask(message)),
                TickOutcome::Stale => {
                    return Err(ShuntError::FrameTask("tick token invalidated".into()))
                }
            }
        }
    }
}
