use crate::config::TaskConfig;
use log::{debug, info};
use nback_core::{Phase, Presentation, RecencyBuffer, SessionSummary, StimulusSet, TaskPhase, TaskView};
use nback_timing::Timer;
use rand::Rng;

const NS_PER_SEC: u64 = 1_000_000_000;
const NS_PER_MS: u64 = 1_000_000;

/// Things the state machine tells the application about.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    CountdownTick(u32),
    CountdownFinished,
    StimulusShown(usize),
    TaskFinished,
}

/// Drives one session: countdown, then a stimulus every interval until the
/// trial duration runs out, scoring space presses against the recency window.
pub struct TaskStateMachine<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    pub phase: TaskPhase,
    pub timer: T,
    rng: R,
    config: TaskConfig,
    stimuli: StimulusSet,
    buffer: RecencyBuffer,
    score: u32,
    /// Latch: at most one point per presentation.
    scored: bool,
    repeat_opportunities: usize,
    countdown_remaining: u32,
    last_tick_ns: u64,
    task_start_ns: Option<u64>,
    last_presentation_ns: u64,
    current_stimulus: Option<usize>,
    log: Vec<Presentation>,
}

impl<T, R> TaskStateMachine<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    pub fn new(config: TaskConfig, stimuli: StimulusSet, timer: T, rng: R) -> Self {
        let buffer = RecencyBuffer::new(config.nback_window);
        let countdown_remaining = config.countdown_s;
        let now = timer.now();
        Self {
            phase: TaskPhase::default(),
            timer,
            rng,
            config,
            stimuli,
            buffer,
            score: 0,
            scored: false,
            repeat_opportunities: 0,
            countdown_remaining,
            last_tick_ns: now,
            task_start_ns: None,
            last_presentation_ns: 0,
            current_stimulus: None,
            log: Vec::new(),
        }
    }

    /// Advances the clock-driven parts of the session. Call once per frame.
    pub fn update(&mut self) -> Vec<TaskEvent> {
        let mut events = Vec::new();
        match self.phase {
            TaskPhase::Countdown => self.update_countdown(&mut events),
            TaskPhase::Task => self.update_task(&mut events),
            TaskPhase::Complete => {}
        }
        events
    }

    fn update_countdown(&mut self, events: &mut Vec<TaskEvent>) {
        if self.countdown_remaining == 0 {
            events.push(TaskEvent::CountdownFinished);
            self.start_task(events);
            return;
        }
        let now = self.timer.now();
        if now.saturating_sub(self.last_tick_ns) < NS_PER_SEC {
            return;
        }
        self.last_tick_ns = now;
        self.countdown_remaining -= 1;
        if self.countdown_remaining == 0 {
            events.push(TaskEvent::CountdownFinished);
            self.start_task(events);
        } else {
            events.push(TaskEvent::CountdownTick(self.countdown_remaining));
        }
    }

    fn start_task(&mut self, events: &mut Vec<TaskEvent>) {
        self.phase = TaskPhase::Task;
        let now = self.timer.now();
        self.task_start_ns = Some(now);
        info!("task started, duration {} s", self.config.task_duration_s);
        self.present(events);
    }

    fn update_task(&mut self, events: &mut Vec<TaskEvent>) {
        let Some(start) = self.task_start_ns else {
            return;
        };
        let now = self.timer.now();
        if now.saturating_sub(start) >= self.config.task_duration_s * NS_PER_SEC {
            self.finish(events);
            return;
        }
        if now.saturating_sub(self.last_presentation_ns)
            >= self.config.stimulus_interval_ms * NS_PER_MS
        {
            self.present(events);
        }
    }

    fn present(&mut self, events: &mut Vec<TaskEvent>) {
        let index = self.rng.random_range(0..self.stimuli.len());
        self.present_index(index, events);
    }

    /// Shows one stimulus and opens a fresh scoring window.
    fn present_index(&mut self, index: usize, events: &mut Vec<TaskEvent>) {
        let now = self.timer.now();
        self.last_presentation_ns = now;
        self.buffer.push(index);
        self.scored = false;
        self.current_stimulus = Some(index);

        let repeat = self.buffer.is_repeat();
        if repeat {
            self.repeat_opportunities += 1;
        }
        let presentation_index = self.log.len();
        let name = self.stimuli.name(index).unwrap_or_default().to_string();
        debug!(
            "presentation {}: {}{}",
            presentation_index,
            name,
            if repeat { " (2-back repeat)" } else { "" }
        );
        self.log.push(Presentation {
            index: presentation_index,
            stimulus: name,
            onset_ns: now,
            repeat,
            flagged: false,
            scored: false,
        });
        events.push(TaskEvent::StimulusShown(index));
    }

    /// Space bar: the subject claims the current image repeats the one shown
    /// two steps earlier. Returns true when the claim earned the point.
    pub fn flag_repeat(&mut self) -> bool {
        if !self.phase.allows_input() {
            return false;
        }
        if let Some(presentation) = self.log.last_mut() {
            presentation.flagged = true;
        }
        if self.scored || !self.buffer.is_repeat() {
            return false;
        }
        self.score += 1;
        self.scored = true;
        if let Some(presentation) = self.log.last_mut() {
            presentation.scored = true;
        }
        info!("repeat detected, score: {}", self.score);
        true
    }

    fn finish(&mut self, events: &mut Vec<TaskEvent>) {
        self.phase = TaskPhase::Complete;
        self.current_stimulus = None;
        info!(
            "task complete: score {} of {} repeat opportunities over {} presentations",
            self.score,
            self.repeat_opportunities,
            self.log.len()
        );
        events.push(TaskEvent::TaskFinished);
    }

    pub fn view(&self) -> TaskView {
        TaskView {
            phase: self.phase,
            countdown_remaining: self.countdown_remaining,
            stimulus: self.current_stimulus,
            score: self.score,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            score: self.score,
            presentations: self.log.len(),
            repeat_opportunities: self.repeat_opportunities,
            duration_s: self.config.task_duration_s,
            log: self.log.clone(),
        }
    }
}
