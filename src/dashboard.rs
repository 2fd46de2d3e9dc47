//! Event-driven controller for the charts.
//!
//! Events arrive through an `mpsc` channel the same way a terminal app receives key
//! and resize events. Loads run on worker threads and come back as
//! [`DashboardEvent::Loaded`]; everything else (aggregation, views, tooltips) happens
//! on the thread that owns the [`Dashboard`].

use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use color_eyre::Result;
use tracing::{debug, warn};

use crate::charts::{Chart, ChartKind, ChartView, LoadedData};
use crate::debounce::Debouncer;
use crate::error::LoadError;
use crate::overlay::{OverlayGuard, Tooltip, TooltipOverlay};
use crate::selection::{Selection, SelectionChange};

pub const LOAD_FAILED_MESSAGE: &str = "Data unavailable.";

#[derive(Debug)]
pub enum DashboardEvent {
    /// Start (or restart) loading a chart's sources.
    Load(ChartKind),
    /// A worker finished loading for `generation`.
    Loaded {
        kind: ChartKind,
        generation: u64,
        result: Result<LoadedData, LoadError>,
    },
    Select(ChartKind, SelectionChange),
    /// Clear both filters of a chart.
    Reset(ChartKind),
    Resize(u32, u32),
    /// Clock tick; releases a debounced resize once it is due.
    Tick(Instant),
    HoverEnter {
        kind: ChartKind,
        mark: usize,
        at: (f64, f64),
    },
    HoverLeave(ChartKind),
    /// Tear a chart down. Its pending load is ignored when it arrives.
    Close(ChartKind),
    Exit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// What a frame shows: a view, or a message in place of the chart.
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    View(ChartView),
    Empty(String),
}

/// One render of one chart.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub chart: ChartKind,
    pub title: &'static str,
    pub content: Content,
    pub size: (u32, u32),
    /// Selection revision the content was computed for.
    pub revision: u64,
}

struct Slot {
    chart: Box<dyn Chart>,
    selection: Selection,
    generation: u64,
    state: SlotState,
    view: Option<ChartView>,
}

impl Slot {
    fn new(chart: Box<dyn Chart>) -> Self {
        Self {
            chart,
            selection: Selection::new(),
            generation: 0,
            state: SlotState::Idle,
            view: None,
        }
    }

    fn frame(&mut self, size: (u32, u32)) -> Frame {
        let content = match &self.state {
            SlotState::Failed(_) => {
                self.view = None;
                Content::Empty(LOAD_FAILED_MESSAGE.to_string())
            }
            _ => {
                let view = self.chart.view(&self.selection);
                self.view = Some(view.clone());
                Content::View(view)
            }
        };
        Frame {
            chart: self.chart.kind(),
            title: self.chart.title(),
            content,
            size,
            revision: self.selection.revision(),
        }
    }
}

struct Hover {
    kind: ChartKind,
    mark: usize,
    at: (f64, f64),
    guard: OverlayGuard,
}

pub struct Dashboard {
    sender: Sender<DashboardEvent>,
    slots: Vec<Slot>,
    size: (u32, u32),
    resize: Debouncer<(u32, u32)>,
    overlay: TooltipOverlay,
    hover: Option<Hover>,
    frames: VecDeque<Frame>,
}

impl Dashboard {
    pub fn new(
        sender: Sender<DashboardEvent>,
        charts: Vec<Box<dyn Chart>>,
        size: (u32, u32),
        resize_window: Duration,
    ) -> Self {
        Self {
            sender,
            slots: charts.into_iter().map(Slot::new).collect(),
            size,
            resize: Debouncer::new(resize_window),
            overlay: TooltipOverlay::new(),
            hover: None,
            frames: VecDeque::new(),
        }
    }

    pub fn kinds(&self) -> Vec<ChartKind> {
        self.slots.iter().map(|s| s.chart.kind()).collect()
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn state(&self, kind: ChartKind) -> Option<&SlotState> {
        self.slot(kind).map(|s| &s.state)
    }

    pub fn selection(&self, kind: ChartKind) -> Option<&Selection> {
        self.slot(kind).map(|s| &s.selection)
    }

    /// Last view rendered for `kind`.
    pub fn view(&self, kind: ChartKind) -> Option<&ChartView> {
        self.slot(kind).and_then(|s| s.view.as_ref())
    }

    pub fn tooltip(&self) -> Option<Tooltip> {
        self.overlay.visible()
    }

    /// No load in flight and no resize waiting.
    pub fn is_settled(&self) -> bool {
        !self.resize.is_pending() && self.slots.iter().all(|s| s.state != SlotState::Loading)
    }

    fn slot(&self, kind: ChartKind) -> Option<&Slot> {
        self.slots.iter().find(|s| s.chart.kind() == kind)
    }

    fn slot_mut(&mut self, kind: ChartKind) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.chart.kind() == kind)
    }

    pub fn event(&mut self, event: DashboardEvent) {
        match event {
            DashboardEvent::Load(kind) => self.start_load(kind),
            DashboardEvent::Loaded {
                kind,
                generation,
                result,
            } => self.finish_load(kind, generation, result),
            DashboardEvent::Select(kind, change) => {
                let Some(slot) = self.slot_mut(kind) else {
                    return;
                };
                if !slot.chart.axes().contains(&change.axis()) {
                    debug!(chart = %kind.as_str(), axis = ?change.axis(), "selection axis not used");
                    return;
                }
                if slot.selection.apply(change) {
                    self.render(kind);
                }
            }
            DashboardEvent::Reset(kind) => {
                if self.slot_mut(kind).is_some_and(|s| s.selection.reset()) {
                    self.render(kind);
                }
            }
            DashboardEvent::Resize(width, height) => {
                self.resize.trigger((width, height), Instant::now());
            }
            DashboardEvent::Tick(now) => {
                if let Some(size) = self.resize.poll(now) {
                    debug!(width = size.0, height = size.1, "debounced resize");
                    self.size = size;
                    for kind in self.kinds() {
                        self.render(kind);
                    }
                }
            }
            DashboardEvent::HoverEnter { kind, mark, at } => self.hover_enter(kind, mark, at),
            DashboardEvent::HoverLeave(kind) => {
                if self.hover.as_ref().is_some_and(|h| h.kind == kind) {
                    if let Some(hover) = self.hover.take() {
                        hover.guard.release();
                    }
                }
            }
            DashboardEvent::Close(kind) => {
                if self.hover.as_ref().is_some_and(|h| h.kind == kind) {
                    self.hover = None;
                }
                self.slots.retain(|s| s.chart.kind() != kind);
                self.frames.retain(|f| f.chart != kind);
            }
            DashboardEvent::Exit => {}
        }
    }

    fn start_load(&mut self, kind: ChartKind) {
        let Some(slot) = self.slot_mut(kind) else {
            debug!(chart = %kind.as_str(), "load requested for a closed chart");
            return;
        };
        slot.generation += 1;
        slot.state = SlotState::Loading;
        let generation = slot.generation;
        let request = slot.chart.load_request();
        let sender = self.sender.clone();
        thread::spawn(move || {
            let result = request.run();
            // The receiver is gone once the dashboard has shut down.
            let _ = sender.send(DashboardEvent::Loaded {
                kind,
                generation,
                result,
            });
        });
    }

    fn finish_load(
        &mut self,
        kind: ChartKind,
        generation: u64,
        result: Result<LoadedData, LoadError>,
    ) {
        let Some(slot) = self.slot_mut(kind) else {
            debug!(chart = %kind.as_str(), "dropping load for a closed chart");
            return;
        };
        if generation != slot.generation {
            debug!(
                chart = %kind.as_str(),
                generation,
                current = slot.generation,
                "dropping stale load"
            );
            return;
        }
        match result {
            Ok(data) => {
                slot.chart.install(data, generation);
                slot.state = SlotState::Ready;
            }
            Err(e) => {
                warn!(chart = %kind.as_str(), "load failed: {}", e);
                slot.state = SlotState::Failed(e.to_string());
            }
        }
        self.render(kind);
    }

    /// Queue a frame for `kind` against its current selection.
    fn render(&mut self, kind: ChartKind) {
        let size = self.size;
        let Some(slot) = self.slot_mut(kind) else {
            return;
        };
        if !matches!(slot.state, SlotState::Ready | SlotState::Failed(_)) {
            return;
        }
        let frame = slot.frame(size);
        self.frames.push_back(frame);
        self.refresh_hover(kind);
    }

    fn hover_enter(&mut self, kind: ChartKind, mark: usize, at: (f64, f64)) {
        let Some(lines) = self
            .view(kind)
            .and_then(|v| v.tooltip(mark))
            .map(<[String]>::to_vec)
        else {
            return;
        };
        let guard = self.overlay.acquire(Tooltip {
            owner: kind.as_str().to_string(),
            lines,
            anchor: at,
        });
        // The displaced guard no longer owns the overlay, so dropping it is a no-op.
        self.hover = Some(Hover {
            kind,
            mark,
            at,
            guard,
        });
    }

    /// Re-read the hovered mark after a re-render; hide the tooltip if it vanished.
    fn refresh_hover(&mut self, kind: ChartKind) {
        let Some(hover) = self.hover.as_ref().filter(|h| h.kind == kind) else {
            return;
        };
        let lines = self
            .view(kind)
            .and_then(|v| v.tooltip(hover.mark))
            .map(<[String]>::to_vec);
        match lines {
            Some(lines) => {
                hover.guard.update(lines, hover.at);
            }
            None => self.hover = None,
        }
    }

    /// Take queued frames, skipping any rendered against a superseded selection.
    pub fn drain_frames(&mut self) -> Vec<Frame> {
        let frames: Vec<Frame> = self.frames.drain(..).collect();
        frames
            .into_iter()
            .filter(|frame| {
                let current = self
                    .selection(frame.chart)
                    .is_some_and(|s| frame.revision >= s.revision());
                if !current {
                    debug!(chart = %frame.chart.as_str(), revision = frame.revision, "skipping stale frame");
                }
                current
            })
            .collect()
    }

    /// Process events until every load has finished and no resize is pending, or until
    /// `Exit` arrives.
    pub fn run_until_settled(
        &mut self,
        receiver: &Receiver<DashboardEvent>,
        poll_interval: Duration,
    ) {
        while !self.is_settled() {
            match receiver.recv_timeout(poll_interval) {
                Ok(DashboardEvent::Exit) => break,
                Ok(event) => self.event(event),
                Err(RecvTimeoutError::Timeout) => {
                    self.event(DashboardEvent::Tick(Instant::now()));
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{AgeGroupChart, SourceSettings};
    use crate::loader::Dataset;
    use crate::schema::Row;
    use crate::selection::Filter;
    use std::sync::mpsc::channel;

    fn loaded() -> LoadedData {
        LoadedData {
            table: Dataset::from_rows(
                "mem",
                vec![
                    Row {
                        age_group: Some("17-25".to_string()),
                        count: 10.0,
                        ..Row::default()
                    },
                    Row {
                        age_group: Some("26-39".to_string()),
                        count: 4.0,
                        ..Row::default()
                    },
                ],
            ),
            boundaries: None,
        }
    }

    fn dashboard() -> (Dashboard, Receiver<DashboardEvent>) {
        let (tx, rx) = channel();
        let chart = Box::new(AgeGroupChart::new(&SourceSettings::default()));
        let dashboard = Dashboard::new(tx, vec![chart], (400, 200), Duration::from_millis(150));
        (dashboard, rx)
    }

    /// Deliver a load result as if a worker for the current generation produced it.
    fn deliver(dashboard: &mut Dashboard, generation: u64) {
        dashboard.event(DashboardEvent::Loaded {
            kind: ChartKind::AgeGroups,
            generation,
            result: Ok(loaded()),
        });
    }

    #[test]
    fn stale_generation_is_dropped() {
        let (mut dashboard, _rx) = dashboard();
        dashboard.event(DashboardEvent::Load(ChartKind::AgeGroups));
        dashboard.event(DashboardEvent::Load(ChartKind::AgeGroups));
        deliver(&mut dashboard, 1);
        assert_eq!(
            dashboard.state(ChartKind::AgeGroups),
            Some(&SlotState::Loading)
        );
        assert!(dashboard.drain_frames().is_empty());
        deliver(&mut dashboard, 2);
        assert_eq!(dashboard.state(ChartKind::AgeGroups), Some(&SlotState::Ready));
        assert_eq!(dashboard.drain_frames().len(), 1);
    }

    #[test]
    fn superseded_frames_are_not_emitted() {
        let (mut dashboard, _rx) = dashboard();
        dashboard.event(DashboardEvent::Load(ChartKind::AgeGroups));
        deliver(&mut dashboard, 1);
        dashboard.event(DashboardEvent::Select(
            ChartKind::AgeGroups,
            SelectionChange::Category(Filter::Only("17-25".to_string())),
        ));
        let frames = dashboard.drain_frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].revision, 1);
    }

    #[test]
    fn unused_axis_is_ignored() {
        let (mut dashboard, _rx) = dashboard();
        dashboard.event(DashboardEvent::Select(
            ChartKind::AgeGroups,
            SelectionChange::Year(Filter::Only(2020)),
        ));
        assert_eq!(
            dashboard
                .selection(ChartKind::AgeGroups)
                .map(Selection::revision),
            Some(0)
        );
    }

    #[test]
    fn exit_stops_the_loop_with_work_pending() {
        let (mut dashboard, rx) = dashboard();
        dashboard.resize = Debouncer::new(Duration::from_secs(3600));
        dashboard.event(DashboardEvent::Resize(500, 300));
        let tx = dashboard.sender.clone();
        tx.send(DashboardEvent::Resize(520, 300)).expect("send");
        tx.send(DashboardEvent::Exit).expect("send");

        dashboard.run_until_settled(&rx, Duration::from_millis(5));
        assert!(!dashboard.is_settled());
        assert!(rx.try_recv().is_err());
        assert_eq!(dashboard.size(), (400, 200));
    }

    #[test]
    fn hover_then_close_hides_tooltip() {
        let (mut dashboard, _rx) = dashboard();
        dashboard.event(DashboardEvent::Load(ChartKind::AgeGroups));
        deliver(&mut dashboard, 1);
        dashboard.event(DashboardEvent::HoverEnter {
            kind: ChartKind::AgeGroups,
            mark: 0,
            at: (10.0, 20.0),
        });
        let tip = dashboard.tooltip().expect("tooltip");
        assert_eq!(tip.lines, vec!["17-25", "10 positive tests"]);
        dashboard.event(DashboardEvent::Close(ChartKind::AgeGroups));
        assert!(dashboard.tooltip().is_none());
        deliver(&mut dashboard, 1);
        assert!(dashboard.drain_frames().is_empty());
    }
}
