use std::cell::{Cell, RefCell};

use tracing::{debug, error, info, warn};

use crate::error::BridgeError;
use crate::module::{ExecutionModule, ModuleCache, ModuleLoader};
use crate::program::ProgramText;
use crate::surface::{OutputSurface, RunTrigger};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum BridgeState {
    Idle,
    Running,
}

/// Connects an input surface, a run trigger and an output surface to an `ExecutionModule`.
///
/// Every method takes `&self`, so a host can share one bridge between its event handlers
/// (behind an `Rc`) and still deliver input changes while a run is suspended. Internal
/// borrows never live across an `.await`.
pub struct Bridge<L: ModuleLoader> {
    program: RefCell<ProgramText>,
    state: Cell<BridgeState>,
    modules: ModuleCache<L>,
    output: RefCell<Box<dyn OutputSurface>>,
    trigger: RefCell<Option<Box<dyn RunTrigger>>>,
}

impl<L: ModuleLoader> Bridge<L> {
    pub fn new(loader: L, output: impl OutputSurface + 'static) -> Self {
        Self {
            program: RefCell::new(ProgramText::default()),
            state: Cell::new(BridgeState::Idle),
            modules: ModuleCache::new(loader),
            output: RefCell::new(Box::new(output)),
            trigger: RefCell::new(None),
        }
    }

    pub fn with_trigger(self, trigger: impl RunTrigger + 'static) -> Self {
        *self.trigger.borrow_mut() = Some(Box::new(trigger));
        self
    }

    /// Replace the current program text with `new_text`, as-is.
    pub fn on_input_change(&self, new_text: impl Into<ProgramText>) {
        let new_text = new_text.into();
        debug!(program = %new_text, "program text captured");
        *self.program.borrow_mut() = new_text;
    }

    /// Run the current program text through the execution module and show the result.
    ///
    /// The program text is read once, when this is called; later input changes don't affect
    /// a run that's already started. Load and execution failures are rendered to the output
    /// surface as well as returned. A request made while another run is in flight returns
    /// `BridgeError::Busy` and leaves the output alone.
    pub async fn on_run_requested(&self) -> Result<(), BridgeError> {
        if self.state.get() == BridgeState::Running {
            warn!("run requested while another run is in flight, ignoring");
            return Err(BridgeError::Busy);
        }

        let program = self.program.borrow().clone();
        let _running = RunGuard::enter(self);
        info!(bytes = program.len(), "run started");

        match self.execute(&program).await {
            Ok(output) => {
                self.show(&output)?;
                info!(bytes = output.len(), "run finished");
                Ok(())
            }
            Err(err) => {
                error!(%err, "run failed");
                if let Err(surface_err) = self.show(&err.render()) {
                    error!(%surface_err, "couldn't render run failure");
                }
                Err(err)
            }
        }
    }

    async fn execute(&self, program: &ProgramText) -> Result<String, BridgeError> {
        let module = self
            .modules
            .acquire()
            .await
            .map_err(BridgeError::ModuleLoad)?;
        module
            .interpret(program.as_str())
            .await
            .map_err(BridgeError::Execution)
    }

    fn show(&self, text: &str) -> Result<(), BridgeError> {
        self.output.borrow_mut().show(text)?;
        Ok(())
    }

    fn set_trigger_enabled(&self, enabled: bool) {
        if let Some(trigger) = self.trigger.borrow_mut().as_mut() {
            trigger.set_enabled(enabled)
        }
    }

    pub fn program_text(&self) -> ProgramText {
        self.program.borrow().clone()
    }

    pub fn state(&self) -> BridgeState {
        self.state.get()
    }

    pub fn modules(&self) -> &ModuleCache<L> {
        &self.modules
    }
}

/// Holds the bridge in `Running`. Dropping it, whether the run finished or its future was
/// dropped, puts the bridge back to `Idle`.
struct RunGuard<'a, L: ModuleLoader> {
    bridge: &'a Bridge<L>,
}

impl<'a, L: ModuleLoader> RunGuard<'a, L> {
    fn enter(bridge: &'a Bridge<L>) -> Self {
        bridge.state.set(BridgeState::Running);
        bridge.set_trigger_enabled(false);
        Self { bridge }
    }
}

impl<'a, L: ModuleLoader> Drop for RunGuard<'a, L> {
    fn drop(&mut self) {
        self.bridge.state.set(BridgeState::Idle);
        self.bridge.set_trigger_enabled(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ModuleError, SurfaceError};
    use async_trait::async_trait;
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use std::collections::HashMap;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl Recorder {
        fn entries(&self) -> Vec<String> {
            self.0.borrow().clone()
        }

        fn last(&self) -> Option<String> {
            self.0.borrow().last().cloned()
        }
    }

    impl OutputSurface for Recorder {
        fn show(&mut self, text: &str) -> Result<(), SurfaceError> {
            self.0.borrow_mut().push(text.to_string());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct Button(Rc<RefCell<Vec<bool>>>);

    impl RunTrigger for Button {
        fn set_enabled(&mut self, enabled: bool) {
            self.0.borrow_mut().push(enabled)
        }
    }

    struct BrokenOutput;

    impl OutputSurface for BrokenOutput {
        fn show(&mut self, _text: &str) -> Result<(), SurfaceError> {
            Err(SurfaceError("closed".into()))
        }
    }

    /// Answers from a table, records every source it was called with.
    struct Table {
        answers: HashMap<String, Result<String, ModuleError>>,
        calls: Rc<RefCell<Vec<String>>>,
    }

    #[async_trait(?Send)]
    impl ExecutionModule for Table {
        async fn interpret(&self, source: &str) -> Result<String, ModuleError> {
            self.calls.borrow_mut().push(source.to_string());
            self.answers
                .get(source)
                .cloned()
                .unwrap_or_else(|| Err(format!("no answer for {:?}", source).into()))
        }
    }

    struct TableLoader {
        answers: Vec<(&'static str, Result<&'static str, &'static str>)>,
        calls: Rc<RefCell<Vec<String>>>,
        fail_first: Cell<bool>,
        gate: RefCell<Option<oneshot::Receiver<()>>>,
    }

    impl TableLoader {
        fn new(answers: Vec<(&'static str, Result<&'static str, &'static str>)>) -> Self {
            Self {
                answers,
                calls: Rc::default(),
                fail_first: Cell::new(false),
                gate: RefCell::new(None),
            }
        }

        fn failing_once(self) -> Self {
            self.fail_first.set(true);
            self
        }

        // The first load waits until the returned sender fires
        fn gated(self) -> (Self, oneshot::Sender<()>) {
            let (tx, rx) = oneshot::channel();
            *self.gate.borrow_mut() = Some(rx);
            (self, tx)
        }
    }

    #[async_trait(?Send)]
    impl ModuleLoader for TableLoader {
        type Module = Table;

        async fn load(&self) -> Result<Table, ModuleError> {
            let gate = self.gate.borrow_mut().take();
            if let Some(gate) = gate {
                gate.await.map_err(|_| ModuleError::from("gate dropped"))?;
            }
            if self.fail_first.replace(false) {
                return Err("module not found".into());
            }
            let answers = self
                .answers
                .iter()
                .map(|(src, out)| {
                    (
                        src.to_string(),
                        out.map(String::from).map_err(ModuleError::from),
                    )
                })
                .collect();
            Ok(Table {
                answers,
                calls: Rc::clone(&self.calls),
            })
        }
    }

    fn bridge_for(loader: TableLoader) -> (Bridge<TableLoader>, Recorder, Rc<RefCell<Vec<String>>>) {
        let output = Recorder::default();
        let calls = Rc::clone(&loader.calls);
        (Bridge::new(loader, output.clone()), output, calls)
    }

    #[test]
    fn test_input_change_is_verbatim() {
        let (bridge, _, _) = bridge_for(TableLoader::new(vec![]));
        assert_eq!(bridge.program_text().as_str(), "");

        for text in ["", " padded \t", "line one\nline two\n", "π = 3.14"] {
            bridge.on_input_change(text);
            assert_eq!(bridge.program_text().as_str(), text);
        }
    }

    #[test]
    fn test_run_shows_output() {
        let (bridge, output, calls) = bridge_for(TableLoader::new(vec![("1 + 1", Ok("2"))]));
        bridge.on_input_change("1 + 1");

        block_on(bridge.on_run_requested()).unwrap();

        assert_eq!(output.entries(), vec!["2"]);
        assert_eq!(*calls.borrow(), vec!["1 + 1"]);
        assert_eq!(bridge.state(), BridgeState::Idle);
    }

    #[test]
    fn test_empty_program_is_forwarded() {
        let (bridge, output, calls) = bridge_for(TableLoader::new(vec![("", Ok(""))]));

        block_on(bridge.on_run_requested()).unwrap();

        assert_eq!(output.entries(), vec![""]);
        assert_eq!(*calls.borrow(), vec![""]);
    }

    #[test]
    fn test_consecutive_runs_reuse_module() {
        let (bridge, output, calls) =
            bridge_for(TableLoader::new(vec![("a", Ok("A")), ("b", Ok("B"))]));

        bridge.on_input_change("a");
        block_on(bridge.on_run_requested()).unwrap();
        assert_eq!(output.last().as_deref(), Some("A"));

        bridge.on_input_change("b");
        block_on(bridge.on_run_requested()).unwrap();
        assert_eq!(output.last().as_deref(), Some("B"));

        assert_eq!(*calls.borrow(), vec!["a", "b"]);
        assert_eq!(bridge.modules().load_attempts(), 1);
    }

    #[test]
    fn test_load_failure_is_rendered_and_retried() {
        let (bridge, output, _) =
            bridge_for(TableLoader::new(vec![("x", Ok("ok"))]).failing_once());
        bridge.on_input_change("x");

        let err = block_on(bridge.on_run_requested()).unwrap_err();
        assert_eq!(err, BridgeError::ModuleLoad("module not found".into()));
        assert_eq!(
            output.last().as_deref(),
            Some("error: failed to load execution module: module not found")
        );
        assert_eq!(bridge.state(), BridgeState::Idle);
        assert!(!bridge.modules().is_loaded());

        block_on(bridge.on_run_requested()).unwrap();
        assert_eq!(output.last().as_deref(), Some("ok"));
        assert_eq!(bridge.modules().load_attempts(), 2);
    }

    #[test]
    fn test_execution_failure_replaces_stale_output() {
        let (bridge, output, _) = bridge_for(TableLoader::new(vec![
            ("good", Ok("fine")),
            ("bad", Err("unexpected token")),
        ]));

        bridge.on_input_change("good");
        block_on(bridge.on_run_requested()).unwrap();

        bridge.on_input_change("bad");
        let err = block_on(bridge.on_run_requested()).unwrap_err();
        assert_eq!(err, BridgeError::Execution("unexpected token".into()));
        assert_eq!(
            output.entries(),
            vec!["fine", "error: execution failed: unexpected token"]
        );
        assert_eq!(bridge.state(), BridgeState::Idle);
    }

    #[test]
    fn test_trigger_disabled_while_running() {
        let button = Button::default();
        let output = Recorder::default();
        let bridge =
            Bridge::new(TableLoader::new(vec![("", Ok("done"))]), output).with_trigger(button.clone());

        block_on(bridge.on_run_requested()).unwrap();
        assert_eq!(*button.0.borrow(), vec![false, true]);
    }

    #[test]
    fn test_reentrant_run_is_rejected_and_snapshot_is_kept() {
        let (loader, release) = TableLoader::new(vec![("first", Ok("1")), ("second", Ok("2"))]).gated();
        let (bridge, output, calls) = bridge_for(loader);
        bridge.on_input_change("first");

        block_on(async {
            let mut pending = Box::pin(bridge.on_run_requested());
            assert!(futures::poll!(pending.as_mut()).is_pending());
            assert_eq!(bridge.state(), BridgeState::Running);

            assert_eq!(bridge.on_run_requested().await, Err(BridgeError::Busy));

            bridge.on_input_change("second");
            release.send(()).unwrap();
            pending.await.unwrap();
        });

        assert_eq!(*calls.borrow(), vec!["first"]);
        assert_eq!(output.entries(), vec!["1"]);
        assert_eq!(bridge.program_text().as_str(), "second");
        assert_eq!(bridge.state(), BridgeState::Idle);
    }

    #[test]
    fn test_dropped_run_returns_to_idle() {
        let (loader, _release) = TableLoader::new(vec![]).gated();
        let button = Button::default();
        let bridge = Bridge::new(loader, Recorder::default()).with_trigger(button.clone());

        block_on(async {
            let mut pending = Box::pin(bridge.on_run_requested());
            assert!(futures::poll!(pending.as_mut()).is_pending());
            assert_eq!(bridge.state(), BridgeState::Running);
        });

        assert_eq!(bridge.state(), BridgeState::Idle);
        assert_eq!(*button.0.borrow(), vec![false, true]);
    }

    #[test]
    fn test_output_failure_is_reported() {
        let bridge = Bridge::new(TableLoader::new(vec![("", Ok("x"))]), BrokenOutput);

        let err = block_on(bridge.on_run_requested()).unwrap_err();
        assert_eq!(err, BridgeError::Output(SurfaceError("closed".into())));
        assert_eq!(bridge.state(), BridgeState::Idle);
    }
}
