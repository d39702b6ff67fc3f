// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Duration instrumentation with a per-thread call tree
//!
//! Wrapping a unit of work with [`measure`] (or holding a [`DurationGuard`])
//! opens a scope on the calling thread. Scopes opened while another one is
//! open become its children, so a request handler that calls into the
//! archivist ends up with a small call tree attributing its latency.
//!
//! When a scope completes it is logged: at `WARN` with a per-child breakdown
//! if it ran longer than its limit, at `DEBUG` otherwise. Completion happens
//! when the guard is dropped, so it also runs when the work returns an error
//! or unwinds.
//!
//! Open scopes live in thread-local storage. A guard cannot leave its thread
//! and therefore cannot be held across an `.await` in a `Send` future; work
//! measured this way must be synchronous.

use std::{
    cell::{Cell, RefCell},
    fmt::{self, Write as _},
    marker::PhantomData,
    time::{Duration, Instant},
};

use tracing::{Level, debug, warn};

const MAX_ARGUMENT_LENGTH: usize = 100;

thread_local! {
    static OPEN_SCOPES: RefCell<Vec<OpenScope>> = const { RefCell::new(Vec::new()) };
    static NEXT_SCOPE_ID: Cell<u64> = const { Cell::new(0) };
}

/// Owner and operation name of an instrumented call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationLabel {
    owner: Box<str>,
    operation: Box<str>,
}

impl OperationLabel {
    /// Create a label from the owning component and the operation name
    pub fn new(owner: impl Into<Box<str>>, operation: impl Into<Box<str>>) -> Self {
        Self {
            owner: owner.into(),
            operation: operation.into(),
        }
    }

    /// Owning component
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Operation name
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl fmt::Display for OperationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.owner, self.operation)
    }
}

/// Description of a scope to open: label, auxiliary text and warning limit
#[derive(Debug, Clone)]
pub struct ScopeSpec {
    label: OperationLabel,
    extra: Option<String>,
    limit: Duration,
}

impl ScopeSpec {
    /// Describe a scope warning when it runs longer than `limit_ms`
    pub fn new(owner: impl Into<Box<str>>, operation: impl Into<Box<str>>, limit_ms: u64) -> Self {
        Self {
            label: OperationLabel::new(owner, operation),
            extra: None,
            limit: Duration::from_millis(limit_ms),
        }
    }

    /// Attach free-form auxiliary text
    #[must_use]
    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }

    /// Attach a summary of the call arguments
    ///
    /// Each argument is rendered with `Display`, stripped of line breaks and
    /// cut at 100 characters.
    #[must_use]
    pub fn with_arguments(mut self, arguments: &[&dyn fmt::Display]) -> Self {
        self.extra = summarize_arguments(arguments);
        self
    }

    /// Label of the scope
    pub fn label(&self) -> &OperationLabel {
        &self.label
    }

    /// Auxiliary text
    pub fn extra(&self) -> Option<&str> {
        self.extra.as_deref()
    }

    /// Warning limit
    pub fn limit(&self) -> Duration {
        self.limit
    }
}

/// Render call arguments for a scope, truncating long values
pub fn summarize_arguments(arguments: &[&dyn fmt::Display]) -> Option<String> {
    if arguments.is_empty() {
        return None;
    }
    let summary = arguments
        .iter()
        .map(|argument| summarize_argument(&argument.to_string()))
        .collect::<Vec<_>>()
        .join(",");
    Some(summary)
}

fn summarize_argument(text: &str) -> String {
    let single_line: String = text
        .chars()
        .filter(|c| *c != '\r')
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    let length = text.chars().count();
    if length > MAX_ARGUMENT_LENGTH {
        let truncated: String = single_line.chars().take(MAX_ARGUMENT_LENGTH).collect();
        format!("{truncated}... (was {length} chars long, truncated)")
    } else {
        single_line
    }
}

#[derive(Debug)]
struct OpenScope {
    id: u64,
    spec: ScopeSpec,
    started: Instant,
    children: Vec<CompletedScope>,
}

impl OpenScope {
    fn close(self) -> CompletedScope {
        CompletedScope {
            duration: self.started.elapsed(),
            label: self.spec.label,
            extra: self.spec.extra,
            limit: self.spec.limit,
            children: self.children,
        }
    }
}

/// A finished scope with its measured duration and completed children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedScope {
    label: OperationLabel,
    extra: Option<String>,
    limit: Duration,
    duration: Duration,
    children: Vec<CompletedScope>,
}

impl CompletedScope {
    /// Label of the scope
    pub fn label(&self) -> &OperationLabel {
        &self.label
    }

    /// Auxiliary text
    pub fn extra(&self) -> Option<&str> {
        self.extra.as_deref()
    }

    /// Warning limit
    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Measured wall-clock duration
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Scopes completed while this one was current, in completion order
    pub fn children(&self) -> &[CompletedScope] {
        &self.children
    }

    /// Sum of the children's durations
    pub fn child_total(&self) -> Duration {
        self.children.iter().map(CompletedScope::duration).sum()
    }

    /// Whether this scope's own duration went over its limit
    ///
    /// Children exceeding their limits do not count.
    pub fn exceeded_limit(&self) -> bool {
        self.duration > self.limit
    }

    /// Severity the scope is logged at
    pub fn severity(&self) -> Level {
        if self.exceeded_limit() {
            Level::WARN
        } else {
            Level::DEBUG
        }
    }

    fn breakdown(&self) -> String {
        let mut breakdown = String::new();
        for child in &self.children {
            let _ = write!(
                breakdown,
                "\n({}): {} [ms]",
                child.label,
                child.duration.as_millis()
            );
        }
        if !self.children.is_empty() {
            let _ = write!(
                breakdown,
                "\nChild total: {} [ms]",
                self.child_total().as_millis()
            );
        }
        breakdown
    }

    fn log(&self) {
        let extra = self.extra.as_deref().unwrap_or_default();
        let duration_ms = self.duration.as_millis();
        if self.exceeded_limit() {
            warn!(
                operation = %self.label,
                extra,
                limit_ms = self.limit.as_millis(),
                duration_ms,
                child_total_ms = self.child_total().as_millis(),
                "duration of {} exceeded limit ({} [ms]) was {} [ms]{}",
                self.label,
                self.limit.as_millis(),
                duration_ms,
                self.breakdown()
            );
        } else {
            debug!(
                operation = %self.label,
                extra,
                duration_ms,
                "duration of {}: {} [ms]",
                self.label,
                duration_ms
            );
        }
    }
}

/// Guard keeping a scope open on the current thread
///
/// The scope completes when the guard is dropped or [`finish`](Self::finish)ed.
#[must_use = "the scope completes as soon as the guard is dropped"]
#[derive(Debug)]
pub struct DurationGuard {
    id: Option<u64>,
    // Scopes are registered in thread-local storage; the guard stays on its thread.
    _thread_bound: PhantomData<*const ()>,
}

impl DurationGuard {
    /// Open a scope as a child of the thread's current scope
    pub fn enter(spec: ScopeSpec) -> Self {
        let id = NEXT_SCOPE_ID
            .try_with(|next| {
                let id = next.get();
                next.set(id.wrapping_add(1));
                id
            })
            .ok();
        let id = id.and_then(|id| {
            OPEN_SCOPES
                .try_with(|scopes| {
                    scopes.borrow_mut().push(OpenScope {
                        id,
                        spec,
                        started: Instant::now(),
                        children: Vec::new(),
                    });
                    id
                })
                .ok()
        });
        Self {
            id,
            _thread_bound: PhantomData,
        }
    }

    /// Complete the scope now and return it with its children
    ///
    /// Returns `None` only while the thread's storage is being torn down.
    pub fn finish(mut self) -> Option<CompletedScope> {
        self.id.take().and_then(complete)
    }
}

impl Drop for DurationGuard {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            complete(id);
        }
    }
}

fn complete(id: u64) -> Option<CompletedScope> {
    let (completed, abandoned) = OPEN_SCOPES
        .try_with(|scopes| {
            let mut scopes = scopes.borrow_mut();
            let position = scopes.iter().rposition(|scope| scope.id == id)?;
            let abandoned: Vec<OperationLabel> = scopes
                .drain(position + 1..)
                .map(|scope| scope.spec.label)
                .collect();
            let completed = scopes.pop()?.close();
            if let Some(parent) = scopes.last_mut() {
                parent.children.push(completed.clone());
            }
            Some((completed, abandoned))
        })
        .ok()
        .flatten()?;

    for label in abandoned {
        warn!(operation = %label, "duration scope abandoned without completion");
    }
    completed.log();
    Some(completed)
}

/// Run `work` inside a scope and return its result
///
/// The scope completes on every exit path; errors and panics from `work`
/// propagate unchanged.
pub fn measure<T>(spec: ScopeSpec, work: impl FnOnce() -> T) -> T {
    let _guard = DurationGuard::enter(spec);
    work()
}

/// Run `work` inside a scope and return its result together with the scope
pub fn measure_scope<T>(spec: ScopeSpec, work: impl FnOnce() -> T) -> (T, Option<CompletedScope>) {
    let guard = DurationGuard::enter(spec);
    let output = work();
    (output, guard.finish())
}

/// Label of the scope currently open on this thread
pub fn current_operation() -> Option<OperationLabel> {
    OPEN_SCOPES
        .try_with(|scopes| scopes.borrow().last().map(|scope| scope.spec.label.clone()))
        .ok()
        .flatten()
}

/// Number of scopes currently open on this thread
pub fn depth() -> usize {
    OPEN_SCOPES
        .try_with(|scopes| scopes.borrow().len())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::{
        panic,
        sync::{Arc, Mutex},
        thread,
    };

    use tracing::{
        Subscriber,
        field::{Field, Visit},
    };
    use tracing_subscriber::{
        Layer,
        layer::{Context, SubscriberExt},
        registry,
    };

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct LoggedLine {
        level: Level,
        message: String,
        child_total_ms: Option<String>,
    }

    /// Keeps every event logged while it is the default subscriber
    #[derive(Debug, Clone, Default)]
    struct LogCapture(Arc<Mutex<Vec<LoggedLine>>>);

    impl LogCapture {
        fn at(&self, level: Level) -> Vec<LoggedLine> {
            self.0
                .lock()
                .expect("capture lock")
                .iter()
                .filter(|line| line.level == level)
                .cloned()
                .collect()
        }
    }

    struct LineFields<'a>(&'a mut LoggedLine);

    impl Visit for LineFields<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            match field.name() {
                "message" => self.0.message = format!("{value:?}"),
                "child_total_ms" => self.0.child_total_ms = Some(format!("{value:?}")),
                _ => {}
            }
        }
    }

    impl<S: Subscriber> Layer<S> for LogCapture {
        fn on_event(&self, event: &tracing::Event<'_>, _: Context<'_, S>) {
            let mut line = LoggedLine {
                level: *event.metadata().level(),
                message: String::new(),
                child_total_ms: None,
            };
            event.record(&mut LineFields(&mut line));
            self.0.lock().expect("capture lock").push(line);
        }
    }

    fn pause() {
        thread::sleep(Duration::from_millis(3));
    }

    #[test]
    fn nested_calls_build_a_call_tree() {
        let outer = DurationGuard::enter(ScopeSpec::new("CustomerResource", "get", 60_000));

        let first = measure(ScopeSpec::new("Archivist", "find_customer", 50), || 1);
        let second = measure(ScopeSpec::new("Archivist", "save_customer", 50), || 2);
        assert_eq!(first + second, 3);
        assert_eq!(depth(), 1);

        let outer = outer.finish().expect("outer scope completes");
        let operations: Vec<&str> = outer
            .children()
            .iter()
            .map(|child| child.label().operation())
            .collect();
        assert_eq!(operations, vec!["find_customer", "save_customer"]);
        assert_eq!(depth(), 0);
        assert_eq!(current_operation(), None);
    }

    #[test]
    fn warning_depends_on_own_duration_only() {
        let relaxed = DurationGuard::enter(ScopeSpec::new("Resource", "relaxed", 60_000));
        measure(ScopeSpec::new("Archivist", "slow_child", 0), pause);
        measure(ScopeSpec::new("Archivist", "slow_child", 0), pause);
        let relaxed = relaxed.finish().expect("scope completes");

        assert_eq!(relaxed.children().len(), 2);
        assert!(relaxed.children().iter().all(CompletedScope::exceeded_limit));
        assert!(!relaxed.exceeded_limit());
        assert_eq!(relaxed.severity(), Level::DEBUG);
        assert!(relaxed.child_total() <= relaxed.duration());

        let strict = DurationGuard::enter(ScopeSpec::new("Resource", "strict", 0));
        measure(ScopeSpec::new("Archivist", "fast_child", 60_000), || ());
        measure(ScopeSpec::new("Archivist", "fast_child", 60_000), || ());
        pause();
        let strict = strict.finish().expect("scope completes");

        assert_eq!(strict.children().len(), 2);
        assert!(!strict.children().iter().any(CompletedScope::exceeded_limit));
        assert!(strict.exceeded_limit());
        assert_eq!(strict.severity(), Level::WARN);
    }

    #[test]
    fn failing_work_restores_the_current_scope() {
        let outer = DurationGuard::enter(ScopeSpec::new("Resource", "outer", 60_000));

        let failed: Result<(), &str> = measure(ScopeSpec::new("Archivist", "failing", 50), || {
            assert_eq!(
                current_operation().map(|label| label.to_string()),
                Some("Archivist:failing".to_string())
            );
            Err("no such customer")
        });
        assert_eq!(failed, Err("no such customer"));
        assert_eq!(
            current_operation(),
            Some(OperationLabel::new("Resource", "outer"))
        );

        measure(ScopeSpec::new("Archivist", "sibling", 50), || {
            assert_eq!(depth(), 2);
        });

        let outer = outer.finish().expect("scope completes");
        let operations: Vec<&str> = outer
            .children()
            .iter()
            .map(|child| child.label().operation())
            .collect();
        assert_eq!(operations, vec!["failing", "sibling"]);
    }

    #[test]
    fn unwinding_work_is_still_recorded() {
        let outer = DurationGuard::enter(ScopeSpec::new("Resource", "outer", 60_000));

        let unwound = panic::catch_unwind(|| {
            measure::<()>(ScopeSpec::new("Archivist", "unwinding", 50), || {
                panic::resume_unwind(Box::new("storage exploded"))
            })
        });
        assert!(unwound.is_err());
        assert_eq!(
            current_operation(),
            Some(OperationLabel::new("Resource", "outer"))
        );

        let outer = outer.finish().expect("scope completes");
        assert_eq!(outer.children().len(), 1);
        assert_eq!(outer.children()[0].label().operation(), "unwinding");
    }

    #[test]
    fn measure_scope_returns_result_and_tree() {
        let (value, scope) = measure_scope(ScopeSpec::new("Resource", "list", 50), || {
            measure(ScopeSpec::new("Archivist", "list_customers", 50), || "done")
        });
        let scope = scope.expect("scope completes");

        assert_eq!(value, "done");
        assert_eq!(scope.children().len(), 1);
        assert!(scope.children()[0].children().is_empty());
    }

    #[test]
    fn scopes_are_confined_to_their_thread() {
        let _outer = DurationGuard::enter(ScopeSpec::new("Resource", "outer", 60_000));

        let seen = thread::spawn(|| (current_operation(), depth()))
            .join()
            .expect("thread finished");
        assert_eq!(seen, (None, 0));
        assert_eq!(depth(), 1);
    }

    #[test]
    fn dropping_an_outer_guard_closes_abandoned_inner_scopes() {
        let outer = DurationGuard::enter(ScopeSpec::new("Resource", "outer", 60_000));
        let inner = DurationGuard::enter(ScopeSpec::new("Archivist", "inner", 50));
        std::mem::forget(inner);
        assert_eq!(depth(), 2);

        let outer = outer.finish().expect("scope completes");
        assert!(outer.children().is_empty());
        assert_eq!(depth(), 0);
    }

    #[test]
    fn arguments_are_summarized() {
        let number = "0123456789";
        let note = "first line\r\nsecond line";
        let spec = ScopeSpec::new("Resource", "get", 50).with_arguments(&[&number, &note]);
        assert_eq!(spec.extra(), Some("0123456789,first line second line"));

        let long = "x".repeat(150);
        let spec = ScopeSpec::new("Resource", "get", 50).with_arguments(&[&long]);
        let extra = spec.extra().expect("summary present");
        assert!(extra.starts_with(&"x".repeat(MAX_ARGUMENT_LENGTH)));
        assert!(extra.ends_with("... (was 150 chars long, truncated)"));

        assert_eq!(summarize_arguments(&[]), None);
    }

    #[test]
    fn slow_scope_warns_with_its_child_breakdown() {
        let capture = LogCapture::default();
        let subscriber = registry().with(capture.clone());

        let completed = tracing::subscriber::with_default(subscriber, || {
            let outer = DurationGuard::enter(ScopeSpec::new("AccountResource", "get", 0));
            measure(ScopeSpec::new("Archivist", "find_account", 60_000), pause);
            measure(ScopeSpec::new("Archivist", "list_transactions", 60_000), pause);
            outer.finish().expect("scope completes")
        });

        let warnings = capture.at(Level::WARN);
        assert_eq!(warnings.len(), 1);
        let warning = &warnings[0];
        let child_total = completed.child_total().as_millis();
        assert!(warning.message.starts_with("duration of AccountResource:get exceeded limit (0 [ms])"));
        assert!(warning.message.contains("\n(Archivist:find_account): "));
        assert!(warning.message.contains("\n(Archivist:list_transactions): "));
        assert!(warning.message.ends_with(&format!("\nChild total: {child_total} [ms]")));
        assert_eq!(warning.child_total_ms, Some(child_total.to_string()));

        assert_eq!(capture.at(Level::DEBUG).len(), 2);
    }
}
