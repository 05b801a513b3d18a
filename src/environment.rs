//! Lexical environments.
//!
//! Each environment maps names to shared mutable cells and links to its
//! parent. Closures hold an `Env` handle, so an environment lives as long
//! as the longest-lived closure or call frame referring to it.
//!
//! A function defined inside a call and stored in that call's own
//! environment forms an `Rc` cycle. [`Frames`] tracks call environments
//! and reclaims the ones only reachable through such cycles.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::value::{Function, Value};

/// Shared handle to an environment.
pub type Env = Rc<RefCell<Environment>>;

/// A single mutable binding.
pub type Cell = Rc<RefCell<Value>>;

#[derive(Default)]
pub struct Environment {
    values: HashMap<String, Cell>,
    parent: Option<Env>,
}

impl Environment {
    /// Create a root environment.
    #[must_use]
    pub fn global() -> Env {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Create an environment whose lookups fall back to `parent`.
    #[must_use]
    pub fn child(parent: &Env) -> Env {
        Rc::new(RefCell::new(Self {
            values: HashMap::new(),
            parent: Some(Rc::clone(parent)),
        }))
    }

    /// Bind `name` in this environment. An existing binding in this same
    /// environment has its cell overwritten; outer bindings are untouched.
    pub fn define(&mut self, name: &str, value: Value) {
        if let Some(cell) = self.values.get(name) {
            *cell.borrow_mut() = value;
        } else {
            self.values
                .insert(name.to_string(), Rc::new(RefCell::new(value)));
        }
    }

    /// Find the cell for `name`, walking the parent chain.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Cell> {
        match self.values.get(name) {
            Some(cell) => Some(Rc::clone(cell)),
            None => self
                .parent
                .as_ref()
                .and_then(|parent| parent.borrow().lookup(name)),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.lookup(name).map(|cell| cell.borrow().clone())
    }

    /// Drop every binding, breaking reference cycles through closures.
    pub fn clear(&mut self) {
        let values = std::mem::take(&mut self.values);
        drop(values);
    }
}

/// Fewest tracked frames before a collection runs.
const MIN_THRESHOLD: usize = 64;

/// Call environments that may take part in closure cycles.
///
/// [`Frames::collect`] runs trial deletion over the tracked set: strong
/// counts not explained by references from inside the set mark an
/// environment or function as reachable from outside. Everything not
/// reachable from those roots is cleared, which breaks its cycles.
#[derive(Debug)]
pub struct Frames {
    tracked: Vec<Weak<RefCell<Environment>>>,
    threshold: usize,
}

type EnvPtr = *const RefCell<Environment>;
type FnPtr = *const Function;

impl Frames {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tracked: Vec::new(),
            threshold: MIN_THRESHOLD,
        }
    }

    pub fn track(&mut self, env: &Env) {
        self.tracked.push(Rc::downgrade(env));
    }

    /// Number of tracked entries, including ones already freed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    /// Whether enough frames accumulated since the last collection.
    #[must_use]
    pub fn due(&self) -> bool {
        self.tracked.len() >= self.threshold
    }

    /// Clear every tracked environment that is only kept alive by other
    /// tracked environments and the functions stored in them. Returns
    /// the number of environments cleared.
    pub fn collect(&mut self) -> usize {
        let envs: Vec<Env> = self.tracked.iter().filter_map(Weak::upgrade).collect();
        let index: HashMap<EnvPtr, usize> = envs
            .iter()
            .enumerate()
            .map(|(i, env)| (Rc::as_ptr(env), i))
            .collect();

        let mut internal = vec![0_usize; envs.len()];
        let mut edges: Vec<Vec<usize>> = vec![Vec::new(); envs.len()];
        let mut pinned = vec![false; envs.len()];
        let mut functions: HashMap<FnPtr, (Rc<Function>, usize)> = HashMap::new();
        let mut held: Vec<Vec<FnPtr>> = vec![Vec::new(); envs.len()];

        for (i, env) in envs.iter().enumerate() {
            // A frame in use by the evaluator stays alive.
            let Ok(env) = env.try_borrow() else {
                pinned[i] = true;
                continue;
            };
            let parent = env.parent.as_ref();
            if let Some(&j) = parent.and_then(|p| index.get(&Rc::as_ptr(p))) {
                internal[j] += 1;
                edges[i].push(j);
            }
            for cell in env.values.values() {
                let Ok(value) = cell.try_borrow() else {
                    pinned[i] = true;
                    continue;
                };
                scan_functions(&value, &mut |function| {
                    let ptr = Rc::as_ptr(function);
                    functions
                        .entry(ptr)
                        .or_insert_with(|| (Rc::clone(function), 0))
                        .1 += 1;
                    held[i].push(ptr);
                });
            }
        }

        let closure_of =
            |function: &Rc<Function>| index.get(&Rc::as_ptr(&function.closure)).copied();
        for (function, _) in functions.values() {
            if let Some(j) = closure_of(function) {
                internal[j] += 1;
            }
        }
        for (i, ptrs) in held.iter().enumerate() {
            for ptr in ptrs {
                if let Some(j) = functions.get(ptr).and_then(|(f, _)| closure_of(f)) {
                    edges[i].push(j);
                }
            }
        }

        let mut live = vec![false; envs.len()];
        let mut stack: Vec<usize> = (0..envs.len())
            .filter(|&i| pinned[i] || Rc::strong_count(&envs[i]) - 1 > internal[i])
            .collect();
        stack.extend(
            functions
                .values()
                .filter(|(f, seen)| Rc::strong_count(f) - 1 > *seen)
                .filter_map(|(f, _)| closure_of(f)),
        );
        while let Some(i) = stack.pop() {
            if !live[i] {
                live[i] = true;
                stack.extend(edges[i].iter().copied());
            }
        }
        drop(functions);

        let mut cleared = 0;
        for (env, _) in envs.iter().zip(&live).filter(|(_, alive)| !**alive) {
            let values = std::mem::take(&mut env.borrow_mut().values);
            drop(values);
            cleared += 1;
        }
        drop(envs);

        self.tracked.retain(|weak| weak.strong_count() > 0);
        self.threshold = MIN_THRESHOLD.max(self.tracked.len() * 2);
        if cleared > 0 {
            tracing::debug!(
                cleared,
                remaining = self.tracked.len(),
                "collected call frames"
            );
        }
        cleared
    }
}

impl Default for Frames {
    fn default() -> Self {
        Self::new()
    }
}

/// Call `visit` for every function reachable inside `value`.
fn scan_functions(value: &Value, visit: &mut impl FnMut(&Rc<Function>)) {
    match value {
        Value::Function(function) => visit(function),
        Value::Array(items) => {
            for item in items {
                scan_functions(item, visit);
            }
        }
        Value::Object(entries) => {
            for item in entries.values() {
                scan_functions(item, visit);
            }
        }
        Value::Accessible { value, .. } => scan_functions(value, visit),
        _ => {}
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.values.keys().collect();
        names.sort();
        f.debug_struct("Environment")
            .field("names", &names)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}
