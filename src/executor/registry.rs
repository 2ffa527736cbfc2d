use crate::core::Arguments;
use std::collections::BTreeMap;
use std::fmt;

/// An in-process operation that can be invoked by name with keyword arguments.
pub trait Invokable {
    fn invoke(&self, arguments: &Arguments) -> Result<(), String>;
}

impl<F> Invokable for F
where
    F: Fn(&Arguments) -> Result<(), String>,
{
    fn invoke(&self, arguments: &Arguments) -> Result<(), String> {
        self(arguments)
    }
}

/// Name-keyed table of invokables, built at startup
#[derive(Default)]
pub struct InvocationRegistry {
    entries: BTreeMap<String, Box<dyn Invokable>>,
}

impl InvocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an invokable, replacing any previous one under the same name.
    pub fn register(&mut self, name: impl Into<String>, invokable: impl Invokable + 'static) {
        self.entries.insert(name.into(), Box::new(invokable));
    }

    pub fn with(mut self, name: impl Into<String>, invokable: impl Invokable + 'static) -> Self {
        self.register(name, invokable);
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Invokable> {
        self.entries.get(name).map(|b| b.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for InvocationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationRegistry")
            .field("names", &self.names())
            .finish()
    }
}
