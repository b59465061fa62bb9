//! Ordered, best-effort providers for optional capabilities.
//!
//! Merging, metadata injection and link annotation can each be done by
//! several tools. Each capability is a [`BackendChain`] walked in priority
//! order; the first [`Attempt::Success`] wins and nothing past it runs. An
//! exhausted chain is not an error: the caller degrades and carries on.

/// Result of asking one backend to perform its capability. `T` is what a
/// successful backend hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T = ()> {
    /// The capability was applied.
    Success(T),
    /// The backend cannot run here (tool missing, unsupported input).
    Unavailable(String),
    /// The backend ran and failed. The chain moves on to the next one.
    Failed(String),
}

/// A provider of one optional capability over input `I`, yielding `T`.
pub trait Backend<I: ?Sized, T = ()> {
    /// Short name used in logs and reports (usually the tool name).
    fn name(&self) -> &'static str;

    /// How to make this backend available, shown when the whole chain fails.
    fn install_hint(&self) -> Option<&'static str> {
        None
    }

    fn attempt(&self, input: &I) -> Attempt<T>;
}

/// Why one backend in a chain did not apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Miss {
    pub backend: &'static str,
    pub reason: String,
    /// `true` for [`Attempt::Unavailable`], `false` for [`Attempt::Failed`].
    pub unavailable: bool,
    pub hint: Option<&'static str>,
}

/// What happened when a chain was run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome<T = ()> {
    Applied { backend: &'static str, value: T, misses: Vec<Miss> },
    Exhausted { misses: Vec<Miss> },
}

impl<T> ChainOutcome<T> {
    pub fn applied_by(&self) -> Option<&'static str> {
        match self {
            ChainOutcome::Applied { backend, .. } => Some(backend),
            ChainOutcome::Exhausted { .. } => None,
        }
    }

    /// What the winning backend returned.
    pub fn value(&self) -> Option<&T> {
        match self {
            ChainOutcome::Applied { value, .. } => Some(value),
            ChainOutcome::Exhausted { .. } => None,
        }
    }

    pub fn misses(&self) -> &[Miss] {
        match self {
            ChainOutcome::Applied { misses, .. } | ChainOutcome::Exhausted { misses } => misses,
        }
    }

    /// Install hints of every backend that was unavailable, deduplicated.
    pub fn hints(&self) -> Vec<&'static str> {
        let mut hints: Vec<&'static str> = Vec::new();
        for hint in self.misses().iter().filter(|m| m.unavailable).filter_map(|m| m.hint) {
            if !hints.contains(&hint) {
                hints.push(hint);
            }
        }
        hints
    }
}

/// An ordered list of backends for one capability.
pub struct BackendChain<I: ?Sized, T = ()> {
    backends: Vec<Box<dyn Backend<I, T>>>,
}

impl<I: ?Sized, T> Default for BackendChain<I, T> {
    fn default() -> Self {
        Self { backends: Vec::new() }
    }
}

impl<I: ?Sized, T> std::fmt::Debug for BackendChain<I, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl<I: ?Sized, T> BackendChain<I, T> {
    /// A chain with no backends. Running it always yields `Exhausted`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Appends a backend with the lowest priority so far.
    pub fn with(mut self, backend: impl Backend<I, T> + 'static) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Walks the chain in order and stops at the first success.
    pub fn run(&self, input: &I) -> ChainOutcome<T> {
        let mut misses = Vec::new();
        for backend in &self.backends {
            match backend.attempt(input) {
                Attempt::Success(value) => {
                    return ChainOutcome::Applied { backend: backend.name(), value, misses };
                }
                Attempt::Unavailable(reason) => misses.push(Miss {
                    backend: backend.name(),
                    reason,
                    unavailable: true,
                    hint: backend.install_hint(),
                }),
                Attempt::Failed(reason) => misses.push(Miss {
                    backend: backend.name(),
                    reason,
                    unavailable: false,
                    hint: backend.install_hint(),
                }),
            }
        }
        ChainOutcome::Exhausted { misses }
    }
}
