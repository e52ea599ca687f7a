//! Workflow execution context with token-keyed heterogeneous storage.

use crate::error::ContextError;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

static NEXT_TOKEN_ID: AtomicU64 = AtomicU64::new(0);

/// Typed handle to one slot of a [`Context`].
///
/// Every call to [`ContextToken::new`] yields a distinct token, even with the
/// same label and type, so two tokens never alias the same slot. Create a
/// token once per logical piece of data and reuse it across workflow runs.
///
/// `new` is not `const` because ids come from a global counter. For a
/// module-level token, initialise it lazily:
///
/// ```
/// use sagaflow_core::ContextToken;
/// use std::sync::OnceLock;
///
/// fn user_id() -> ContextToken<u64> {
///     static TOKEN: OnceLock<ContextToken<u64>> = OnceLock::new();
///     *TOKEN.get_or_init(|| ContextToken::new("user_id"))
/// }
///
/// assert_eq!(user_id(), user_id());
/// ```
///
/// # Examples
///
/// ```
/// use sagaflow_core::{Context, ContextToken};
///
/// let user_id = ContextToken::<u64>::new("user_id");
/// let other = ContextToken::<u64>::new("user_id");
///
/// let mut ctx = Context::new();
/// ctx.set(&user_id, 42);
///
/// assert_eq!(ctx.get(&user_id), Some(&42));
/// assert_eq!(ctx.get(&other), None);
/// ```
pub struct ContextToken<T> {
    id: u64,
    label: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ContextToken<T> {
    /// Creates a new, globally unique token.
    ///
    /// The label is only used for diagnostics.
    pub fn new(label: &'static str) -> Self {
        Self {
            id: NEXT_TOKEN_ID.fetch_add(1, Ordering::Relaxed),
            label,
            _marker: PhantomData,
        }
    }

    /// Returns the diagnostic label.
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl<T> Clone for ContextToken<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ContextToken<T> {}

impl<T> PartialEq for ContextToken<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for ContextToken<T> {}

impl<T> fmt::Debug for ContextToken<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextToken")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> fmt::Display for ContextToken<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.label, self.id)
    }
}

/// Data shared by all steps of one workflow run.
///
/// Values are stored type-erased and recovered through the token that wrote
/// them. There is no isolation between steps: any step may read or overwrite
/// any slot it holds a token for.
pub struct Context {
    data: HashMap<u64, Box<dyn Any + Send + Sync>>,
    started_at: Instant,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("slots", &self.data.len())
            .field("started_at", &self.started_at)
            .finish()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Creates a new empty context.
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            started_at: Instant::now(),
        }
    }

    /// Stores `value` in the token's slot, replacing any previous value.
    pub fn set<T: Any + Send + Sync>(&mut self, token: &ContextToken<T>, value: T) {
        self.data.insert(token.id, Box::new(value));
    }

    /// Returns the value in the token's slot, or `None` if it was never set.
    pub fn get<T: Any>(&self, token: &ContextToken<T>) -> Option<&T> {
        self.data.get(&token.id).and_then(|v| v.downcast_ref::<T>())
    }

    /// Returns a mutable reference to the value in the token's slot.
    pub fn get_mut<T: Any>(&mut self, token: &ContextToken<T>) -> Option<&mut T> {
        self.data.get_mut(&token.id).and_then(|v| v.downcast_mut::<T>())
    }

    /// Returns the value in the token's slot.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::NotDefined`] if the slot was never set in this
    /// context. `?` works on it in [`Rollback::rollback`]. [`Step::run`]
    /// returns an [`Outcome`], so run the fallible part in an inner
    /// `async` block and convert the `Result` with `.into()`:
    ///
    /// ```ignore
    /// async fn run(&self, ctx: &mut Context) -> Outcome<u64, MyError> {
    ///     async {
    ///         let order = ctx.get_or_err(&self.order)?;
    ///         Ok::<_, MyError>(order.total)
    ///     }
    ///     .await
    ///     .into()
    /// }
    /// ```
    ///
    /// [`Rollback::rollback`]: crate::Rollback::rollback
    /// [`Step::run`]: crate::Step::run
    /// [`Outcome`]: crate::Outcome
    pub fn get_or_err<T: Any>(&self, token: &ContextToken<T>) -> Result<&T, ContextError> {
        self.get(token).ok_or_else(|| ContextError::NotDefined {
            key: token.to_string(),
        })
    }

    /// Removes and returns the value in the token's slot.
    pub fn remove<T: Any>(&mut self, token: &ContextToken<T>) -> Option<T> {
        self.data
            .remove(&token.id)
            .and_then(|v| v.downcast::<T>().ok())
            .map(|b| *b)
    }

    /// Returns `true` if the token's slot holds a value.
    pub fn contains<T>(&self, token: &ContextToken<T>) -> bool {
        self.data.contains_key(&token.id)
    }

    /// Returns the number of occupied slots.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the time elapsed since the context was created.
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}
