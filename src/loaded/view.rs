use crate::error::FetchError;

/// The content a UI surface should display for a loaded value.
///
/// # Type Parameters
///
/// * `T` - The loaded value type
///
/// # Examples
///
/// ```rust
/// use load_lifecycle::prelude::*;
///
/// fn describe(view: &LoadView<u32>) -> String {
///     match view {
///         LoadView::Empty => String::new(),
///         LoadView::Loading => "Loading...".to_owned(),
///         LoadView::Loaded(count) => format!("{count} items"),
///         LoadView::Error(e) => format!("could not load: {e}"),
///     }
/// }
/// assert_eq!(describe(&LoadView::Loaded(3)), "3 items");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadView<T> {
    /// Nothing requested yet
    #[default]
    Empty,
    /// The loading placeholder
    Loading,
    /// The loaded view of a value
    Loaded(T),
    /// The error view
    Error(FetchError),
}

impl<T> LoadView<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The displayed value, if the loaded view is shown.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            Self::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Maps the displayed value using the provided function, like `Option::map`.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> LoadView<U> {
        match self {
            Self::Empty => LoadView::Empty,
            Self::Loading => LoadView::Loading,
            Self::Loaded(value) => LoadView::Loaded(f(value)),
            Self::Error(error) => LoadView::Error(error),
        }
    }

    pub fn as_ref(&self) -> LoadView<&T> {
        match self {
            Self::Empty => LoadView::Empty,
            Self::Loading => LoadView::Loading,
            Self::Loaded(value) => LoadView::Loaded(value),
            Self::Error(error) => LoadView::Error(error.clone()),
        }
    }
}

/// Text rendering with the usual defaults: `Loading...` for the placeholder and
/// `Error: <message>` for failures.
impl<T: core::fmt::Display> core::fmt::Display for LoadView<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Loading => f.write_str("Loading..."),
            Self::Loaded(value) => value.fmt(f),
            Self::Error(error) => write!(f, "Error: {error}"),
        }
    }
}
