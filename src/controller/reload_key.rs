use std::any::Any;

trait ReloadSentinel: Send {
    fn as_any(&self) -> &dyn Any;
    fn same_as(&self, other: &dyn Any) -> bool;
}

impl<K: PartialEq + Send + 'static> ReloadSentinel for K {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn same_as(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<K>().is_some_and(|other| other == self)
    }
}

/// Opaque sentinel whose change forces a reload.
///
/// Two keys are the same when they hold the same type and compare equal. Keys of
/// different types are always different.
pub struct ReloadKey(Box<dyn ReloadSentinel>);

impl ReloadKey {
    pub fn new<K: PartialEq + Send + 'static>(key: K) -> Self {
        Self(Box::new(key))
    }

    pub fn same_as(&self, other: &ReloadKey) -> bool {
        self.0.same_as(other.0.as_any())
    }
}

impl core::fmt::Debug for ReloadKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadKey").finish_non_exhaustive()
    }
}
