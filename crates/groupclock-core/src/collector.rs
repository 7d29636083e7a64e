//! Batch error collection
//!
//! Batch operations (building an engine from member records, validating a
//! group config) attempt every item and report all failures at once. The
//! first failure is the primary one; the rest ride along as suppressed
//! detail.

use std::fmt;

/// Accumulates failures during a batch operation.
#[derive(Debug, Clone)]
pub struct ErrorCollector<E> {
    errors: Vec<E>,
}

impl<E> Default for ErrorCollector<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ErrorCollector<E> {
    /// Create an empty collector
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record a failure.
    pub fn push(&mut self, error: E) {
        self.errors.push(error);
    }

    /// Record the error of a failed result, yielding the success value if any.
    pub fn collect<T>(&mut self, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.push(error);
                None
            }
        }
    }

    /// Number of failures seen so far
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// True when nothing has failed
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Close the batch.
    pub fn finish(self) -> Result<(), CollectedErrors<E>> {
        let mut errors = self.errors.into_iter();
        match errors.next() {
            None => Ok(()),
            Some(primary) => Err(CollectedErrors {
                primary: Box::new(primary),
                suppressed: errors.collect(),
            }),
        }
    }

    /// Close the batch, handing back `value` if nothing failed.
    pub fn finish_with<T>(self, value: T) -> Result<T, CollectedErrors<E>> {
        self.finish().map(|()| value)
    }
}

/// One or more failures raised together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedErrors<E> {
    primary: Box<E>,
    suppressed: Vec<E>,
}

impl<E> CollectedErrors<E> {
    /// Wrap a single failure
    pub fn single(error: E) -> Self {
        Self {
            primary: Box::new(error),
            suppressed: Vec::new(),
        }
    }

    /// The first failure of the batch.
    pub fn primary(&self) -> &E {
        &self.primary
    }

    /// Failures after the first, in the order they happened.
    pub fn suppressed(&self) -> &[E] {
        &self.suppressed
    }

    /// Total number of failures
    pub fn len(&self) -> usize {
        1 + self.suppressed.len()
    }

    /// Always false; a batch error holds at least one failure.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate every failure, primary first
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        std::iter::once(self.primary.as_ref()).chain(self.suppressed.iter())
    }
}

impl<E: fmt::Display> fmt::Display for CollectedErrors<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary)?;
        if !self.suppressed.is_empty() {
            write!(f, " (+{} suppressed)", self.suppressed.len())?;
        }
        Ok(())
    }
}

impl<E: std::error::Error + 'static> std::error::Error for CollectedErrors<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.primary.as_ref())
    }
}
