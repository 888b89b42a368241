//! Ordered fallback strategies
//!
//! Context resolution is a chain of "try this, else that" decisions. Each
//! step is a [`Strategy`] that either produces a value, declines with `None`,
//! or fails hard. [`first_success`] walks a list in order and stops at the
//! first value or the first hard failure.

/// One step in a fallback chain
pub trait Strategy<Input: ?Sized> {
    type Output;
    type Error;

    fn attempt(&self, input: &Input) -> Result<Option<Self::Output>, Self::Error>;
}

/// Runs strategies in order and returns the first produced value together
/// with the strategy that produced it.
pub fn first_success<'s, Input, S>(
    strategies: &'s [S],
    input: &Input,
) -> Result<Option<(&'s S, S::Output)>, S::Error>
where
    Input: ?Sized,
    S: Strategy<Input>,
{
    for strategy in strategies {
        if let Some(value) = strategy.attempt(input)? {
            return Ok(Some((strategy, value)));
        }
    }
    Ok(None)
}
