use std::{error::Error, fmt, ops::Range};

/// A source code span, used for error reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "deserialize", derive(serde::Deserialize))]
pub struct Span {
    start: u32,
    end: u32,
}

impl Span {
    pub const UNDEFINED: Self = Self { start: 0, end: 0 };

    /// Creates a new `Span` from a range of byte indices
    ///
    /// Note: end is exclusive, it doesn't belong to the `Span`
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Converts `self` to a range if the span is not unknown
    pub fn to_range(self) -> Option<Range<usize>> {
        if self.is_defined() {
            Some(self.start as usize..self.end as usize)
        } else {
            None
        }
    }

    /// Check whether `self` was defined or is a default/unknown span
    pub fn is_defined(&self) -> bool {
        *self != Self::default()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Wrapper class for [`Error`], augmenting it with the source location of the
/// expression that caused it.
#[derive(Debug, Clone, PartialEq)]
pub struct WithSpan<E> {
    inner: E,
    span: Span,
}

impl<E> fmt::Display for WithSpan<E>
where
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl<E> Error for WithSpan<E>
where
    E: Error,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source()
    }
}

impl<E> WithSpan<E> {
    /// Create a new [`WithSpan`] from an [`Error`], without a location.
    pub const fn new(inner: E) -> Self {
        Self {
            inner,
            span: Span::UNDEFINED,
        }
    }

    /// Reverse of [`Self::new`], discards span information and returns an inner error.
    pub fn into_inner(self) -> E {
        self.inner
    }

    pub const fn as_inner(&self) -> &E {
        &self.inner
    }

    /// The location of the offending expression, if known.
    pub fn location(&self) -> Option<Range<usize>> {
        self.span.to_range()
    }

    /// Attach a location to the error. The first defined span wins, so an
    /// inner, more precise location is never overwritten by an outer one.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        if !self.span.is_defined() {
            self.span = span;
        }
        self
    }
}

/// Convenience trait for [`Error`] to be able to apply spans to anything.
pub(crate) trait AddSpan: Sized {
    type Output;
    /// See [`WithSpan::new`] and [`WithSpan::with_span`].
    fn with_span(self, span: Span) -> Self::Output;
}

impl<E> AddSpan for E
where
    E: Error,
{
    type Output = WithSpan<Self>;

    fn with_span(self, span: Span) -> WithSpan<Self> {
        WithSpan::new(self).with_span(span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_spans_have_no_range() {
        assert_eq!(Span::default().to_range(), None);
        assert_eq!(Span::UNDEFINED, Span::default());
        assert_eq!(Span::new(3, 5).to_range(), Some(3..5));
        assert_eq!(Span::new(3, 5).to_string(), "3..5");
    }

    #[test]
    fn first_span_wins() {
        #[derive(Debug, thiserror::Error)]
        #[error("boom")]
        struct Boom;

        let err = Boom.with_span(Span::new(2, 4)).with_span(Span::new(0, 10));
        assert_eq!(err.location(), Some(2..4));
        assert_eq!(err.to_string(), "boom");
    }
}
