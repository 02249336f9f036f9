use std::{error, fmt, result};

pub type BoxedError = Box<dyn error::Error + Send + Sync + 'static>;
pub type BoxedErrorResult<T> = result::Result<T, BoxedError>;

pub type WhateverResult<T> = result::Result<T, snafu::Whatever>;

/// Renders an error together with its whole `source()` chain on one line
///
/// `outer: middle: root`, which is what we want in log fields.
pub struct FmtCompactError<'e, E: ?Sized>(pub &'e E);

impl<E> fmt::Display for FmtCompactError<'_, E>
where
    E: error::Error + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{}", self.0))?;

        let mut source = self.0.source();
        while let Some(err) = source {
            f.write_str(": ")?;
            f.write_fmt(format_args!("{err}"))?;
            source = err.source();
        }

        Ok(())
    }
}

pub struct FmtCompactResult<'r, O, E>(pub &'r result::Result<O, E>);

impl<O, E> fmt::Display for FmtCompactResult<'_, O, E>
where
    E: error::Error,
    O: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Ok(o) => o.fmt(f),
            Err(e) => FmtCompactError(e).fmt(f),
        }
    }
}

pub trait FmtCompact {
    type Report: fmt::Display;
    fn fmt_compact(self) -> Self::Report;
}

impl<'e, E> FmtCompact for &'e E
where
    E: error::Error + ?Sized,
{
    type Report = FmtCompactError<'e, E>;

    fn fmt_compact(self) -> Self::Report {
        FmtCompactError(self)
    }
}

#[cfg(test)]
mod tests {
    use snafu::{ResultExt as _, Snafu};

    use super::FmtCompact as _;

    #[derive(Debug, Snafu)]
    #[snafu(display("root cause"))]
    struct Root;

    #[derive(Debug, Snafu)]
    #[snafu(display("store query failed"))]
    struct Outer {
        source: Root,
    }

    #[test]
    fn fmt_compact_walks_source_chain() {
        let err = Err::<(), _>(Root).context(OuterSnafu).unwrap_err();

        assert_eq!(err.fmt_compact().to_string(), "store query failed: root cause");
    }

    #[test]
    fn fmt_compact_on_boxed() {
        let err: super::BoxedError = Box::new(Root);

        assert_eq!(err.as_ref().fmt_compact().to_string(), "root cause");
    }
}
