use std::any::Any;

/// The failure half of a settled promise.
///
/// A promise rejects either because somebody called reject, or because the
/// executor thread panicked and the panic was intercepted at the thread
/// boundary. Plain string reasons are coerced into [`Error::Rejected`] so a
/// rejection always carries a structured value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// An explicit rejection with the given reason.
    #[error("{0}")]
    Rejected(String),
    /// The executor (or a chained handler) panicked instead of settling.
    #[error("executor panicked: {0}")]
    Panicked(String),
}

impl Error {
    /// True for rejections that came out of an intercepted panic.
    pub fn is_panic(&self) -> bool {
        matches!(self, Error::Panicked(_))
    }

    /// Builds an [`Error::Panicked`] out of the payload handed back by
    /// `catch_unwind`. Panics raised via `panic!("...")` carry a `&str` or
    /// `String`; anything else gets an opaque marker.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_owned()
        };
        Error::Panicked(message)
    }
}

impl From<&str> for Error {
    fn from(reason: &str) -> Self {
        Error::Rejected(reason.to_owned())
    }
}

impl From<String> for Error {
    fn from(reason: String) -> Self {
        Error::Rejected(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn coerces_plain_reasons() {
        assert_eq!(Error::from("nope"), Error::Rejected("nope".into()));
        assert_eq!(
            Error::from(String::from("nope")),
            Error::Rejected("nope".into())
        );
    }

    #[test]
    fn panic_payload_messages() {
        let err = Error::from_panic(Box::new("boom"));
        assert_eq!(err, Error::Panicked("boom".into()));
        assert!(err.is_panic());

        let err = Error::from_panic(Box::new(String::from("boom")));
        assert_eq!(err, Error::Panicked("boom".into()));

        let err = Error::from_panic(Box::new(42_u8));
        assert!(matches!(err, Error::Panicked(_)));
    }

    #[test]
    fn displays_reason_only() {
        assert_eq!(Error::Rejected("late".into()).to_string(), "late");
        assert_eq!(
            Error::Panicked("boom".into()).to_string(),
            "executor panicked: boom"
        );
    }
}
