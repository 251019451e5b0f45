/// Macro for handling `Result<T, E>` in functions that return `Option<Result<T, E>>`.
///
/// - If `expr` evaluates to `Ok(t)`, the macro yields `t`.
/// - If `expr` evaluates to `Err(e)`, the macro causes the enclosing function to
///   return `Some(Err(e))`.
///
/// This is used inside `next()` implementations of record iterators
/// (`Iterator<Item = Result<Record>>`) that call fallible helpers.
#[macro_export]
macro_rules! try_or_ret_some_err {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(err) => {
                return Some(Err(err));
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{Result, error::Error};

    struct Countdown(u32);

    impl Countdown {
        fn step(&self) -> Result<u32> {
            if self.0 == 1 {
                Err(Error::invalid_arg("countdown", "reached one"))
            } else {
                Ok(self.0 - 1)
            }
        }
    }

    impl Iterator for Countdown {
        type Item = Result<u32>;

        fn next(&mut self) -> Option<Self::Item> {
            if self.0 == 0 {
                return None;
            }
            let next = try_or_ret_some_err!(self.step());
            self.0 = next;
            Some(Ok(next))
        }
    }

    #[test]
    fn test_try_or_ret_some_err() {
        let mut it = Countdown(3);
        assert_eq!(it.next().unwrap().unwrap(), 2);
        assert_eq!(it.next().unwrap().unwrap(), 1);
        assert!(it.next().unwrap().is_err());
    }
}
