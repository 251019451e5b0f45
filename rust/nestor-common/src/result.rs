pub type Result<T> = std::result::Result<T, crate::error::Error>;

#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

#[macro_export]
macro_rules! verify_data {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_data(result, stringify!($name), stringify!($expr))?;
    }};
}

#[inline]
pub fn verify_arg(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_arg(name, condition)
    }
}

#[inline]
pub fn verify_data(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_format(name, condition)
    }
}

#[cold]
pub fn invalid_arg(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidArgument {
        name: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}

#[cold]
pub fn invalid_format(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidFormat {
        element: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use crate::{Result, error::ErrorKind};

    fn check_range(start: u64, end: u64) -> Result<u64> {
        verify_arg!(range, start <= end);
        Ok(end - start)
    }

    fn check_level(level: u16, max_level: u16) -> Result<()> {
        verify_data!(level, level <= max_level);
        Ok(())
    }

    #[test]
    fn test_verify_macros() {
        assert_eq!(check_range(2, 5).unwrap(), 3);
        let err = check_range(5, 2).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::InvalidArgument { name, .. } if name == "range"
        ));

        check_level(1, 2).unwrap();
        let err = check_level(3, 2).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
    }
}
