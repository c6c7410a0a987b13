/*!
Custom Snafu error printer
*/

use std::{error::Error as StdError, fmt, iter};

/// Error returned from `main`, printed together with its chain of causes.
pub struct Report(Box<dyn StdError>);

impl fmt::Debug for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;

        let mut causes = iter::successors(self.0.source(), |&e| e.source()).peekable();
        if causes.peek().is_some() {
            write!(f, "\n\nCaused by:")?;
            for (i, e) in causes.enumerate() {
                write!(f, "\n  {}: {}", i, e)?;
            }
        }

        Ok(())
    }
}

impl<E: Into<Box<dyn StdError>>> From<E> for Report {
    fn from(e: E) -> Self {
        Report(e.into())
    }
}
