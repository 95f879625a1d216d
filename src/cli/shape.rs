//! `Shape3`: a `clap`-friendly `FromStr` newtype for the "(A0,A1,A2)"
//! tuple syntax the CLI surface uses for array and block shapes.

use std::fmt;
use std::str::FromStr;

use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape3(pub Point);

impl FromStr for Shape3 {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('(').trim_end_matches(')');
        let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(format!("expected a 3-tuple shape like \"(4,4,4)\", got {s:?}"));
        }
        let mut values = [0usize; 3];
        for (i, part) in parts.iter().enumerate() {
            values[i] = part
                .parse()
                .map_err(|_| format!("invalid shape component {part:?} in {s:?}"))?;
        }
        Ok(Shape3((values[0], values[1], values[2])))
    }
}

impl fmt::Display for Shape3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.0.0, self.0.1, self.0.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_parenthesized_tuple() {
        assert_eq!("(4,4,4)".parse::<Shape3>().unwrap(), Shape3((4, 4, 4)));
        assert_eq!("1,2,3".parse::<Shape3>().unwrap(), Shape3((1, 2, 3)));
        assert_eq!(" ( 12, 0, 7 ) ".parse::<Shape3>().unwrap(), Shape3((12, 0, 7)));
    }

    #[test]
    fn rejects_wrong_arity() {
        assert!("(4,4)".parse::<Shape3>().is_err());
        assert!("not-a-shape".parse::<Shape3>().is_err());
    }
}
