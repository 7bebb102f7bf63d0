// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Arguments of the emission functions.
//!
//! Every argument is either a scalar or a sequence. The message is built by giving each operand
//! one placeholder and joining the rendered operands with a single space:
//!
//! ```
//! use logforth_channels::Placeholders;
//! use logforth_channels::args;
//!
//! let message = Placeholders::Strict.format(&args!["answer", vec![4, 2]]);
//! assert_eq!(message, "answer 4 2");
//! ```
//!
//! [`Placeholders::Legacy`] keeps the older behavior where only sequence elements produce
//! placeholders, so scalars end up in a trailing `%!(EXTRA ...)` block.

use std::fmt;
use std::fmt::Write;

/// Build a `Vec<Arg>` from a list of expressions convertible into [`Arg`].
///
/// # Examples
///
/// ```
/// use logforth_channels::Arg;
/// use logforth_channels::args;
///
/// let args = args!["listening on", 8080, vec!["a", "b"]];
/// assert_eq!(args.len(), 3);
/// assert!(matches!(args[2], Arg::Seq(_)));
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Arg::from($arg)),+]
    };
}

/// A single rendered operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    text: String,
    type_name: &'static str,
}

impl Value {
    /// Render any displayable value.
    pub fn display(value: impl fmt::Display) -> Self {
        Self::new(value.to_string(), "value")
    }

    fn new(text: String, type_name: &'static str) -> Self {
        Self { text, type_name }
    }

    /// The rendered text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// A short name of the original type, used in `%!(EXTRA ...)` blocks.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// An argument of an emission function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// A single operand.
    Scalar(Value),
    /// A sequence whose elements are separate operands.
    Seq(Vec<Value>),
}

impl Arg {
    /// Build a sequence argument from any iterator.
    pub fn seq<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Arg::Seq(items.into_iter().map(Into::into).collect())
    }

    fn operands(&self) -> &[Value] {
        match self {
            Arg::Scalar(value) => std::slice::from_ref(value),
            Arg::Seq(values) => values,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Scalar(value) => write!(f, "{value}"),
            Arg::Seq(values) => {
                f.write_char('[')?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_char(' ')?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_char(']')
            }
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Scalar(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Arg {
    fn from(values: Vec<T>) -> Self {
        Arg::seq(values)
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Arg {
    fn from(values: [T; N]) -> Self {
        Arg::seq(values)
    }
}

impl<T: Clone + Into<Value>> From<&[T]> for Arg {
    fn from(values: &[T]) -> Self {
        Arg::seq(values.iter().cloned())
    }
}

macro_rules! impl_scalar {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::new(value.to_string(), stringify!($ty))
                }
            }

            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::Scalar(value.into())
                }
            }
        )+
    };
}

impl_scalar!(
    &str, String, &String, char, bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128,
    usize, f32, f64,
);

/// How placeholders are derived from the arguments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Placeholders {
    /// One placeholder per operand: a scalar is one operand and a sequence contributes one per
    /// element. The message never has surplus operands.
    #[default]
    Strict,
    /// Only sequence elements produce placeholders. Operands beyond the placeholder count are
    /// rendered as `%!(EXTRA type=value, ...)` after the formatted part.
    Legacy,
}

impl Placeholders {
    /// Format `args` into a message body.
    pub fn format(&self, args: &[Arg]) -> String {
        let operands = args.iter().flat_map(Arg::operands).collect::<Vec<_>>();
        let placeholders = match self {
            Placeholders::Strict => operands.len(),
            Placeholders::Legacy => args
                .iter()
                .map(|arg| match arg {
                    Arg::Scalar(_) => 0,
                    Arg::Seq(values) => values.len(),
                })
                .sum(),
        };

        let (formatted, extra) = operands.split_at(placeholders.min(operands.len()));
        let mut message = formatted
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        if !extra.is_empty() {
            let extra = extra
                .iter()
                .map(|v| format!("{}={}", v.type_name(), v.as_str()))
                .collect::<Vec<_>>()
                .join(", ");
            // SAFETY: write to a string always succeeds
            write!(&mut message, "%!(EXTRA {extra})").unwrap();
        }

        message
    }
}

/// Join every argument with a single space and terminate with a newline.
///
/// Sequences are rendered whole, as `[a b c]`.
pub fn format_line(args: &[Arg]) -> String {
    let mut line = args
        .iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_flattens_sequences() {
        let args = args![vec![1, 2, 3]];
        assert_eq!(Placeholders::Strict.format(&args), "1 2 3");

        let args = args!["a", vec![1, 2], true];
        assert_eq!(Placeholders::Strict.format(&args), "a 1 2 true");

        assert_eq!(Placeholders::Strict.format(&args![]), "");
    }

    #[test]
    fn test_legacy_counts_only_sequence_elements() {
        let args = args![vec![1, 2, 3]];
        assert_eq!(Placeholders::Legacy.format(&args), "1 2 3");

        let args = args![String::from("aaa")];
        assert_eq!(Placeholders::Legacy.format(&args), "%!(EXTRA String=aaa)");

        // two placeholders from the sequence, three operands in total
        let args = args!["a", vec![1i32, 2]];
        assert_eq!(Placeholders::Legacy.format(&args), "a 1%!(EXTRA i32=2)");
    }

    #[test]
    fn test_format_line() {
        assert_eq!(format_line(&args!["a", "b"]), "a b\n");
        assert_eq!(format_line(&args![1, vec!["x", "y"]]), "1 [x y]\n");
        assert_eq!(format_line(&args![]), "\n");
    }

    #[test]
    fn test_seq_constructors() {
        let slice: &[u8] = &[7, 8];
        assert_eq!(
            Arg::from(slice),
            Arg::Seq(vec![Value::from(7u8), Value::from(8u8)])
        );
        assert_eq!(Arg::from(["x"]), Arg::seq(vec!["x"]));
        assert_eq!(Value::display(1.5).as_str(), "1.5");
    }
}
