#![forbid(unsafe_code)]

mod args;
mod error;
mod format_backend;
mod functions;
mod message_format;
mod model;
mod parser;
mod parts;

pub use args::{Args, Options, Value};
pub use error::{FormatError, FormatResult, SyntaxError};
pub use format_backend::{
    BasicFormatBackend, DateTimeOptions, DateTimeStyle, FormatBackend, NumberOptions,
    PluralCategory, number_sub_parts,
};
pub use functions::{
    FunctionContext, FunctionRegistry, MessageFunction, ResolvedValue, Selector,
    define_string_function, message_function,
};
pub use message_format::{FormatOptions, MessageFormat};
pub use model::{
    Body, Declaration, Expression, FunctionOption, FunctionRef, Markup, Matcher, Message,
    Operand, Pattern, PatternItem, Variant, VariantKey,
};
pub use parser::{Span, parse_message};
pub use parts::{ExpressionPart, FSI, MarkupKind, MessagePart, PDI, SubPart};
