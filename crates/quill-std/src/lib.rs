//! Standard function units for Quill.
//! Quill 标准函数单元。
//!
//! Each module exposes one [`FunctionUnit`]; [`register_standard`] adds all
//! of them to a context builder.

mod counter;
mod date;
mod io;
mod logic;
mod math;
mod text;

pub use counter::CounterUnit;
pub use date::DateUnit;
pub use io::IoUnit;
pub use logic::LogicUnit;
pub use math::MathUnit;
pub use text::TextUnit;

use quill_eval::{ContextBuilder, RegistrationError};

/// Names of the standard units, in registration order.
pub const STANDARD_UNITS: [&str; 6] = ["math", "text", "logic", "date", "io", "counter"];

/// Register every standard unit on `builder`.
pub fn register_standard(builder: &mut ContextBuilder) -> Result<(), RegistrationError> {
    builder.register(MathUnit)?;
    builder.register(TextUnit)?;
    builder.register(LogicUnit)?;
    builder.register(DateUnit)?;
    builder.register(IoUnit)?;
    builder.register(CounterUnit)?;
    Ok(())
}
