//! Text functions.
//! 标准库的文本函数。

use quill_eval::{FunctionDef, FunctionUnit, HostError, Param, Value};

/// Widest result `pad` will build, in characters.
const MAX_PAD_WIDTH: i32 = 65_536;

pub struct TextUnit;

impl FunctionUnit for TextUnit {
    fn name(&self) -> &str {
        "text"
    }

    fn functions(&self) -> Vec<FunctionDef> {
        vec![
            FunctionDef::new("upper", |args| Ok(Value::text(args.text(0)?.to_uppercase())))
                .param(Param::text("s")),
            FunctionDef::new("lower", |args| Ok(Value::text(args.text(0)?.to_lowercase())))
                .param(Param::text("s")),
            FunctionDef::new("trim", |args| Ok(Value::text(args.text(0)?.trim())))
                .param(Param::text("s")),
            FunctionDef::new("len", |args| Ok(Value::from(args.text(0)?.chars().count() as i64)))
                .param(Param::text("s")),
            FunctionDef::new("concat", |args| {
                let mut out = String::new();
                for arg in args.rest(0)? {
                    if let Some(value) = arg.to_value() {
                        out.push_str(&value.to_text());
                    }
                }
                Ok(Value::text(out))
            })
            .param(Param::any("values").variadic()),
            FunctionDef::new("substr", |args| {
                let text = args.text(0)?;
                let start = args.int(1)?.max(0) as usize;
                let length = args.int(2)?;
                let chars = text.chars().skip(start);
                let out: String = if length < 0 {
                    chars.collect()
                } else {
                    chars.take(length as usize).collect()
                };
                Ok(Value::text(out))
            })
            .param(Param::text("s"))
            .param(Param::int("start"))
            .param(Param::int("length").default("-1")),
            FunctionDef::new("pad", |args| {
                let text = args.text(0)?;
                let width = args.int(1)?;
                let fill = args.text(2)?;
                if fill.is_empty() {
                    return Err(HostError::failed("fill text must not be empty"));
                }
                if width > MAX_PAD_WIDTH {
                    return Err(HostError::failed(format!("width is larger than {}", MAX_PAD_WIDTH)));
                }
                let missing = (width.max(0) as usize).saturating_sub(text.chars().count());
                let mut out = text.to_string();
                out.extend(fill.chars().cycle().take(missing));
                Ok(Value::text(out))
            })
            .param(Param::text("s"))
            .param(Param::int("width"))
            .param(Param::text("fill").default(" ")),
        ]
    }
}
