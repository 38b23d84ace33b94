//! Functions that touch the outside world.

use std::fs::File;
use std::thread;
use std::time::Duration;

use quill_eval::{FunctionDef, FunctionUnit, HostError, Param, Value};
use tracing::debug;

pub struct IoUnit;

impl FunctionUnit for IoUnit {
    fn name(&self) -> &str {
        "io"
    }

    fn functions(&self) -> Vec<FunctionDef> {
        vec![
            // File contents as text, bounded by the context I/O quota.
            FunctionDef::new("read", |args| {
                let path = args.text(0)?;
                let file = File::open(path).map_err(|err| HostError::failed(format!("{}: {}", path, err)))?;
                let bytes = args.context()?.read_limited(file)?;
                debug!(target: quill_eval::LOG_TARGET, path, bytes = bytes.len(), "read file");
                String::from_utf8(bytes)
                    .map(Value::text)
                    .map_err(|_| HostError::failed(format!("{} is not valid UTF-8", path)))
            })
            .param(Param::text("path"))
            .param(Param::context("context")),
            // Blocks the calling thread; the evaluator notices an exceeded
            // timeout only once this returns.
            FunctionDef::new("sleep", |args| {
                let ms = args.long(0)?;
                if ms < 0 {
                    return Err(HostError::failed("cannot sleep for a negative time"));
                }
                thread::sleep(Duration::from_millis(ms as u64));
                Ok(Value::text(""))
            })
            .param(Param::long("ms")),
        ]
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use quill_eval::{Context, EvalError, Resolver, Value};

    use crate::register_standard;

    fn context(io_quota: usize) -> Context {
        let mut builder = Context::builder().io_quota(io_quota);
        register_standard(&mut builder).unwrap();
        builder.build()
    }

    #[test]
    fn read_within_quota() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "hello").unwrap();
        let resolver = Resolver::from_map([("file", file.path().display().to_string())]);

        let value = context(16)
            .compile("$(read(file))")
            .unwrap()
            .evaluate(&resolver)
            .unwrap();
        assert_eq!(value, Value::text("hello"));

        let err = context(4)
            .compile("$(read(file))")
            .unwrap()
            .evaluate(&resolver)
            .unwrap_err();
        assert_eq!(err, EvalError::SizeLimitExceeded { limit: 4 });
    }

    #[test]
    fn missing_file_is_a_host_failure() {
        let value = context(16)
            .compile("$(read('/definitely/not/here'))")
            .unwrap()
            .evaluate(&Resolver::new());
        assert!(matches!(value, Err(EvalError::HostFunction { .. })));
    }
}
