use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;

use aardwolf::artifact::reader::{self, TraceEvent, TraceValue};

pub fn run(path: &Path, strict: bool) -> anyhow::Result<()> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let events = reader::read_trace(&mut BufReader::new(file), !strict)
        .with_context(|| format!("cannot parse {}", path.display()))?;

    for event in &events {
        match event {
            TraceEvent::Statement(id) => println!("statement: #{}:{}", id.file, id.stmt),
            TraceEvent::External(name) => println!("external: \"{name}\""),
            TraceEvent::Data(value) => println!("data: {}", format_value(value)),
        }
    }

    log::debug!("{} events", events.len());
    Ok(())
}

fn format_value(value: &TraceValue) -> String {
    match value {
        TraceValue::Unsupported => "<unsupported>".to_string(),
        TraceValue::I8(v) => format!("{v} (i8)"),
        TraceValue::I16(v) => format!("{v} (i16)"),
        TraceValue::I32(v) => format!("{v} (i32)"),
        TraceValue::I64(v) => format!("{v} (i64)"),
        TraceValue::U8(v) => format!("{v} (u8)"),
        TraceValue::U16(v) => format!("{v} (u16)"),
        TraceValue::U32(v) => format!("{v} (u32)"),
        TraceValue::U64(v) => format!("{v} (u64)"),
        TraceValue::F32(v) => format!("{v} (f32)"),
        TraceValue::F64(v) => format!("{v} (f64)"),
        TraceValue::Bool(v) => format!("{v}"),
        TraceValue::Named(name) => format!("\"{name}\""),
        TraceValue::Null => "null".to_string(),
    }
}
