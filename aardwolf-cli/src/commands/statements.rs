use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;

use aardwolf::analysis::StatementFlags;
use aardwolf::artifact::reader::{self, AccessRecord, StatementRecord};

pub fn run(path: &Path) -> anyhow::Result<()> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let data = reader::read_static(&mut BufReader::new(file))
        .with_context(|| format!("cannot parse {}", path.display()))?;

    for function in &data.functions {
        println!("{}:", function.name);
        for stmt in &function.statements {
            print_statement(stmt);
        }
        println!();
    }

    println!("files:");
    for (id, path) in &data.files {
        println!("  @{id} = {path}");
    }

    Ok(())
}

fn print_statement(stmt: &StatementRecord) {
    let mut line = format!("  #{}:{}", stmt.id.file, stmt.id.stmt);

    if !stmt.successors.is_empty() {
        let succ: Vec<String> = stmt
            .successors
            .iter()
            .map(|id| format!("#{}:{}", id.file, id.stmt))
            .collect();
        line.push_str(&format!(" -> {}", succ.join(", ")));
    }

    line.push_str("  ::  ");

    if let Some(def) = &stmt.def {
        line.push_str(&format_access(def));
    }
    line.push_str(" ; ");
    let uses: Vec<String> = stmt.uses.iter().map(format_access).collect();
    line.push_str(&uses.join(", "));

    line.push_str(&format!(
        "  [@{} {}:{}-{}:{}]",
        stmt.loc.file, stmt.loc.begin_line, stmt.loc.begin_col, stmt.loc.end_line, stmt.loc.end_col
    ));

    for (flag, tag) in [
        (StatementFlags::ARG, "arg"),
        (StatementFlags::RET, "ret"),
        (StatementFlags::CALL, "call"),
    ] {
        if stmt.metadata.contains(flag) {
            line.push_str(&format!(" [{tag}]"));
        }
    }

    println!("{line}");
}

fn format_access(access: &AccessRecord) -> String {
    match access {
        AccessRecord::Scalar(id) => format!("%{id}"),
        AccessRecord::Structural(base, field) => {
            format!("{}.{}", format_access(base), format_access(field))
        }
        AccessRecord::ArrayLike(base, indices) => {
            let indices: Vec<String> = indices.iter().map(format_access).collect();
            format!("{}[{}]", format_access(base), indices.join(", "))
        }
    }
}
